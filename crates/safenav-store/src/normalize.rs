//! Canonical forms for user-entered rules

use safenav_core::{Error, Result};
use safenav_policy::resolve_host;

/// Lower-cased bare host for a domain rule.
///
/// Accepts anything a parent might paste: a bare domain, a full URL, or a
/// host with a port. A leading `www.` is kept as typed.
pub fn normalize_domain(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input("domain is empty"));
    }
    resolve_host(trimmed).ok_or_else(|| Error::invalid_input(format!("not a domain: {trimmed:?}")))
}

/// Lower-cased, trimmed keyword
pub fn normalize_keyword(input: &str) -> Result<String> {
    let keyword = input.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(Error::invalid_input("keyword is empty"));
    }
    Ok(keyword)
}
