//! Domain matching
//!
//! Resolves a navigation target to a lower-cased host and tests it against a
//! list of rule domains. A rule matches its exact host, the same host with or
//! without a leading `www.`, and any subdomain of either form.

use std::borrow::Cow;
use url::Url;

const WWW_PREFIX: &str = "www.";

/// Lower-cased host of `candidate_url`, or `None` if it cannot be parsed.
///
/// Inputs without a scheme are treated as `https://`.
pub fn resolve_host(candidate_url: &str) -> Option<String> {
    let trimmed = candidate_url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme: Cow<'_, str> = if has_scheme(trimmed) {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("https://{trimmed}"))
    };

    let parsed = Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Starts with `scheme://`, where scheme is a letter followed by letters,
/// digits, `+`, `-` or `.`. A `://` later in the path or query does not count.
fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// `host` without a leading `www.`
pub fn base_domain(host: &str) -> &str {
    host.strip_prefix(WWW_PREFIX).unwrap_or(host)
}

/// First rule in `rule_domains` matching the host of `candidate_url`.
///
/// Unparseable URLs never match.
pub fn matches_domain<'a, S: AsRef<str>>(
    candidate_url: &str,
    rule_domains: &'a [S],
) -> Option<&'a str> {
    let host = resolve_host(candidate_url)?;
    matches_host(&host, rule_domains)
}

/// First rule in `rule_domains` matching an already resolved, lower-cased host
pub fn matches_host<'a, S: AsRef<str>>(host: &str, rule_domains: &'a [S]) -> Option<&'a str> {
    rule_domains
        .iter()
        .map(AsRef::as_ref)
        .find(|rule| host_matches_rule(host, rule))
}

fn host_matches_rule(host: &str, rule: &str) -> bool {
    let rule = rule.trim().trim_end_matches('.').to_lowercase();
    if rule.is_empty() {
        return false;
    }

    if host == rule {
        return true;
    }

    let host_base = base_domain(host);
    let rule_base = base_domain(&rule);
    if host_base == rule_base {
        return true;
    }

    is_subdomain_of(host, &rule) || is_subdomain_of(host, rule_base)
}

/// `host` ends with `.` + `parent`
fn is_subdomain_of(host: &str, parent: &str) -> bool {
    let host_len = host.len();
    let parent_len = parent.len();
    if parent_len == 0 || host_len <= parent_len {
        return false;
    }
    if !host.ends_with(parent) {
        return false;
    }
    let dot_index = host_len - parent_len - 1;
    host.as_bytes().get(dot_index) == Some(&b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_host() {
        assert_eq!(
            resolve_host("https://WWW.Example.COM/path?q=1").as_deref(),
            Some("www.example.com")
        );
        assert_eq!(resolve_host("example.com/page").as_deref(), Some("example.com"));
        assert_eq!(resolve_host("http://example.com:8080").as_deref(), Some("example.com"));
        assert_eq!(resolve_host("https://example.com./").as_deref(), Some("example.com"));
    }

    #[test]
    fn test_resolve_host_nested_url_in_query() {
        assert_eq!(
            resolve_host("blocked.example/login?next=https://kids.example").as_deref(),
            Some("blocked.example")
        );
        assert_eq!(
            resolve_host("blocked.example/r#https://kids.example").as_deref(),
            Some("blocked.example")
        );
        assert_eq!(
            resolve_host("https://blocked.example/?u=http://kids.example").as_deref(),
            Some("blocked.example")
        );
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://example.com"));
        assert!(has_scheme("svn+ssh://example.com"));
        assert!(!has_scheme("example.com/a?b=https://c"));
        assert!(!has_scheme("1http://example.com"));
        assert!(!has_scheme("://example.com"));
        assert!(!has_scheme("example.com"));
    }

    #[test]
    fn test_resolve_host_malformed() {
        assert_eq!(resolve_host("not a url at all"), None);
        assert_eq!(resolve_host(""), None);
        assert_eq!(resolve_host("   "), None);
        assert_eq!(resolve_host("https://"), None);
    }

    #[test]
    fn test_exact_match() {
        let rules = vec!["example.com".to_string()];
        assert_eq!(matches_domain("https://example.com/x", &rules), Some("example.com"));
    }

    #[test]
    fn test_www_insensitive() {
        let rules = ["example.com"];
        assert_eq!(matches_domain("https://www.example.com", &rules), Some("example.com"));

        let rules = ["www.example.com"];
        assert_eq!(matches_domain("https://example.com", &rules), Some("www.example.com"));
    }

    #[test]
    fn test_subdomain_match() {
        let rules = ["wikipedia.org"];
        assert_eq!(matches_domain("https://fr.wikipedia.org/wiki/Rust", &rules), Some("wikipedia.org"));
        assert_eq!(matches_domain("https://a.b.wikipedia.org", &rules), Some("wikipedia.org"));

        let rules = ["www.wikipedia.org"];
        assert_eq!(matches_domain("https://fr.wikipedia.org", &rules), Some("www.wikipedia.org"));
    }

    #[test]
    fn test_no_partial_label_match() {
        let rules = ["ample.com"];
        assert_eq!(matches_domain("https://example.com", &rules), None);

        let rules = ["example.com"];
        assert_eq!(matches_domain("https://example.com.evil.net", &rules), None);
    }

    #[test]
    fn test_rule_case_and_blank_rules() {
        let rules = ["", "  ", "YouTube.com "];
        assert_eq!(matches_domain("https://m.youtube.com", &rules), Some("YouTube.com "));
    }

    #[test]
    fn test_first_match_wins() {
        let rules = ["example.com", "sub.example.com"];
        assert_eq!(matches_domain("https://sub.example.com", &rules), Some("example.com"));
    }

    #[test]
    fn test_schemeless_url_with_nested_url_matches() {
        let rules = ["blocked.example"];
        assert_eq!(
            matches_domain("blocked.example/login?next=https://kids.example", &rules),
            Some("blocked.example")
        );
    }

    #[test]
    fn test_malformed_url_never_matches() {
        let rules = ["not"];
        assert_eq!(matches_domain("not a url at all", &rules), None);
    }
}
