//! Keyword matching against full URLs
//!
//! Each keyword must start at a word boundary, so `sex` matches `/sex-ed`
//! but not `/essex-county`. Patterns that the regex engine rejects fall back
//! to a plain case-insensitive substring test instead of failing.

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Compiled-size ceiling for a single keyword pattern
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Precompiled keyword list, built once per policy snapshot
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    patterns: Vec<KeywordPattern>,
}

#[derive(Debug, Clone)]
struct KeywordPattern {
    keyword: String,
    strategy: MatchStrategy,
}

#[derive(Debug, Clone)]
enum MatchStrategy {
    /// `\b` + escaped keyword, case-insensitive
    WordBoundary(Regex),
    /// Lower-cased keyword
    Substring(String),
}

impl MatchStrategy {
    fn compile(keyword: &str, size_limit: usize) -> Self {
        let pattern = format!(r"\b{}", regex::escape(keyword));
        match RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(size_limit)
            .build()
        {
            Ok(regex) => MatchStrategy::WordBoundary(regex),
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "Keyword pattern rejected, using substring match");
                MatchStrategy::Substring(keyword.to_lowercase())
            }
        }
    }

    fn is_match(&self, lowered_url: &str) -> bool {
        match self {
            MatchStrategy::WordBoundary(regex) => regex.is_match(lowered_url),
            MatchStrategy::Substring(needle) => lowered_url.contains(needle.as_str()),
        }
    }
}

impl KeywordMatcher {
    /// Compile `keywords`, keeping list order
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self::with_size_limit(keywords, DEFAULT_REGEX_SIZE_LIMIT)
    }

    /// Compile with an explicit regex size limit
    pub fn with_size_limit<S: AsRef<str>>(keywords: &[S], size_limit: usize) -> Self {
        let patterns = keywords
            .iter()
            .map(|keyword| keyword.as_ref().trim())
            .filter(|keyword| !keyword.is_empty())
            .map(|keyword| KeywordPattern {
                keyword: keyword.to_string(),
                strategy: MatchStrategy::compile(keyword, size_limit),
            })
            .collect();

        Self { patterns }
    }

    /// First keyword found in `candidate_url`
    pub fn find(&self, candidate_url: &str) -> Option<&str> {
        if self.patterns.is_empty() {
            return None;
        }
        let lowered = candidate_url.to_lowercase();
        self.patterns
            .iter()
            .find(|pattern| pattern.strategy.is_match(&lowered))
            .map(|pattern| pattern.keyword.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of keywords matched by substring instead of regex
    pub fn substring_fallbacks(&self) -> usize {
        self.patterns
            .iter()
            .filter(|pattern| matches!(pattern.strategy, MatchStrategy::Substring(_)))
            .count()
    }
}

/// First keyword in `keywords` found in `candidate_url`, compiling on the fly
pub fn matches_keyword<'a, S: AsRef<str>>(candidate_url: &str, keywords: &'a [S]) -> Option<&'a str> {
    let lowered = candidate_url.to_lowercase();
    keywords
        .iter()
        .map(|keyword| keyword.as_ref().trim())
        .filter(|keyword| !keyword.is_empty())
        .find(|keyword| MatchStrategy::compile(keyword, DEFAULT_REGEX_SIZE_LIMIT).is_match(&lowered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_boundary() {
        let matcher = KeywordMatcher::new(&["sex"]);
        assert_eq!(matcher.find("https://example.com/essex-county"), None);
        assert_eq!(matcher.find("https://example.com/sex-ed"), Some("sex"));
    }

    #[test]
    fn test_only_leading_boundary_required() {
        let matcher = KeywordMatcher::new(&["game"]);
        assert_eq!(matcher.find("https://example.com/games"), Some("game"));
        assert_eq!(matcher.find("https://example.com/endgame"), None);
    }

    #[test]
    fn test_case_insensitive_over_full_url() {
        let matcher = KeywordMatcher::new(&["Casino"]);
        assert_eq!(matcher.find("https://example.com/search?q=CASINO+bonus"), Some("Casino"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let matcher = KeywordMatcher::new(&["c++", "a.b"]);
        assert_eq!(matcher.find("https://example.com/c++/tutorial"), Some("c++"));
        assert_eq!(matcher.find("https://example.com/axb"), None);
        assert_eq!(matcher.find("https://example.com/a.b"), Some("a.b"));
        assert_eq!(matcher.substring_fallbacks(), 0);
    }

    #[test]
    fn test_list_order_wins() {
        let matcher = KeywordMatcher::new(&["poker", "casino"]);
        assert_eq!(matcher.find("https://casino.example/poker"), Some("poker"));
    }

    #[test]
    fn test_blank_keywords_ignored() {
        let matcher = KeywordMatcher::new(&["", "   "]);
        assert!(matcher.is_empty());
        assert_eq!(matcher.find("https://example.com"), None);
    }

    #[test]
    fn test_rejected_pattern_falls_back_to_substring() {
        let matcher = KeywordMatcher::with_size_limit(&["sex"], 1);
        assert_eq!(matcher.substring_fallbacks(), 1);
        // Substring semantics: no word boundary
        assert_eq!(matcher.find("https://example.com/ESSEX-county"), Some("sex"));
        assert_eq!(matcher.find("https://example.com/rust"), None);
    }

    #[test]
    fn test_matches_keyword_function() {
        let keywords = vec!["violence".to_string(), "sex".to_string()];
        assert_eq!(matches_keyword("https://x.example/sex-ed", &keywords), Some("sex"));
        assert_eq!(matches_keyword("https://x.example/essex", &keywords), None);
        assert_eq!(matches_keyword("not a url at all", &["url"]), Some("url"));
    }
}
