//! Query normalizer: decides whether a search is an IP or a place name.

use super::types::SearchQuery;
use regex::Regex;
use std::sync::LazyLock;

// Shape only: "999.1.1.1" passes. ASCII digits, since `\d` is Unicode-aware.
static IPV4_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,3}(?:\.[0-9]{1,3}){3}$").expect("IPv4 pattern is valid")
});

/// Classify raw user input. Total: every string maps to some query.
pub fn classify(raw: &str) -> SearchQuery {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        SearchQuery::Empty
    } else if IPV4_LITERAL.is_match(trimmed) {
        SearchQuery::IPv4Literal(trimmed.to_string())
    } else {
        SearchQuery::FreeTextLocation(trimmed.to_string())
    }
}
