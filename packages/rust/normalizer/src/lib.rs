//! Deterministic text normalization for questions, answers and queries.
//!
//! [`normalize`] produces the `processed` variant stored next to the original
//! text. It never fails and `normalize(normalize(x)) == normalize(x)`.
//! [`search_terms`] turns a free-text query into match terms and
//! [`expand_query`] widens those with stems and synonyms.

mod cleanup;
mod expand;
mod terms;

pub use expand::{MatchTerm, expand_query, stem};
pub use terms::search_terms;

/// Normalize raw text: unify line endings, turn exotic whitespace into
/// spaces, drop invisible characters, collapse runs of spaces and blank
/// lines, and trim.
pub fn normalize(text: &str) -> String {
    cleanup::run_pipeline(text)
}

/// Normalize and return `None` when nothing is left.
pub fn normalize_non_empty(text: &str) -> Option<String> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
