//! Cleanup pipeline for submitted question and answer text.
//!
//! Each pass is a function `&str -> String` applied in sequence. Every pass
//! is a no-op on its own output and on the output of later passes, which is
//! what makes the whole pipeline idempotent.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on raw text.
pub(crate) fn run_pipeline(text: &str) -> String {
    let mut result = unify_line_endings(text);

    result = scrub_characters(&result);
    result = collapse_spaces(&result);
    result = trim_lines(&result);
    result = collapse_blank_lines(&result);
    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Line endings
// ---------------------------------------------------------------------------

/// Turn `\r\n` and lone `\r` into `\n`.
fn unify_line_endings(text: &str) -> String {
    static CR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\r\n?").expect("valid regex"));

    CR_RE.replace_all(text, "\n").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Whitespace and invisible characters
// ---------------------------------------------------------------------------

/// Map every whitespace character except `\n` to a plain space and drop
/// zero-width and control characters.
fn scrub_characters(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            c if is_zero_width(c) => None,
            c if c.is_whitespace() => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    )
}

// ---------------------------------------------------------------------------
// Pass 3: Runs of spaces
// ---------------------------------------------------------------------------

fn collapse_spaces(text: &str) -> String {
    static SPACES_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

    SPACES_RE.replace_all(text, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Per-line trim
// ---------------------------------------------------------------------------

fn trim_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| line.trim_matches(' '))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 5: Blank lines
// ---------------------------------------------------------------------------

/// Keep paragraph breaks but never more than one blank line in a row.
fn collapse_blank_lines(text: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(text, "\n\n").into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unify_line_endings_handles_crlf_and_cr() {
        assert_eq!(unify_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn scrub_characters_maps_tabs_and_nbsp() {
        assert_eq!(scrub_characters("a\tb\u{00A0}c"), "a b c");
    }

    #[test]
    fn scrub_characters_drops_zero_width_and_controls() {
        assert_eq!(scrub_characters("pay\u{200B}roll\u{0007}"), "payroll");
        assert_eq!(scrub_characters("\u{FEFF}hello"), "hello");
    }

    #[test]
    fn collapse_spaces_keeps_single() {
        assert_eq!(collapse_spaces("a   b c"), "a b c");
    }

    #[test]
    fn trim_lines_strips_both_ends() {
        assert_eq!(trim_lines("  a  \n b"), "a\nb");
    }

    #[test]
    fn collapse_blank_lines_keeps_paragraphs() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn full_pipeline_cleans_text() {
        let input = "\u{FEFF}  How do I   reset\tmy password?  \r\n\r\n\r\n\r\nUse the portal.\u{200B}  ";
        assert_eq!(
            run_pipeline(input),
            "How do I reset my password?\n\nUse the portal."
        );
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(run_pipeline(" \t\r\n \u{200B} "), "");
    }
}
