// src/extract/normalize.rs — Cleanup of raw extracted page text
//
// PDF text layers come out with ligatures, soft line breaks and hyphenated
// words split across lines. Everything downstream (the meaningfulness gate,
// context rendering, the assistant prompt) expects flowing prose, so all
// extracted text funnels through normalize() before anything looks at it.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

fn hyphen_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w)-\n(\w)").unwrap())
}

fn newline_runs_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

fn space_runs_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[ \t\u{00A0}\u{2007}\u{202F}\u{200B}\u{FEFF}]+").unwrap())
}

/// Normalize raw extracted text into flowing prose.
///
/// In order: NFKC (collapses ligatures and compatibility forms), rejoin
/// words hyphenated across a line break, reduce 3+ newlines to a paragraph
/// break, fold remaining single newlines into spaces, collapse space runs,
/// trim. Idempotent; empty input yields empty output.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text: String = raw.nfkc().collect();
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let text = hyphen_break_re().replace_all(&text, "${1}${2}");
    let text = newline_runs_re().replace_all(&text, "\n\n");

    // Single newlines inside a paragraph are soft wraps, not breaks.
    let text = text
        .split("\n\n")
        .map(|paragraph| paragraph.replace('\n', " "))
        .collect::<Vec<_>>()
        .join("\n\n");

    let text = space_runs_re().replace_all(&text, " ");
    text.trim().to_string()
}

/// Whether extracted text is rich enough to skip OCR: at least `min_len`
/// characters AND more than `min_letter_ratio` of them alphabetic. The ratio
/// is deliberately loose so data tables and part lists still pass.
pub fn is_meaningful(text: &str, min_len: usize, min_letter_ratio: f64) -> bool {
    let total = text.chars().count();
    if total < min_len {
        return false;
    }
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    letters as f64 / total as f64 > min_letter_ratio
}

/// Lowercase and strip diacritics (NFKD, drop combining marks).
/// Used to compare catalog entries and queries with arbitrary casing.
pub fn fold_for_match(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_hyphen_rejoin() {
        assert_eq!(normalize("exam-\nple"), "example");
        assert_eq!(normalize("exam-\r\nple"), "example");
    }

    #[test]
    fn test_hyphen_without_break_kept() {
        assert_eq!(normalize("built-in oven"), "built-in oven");
    }

    #[test]
    fn test_paragraph_break_preserved() {
        assert_eq!(normalize("one\n\n\n\ntwo"), "one\n\ntwo");
        assert_eq!(normalize("one\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn test_soft_wrap_becomes_space() {
        assert_eq!(normalize("line one\nline two"), "line one line two");
    }

    #[test]
    fn test_space_runs_collapsed() {
        assert_eq!(normalize("a  \t b\u{00A0}\u{00A0}c"), "a b c");
    }

    #[test]
    fn test_nfkc_ligature() {
        // U+FB01 LATIN SMALL LIGATURE FI
        assert_eq!(normalize("ef\u{FB01}cient"), "efficient");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "exam-\nple with  runs\n\n\nand\nwraps",
            "plain text",
            "  padded  ",
            "a\u{00A0}b\u{200B}c",
        ];
        for raw in inputs {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_meaningful_letter_ratio() {
        // 200 chars, 25% letters: meaningful
        let quarter: String = "a123".repeat(50);
        assert!(is_meaningful(&quarter, 150, 0.20));

        // 200 chars, 10% letters: not meaningful
        let tenth: String = "a123456789".repeat(20);
        assert!(!is_meaningful(&tenth, 150, 0.20));
    }

    #[test]
    fn test_meaningful_length_floor() {
        // 100 all-letter chars is still below the length floor
        let short: String = "a".repeat(100);
        assert!(!is_meaningful(&short, 150, 0.20));

        let long: String = "a".repeat(150);
        assert!(is_meaningful(&long, 150, 0.20));
    }

    #[test]
    fn test_fold_for_match() {
        assert_eq!(fold_for_match("SO-6004 B"), "so-6004 b");
        assert_eq!(fold_for_match("Kühlschrank"), "kuhlschrank");
        assert_eq!(fold_for_match("SÉRIE"), "serie");
    }
}
