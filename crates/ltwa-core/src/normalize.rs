//! Unicode canonicalization primitives.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::CoreError;

/// Compatibility decomposition followed by canonical composition (NFKC).
///
/// Ligatures and width variants collapse (`"ﬁ"` → `"fi"`, `"Ｊ"` → `"J"`),
/// so the tokenizer and the rule lookup see a single spelling.
pub fn to_compatibility_form(text: &str) -> String {
    text.nfkc().collect()
}

/// Canonical decomposition with all combining marks removed.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Fold one code point to its lowercase, accent-free form.
///
/// Returns None when the result is not exactly one code point (a bare
/// combining mark, a Hangul syllable, ...). Offsets in the folded text must
/// line up with the original, so such characters cannot be folded.
pub fn fold_char(c: char) -> Option<char> {
    let mut folded = c.to_lowercase().nfd().filter(|m| !is_combining_mark(*m));
    let first = folded.next()?;
    match folded.next() {
        None => Some(first),
        Some(_) => None,
    }
}

/// Fold a whole text into lookup form, one code point per input code point.
pub fn fold(text: &[char]) -> Result<Vec<char>, CoreError> {
    text.iter()
        .enumerate()
        .map(|(offset, &c)| fold_char(c).ok_or(CoreError::Normalization { offset, found: c }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_form() {
        assert_eq!(to_compatibility_form("ﬁnance"), "finance");
        assert_eq!(to_compatibility_form("Ｊournal"), "Journal");
        assert_eq!(to_compatibility_form("e\u{301}tude"), "étude");
    }

    #[test]
    fn test_strip_diacritics() {
        assert_eq!(strip_diacritics("Über Straße"), "Uber Straße");
        assert_eq!(strip_diacritics("résumé"), "resume");
    }

    #[test]
    fn test_fold_char() {
        assert_eq!(fold_char('Ü'), Some('u'));
        assert_eq!(fold_char('É'), Some('e'));
        assert_eq!(fold_char('ß'), Some('ß'));
        assert_eq!(fold_char('İ'), Some('i'));
        assert_eq!(fold_char('.'), Some('.'));
    }

    #[test]
    fn test_fold_char_rejects_unalignable() {
        assert_eq!(fold_char('\u{301}'), None);
        assert_eq!(fold_char('한'), None);
    }

    #[test]
    fn test_fold_reports_offset() {
        assert_eq!(fold(&['É', 't', 'é']).unwrap(), vec!['e', 't', 'e']);

        // NFKC has nothing to compose a mark after a symbol with
        let text: Vec<char> = to_compatibility_form("a-\u{301}").chars().collect();
        match fold(&text) {
            Err(CoreError::Normalization { offset, .. }) => assert_eq!(offset, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
