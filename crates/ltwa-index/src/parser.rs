//! Row parser for the LTWA CSV export.
//!
//! The ISSN export is one rule per line, three semicolon-separated fields,
//! each usually wrapped in double quotes:
//!
//! - `"word";"abbreviation";"languages"` (quoted fields)
//! - `"-ologie";"-ol.";"fre, ger"` (suffix fragment)
//! - `"(Royal) society";"soc.";"eng"` (leading annotation, stripped)
//! - `"vol-";"n.a.";"mul"` (explicitly unabbreviated)
//!
//! Inside a quoted field a doubled quote (`""`) stands for a literal quote.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::{LtwaEntry, NO_ABBREVIATION};

/// The three raw fields of a CSV row, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub word: String,
    pub abbreviation: String,
    pub languages: String,
}

/// Split a single CSV line into its three raw fields.
///
/// Returns None for empty lines, the header row, or rows that do not have
/// exactly three fields.
pub fn parse_line(line: &str) -> Option<RawRow> {
    let line = line.trim_start_matches('\u{feff}').trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let fields = split_fields(line)?;
    let [word, abbreviation, languages]: [String; 3] = fields.try_into().ok()?;

    if is_header(&word) {
        return None;
    }

    Some(RawRow {
        word,
        abbreviation,
        languages,
    })
}

/// Parse and normalize a CSV line into a rule entry.
///
/// Malformed rows (missing fields, empty word after annotation stripping,
/// empty language list) yield None.
pub fn parse_row(line: &str) -> Option<LtwaEntry> {
    normalize_row(parse_line(line)?)
}

/// Normalize the raw fields of a row into an [`LtwaEntry`].
pub fn normalize_row(row: RawRow) -> Option<LtwaEntry> {
    let word = normalize_word(&row.word);
    let stem = word.trim_matches('-');
    if stem.trim().is_empty() {
        return None;
    }

    let abbreviation = row.abbreviation.trim();
    let abbreviation = if abbreviation.is_empty() || abbreviation == NO_ABBREVIATION {
        None
    } else {
        Some(abbreviation.nfkc().collect::<String>())
    };

    let languages: Vec<String> = row
        .languages
        .split(',')
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect();
    if languages.is_empty() {
        return None;
    }

    Some(LtwaEntry {
        word,
        abbreviation,
        languages,
    })
}

/// Normalize a rule word for indexing: strip a leading `(annotation)`,
/// apply NFKC, remove diacritics and lowercase.
///
/// Agrees with the per-character lookup folding in `ltwa-core`.
pub fn normalize_word(word: &str) -> String {
    static LEADING_ANNOTATION: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\s*\([^)]*\)\s*").unwrap());
    static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    let word = LEADING_ANNOTATION.replace(word, "");
    let composed: String = word.nfkc().collect();
    let stripped: String = composed
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

fn is_header(word: &str) -> bool {
    matches!(word.trim().to_uppercase().as_str(), "WORD" | "WORDS")
}

/// Split a line on `;`, honoring double-quoted fields.
fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::with_capacity(3);
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| *c == ' ' || *c == '\t') {
            chars.next();
        }

        let mut field = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    field.push(c);
                }
            }
            if !closed {
                return None;
            }
            // Only whitespace may follow the closing quote before the separator
            while let Some(c) = chars.peek() {
                if *c == ';' {
                    break;
                }
                if !c.is_whitespace() {
                    return None;
                }
                chars.next();
            }
        } else {
            while let Some(c) = chars.peek() {
                if *c == ';' {
                    break;
                }
                field.push(*c);
                chars.next();
            }
            field = field.trim().to_string();
        }

        fields.push(field);

        match chars.next() {
            Some(';') => continue,
            None => break,
            Some(_) => return None,
        }
    }

    Some(fields)
}
