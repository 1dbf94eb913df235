//! Segmentation of a normalized title into typed elements.
//!
//! Offsets are code-point indices into the NFKC form of the title, the same
//! indexing the folded lookup text uses.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use unicode_normalization::char::is_combining_mark;

use crate::normalize::strip_diacritics;

/// Articles: never emitted.
static ARTICLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", // en
        "der", "die", "das", "dem", "den", "ein", "eine", "einer", "eines", "einem", "einen", // de
        "le", "la", "les", "un", "une", // fr
        "el", "los", "las", "una", // es
        "il", "lo", "gli", "uno", // it
        "het", "een", // nl
    ]
    .into_iter()
    .collect()
});

/// Prepositions, conjunctions and filler words: emitted only as the first
/// element. Words with an LTWA rule of their own (`über`, `für`) are left out.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "and", "or", "nor", "but", "of", "in", "on", "at", "to", "for", "from", "by", "with",
        "into", "upon", "via", "per", "as", // en
        "proceedings", "part", "parts", "volume", "volumes", "papers", // fillers
        "und", "oder", "von", "vom", "zu", "zur", "zum", "im", "am", "auf", "aus", "bei",
        "mit", // de
        "et", "ou", "de", "des", "du", "en", "pour", "sur", "dans", "par", "aux", // fr
        "del", "para", "por", "con", // es
        "di", "da", "dei", "della", "delle", "nel", "sul", // it
        "em", "do", "dos", // pt
        "van", "voor", "op", // nl
    ]
    .into_iter()
    .collect()
});

/// Elided articles split off the front of a word (`l'Académie`).
const ELIDED_ARTICLES: &[&str] = &["l'"];

/// Elided prepositions split off the front of a word (`d'Analyse`).
const ELIDED_STOPWORDS: &[&str] = &["d'", "dell'", "dall'", "nell'", "sull'", "all'", "qu'"];

const ORDINAL_SUFFIXES: &[&str] = &["st", "nd", "rd", "th"];

/// A stretch of the normalized title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    /// First code point, inclusive.
    pub start: usize,
    /// Last code point, exclusive.
    pub end: usize,
}

impl Span {
    fn new(chars: &[char], start: usize, end: usize) -> Self {
        Self {
            text: chars[start..end].iter().collect(),
            start,
            end,
        }
    }
}

/// One element of a tokenized title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleElement {
    Article(Span),
    Stopword(Span),
    Word(Span),
    /// Already abbreviated or brace-protected; passed through verbatim.
    PreAbbreviated(Span),
    Ordinal(Span),
    Hyphen(Span),
    SymbolRun(Span),
    /// The whole title is one word.
    SingleWordTitle(Span),
    /// The whole title is a stopword and one more element.
    StopwordPlusAny(Span),
    /// The whole title is a word directly followed by symbols.
    WordPlusSymbols(Span),
}

impl TitleElement {
    pub fn span(&self) -> &Span {
        match self {
            TitleElement::Article(s)
            | TitleElement::Stopword(s)
            | TitleElement::Word(s)
            | TitleElement::PreAbbreviated(s)
            | TitleElement::Ordinal(s)
            | TitleElement::Hyphen(s)
            | TitleElement::SymbolRun(s)
            | TitleElement::SingleWordTitle(s)
            | TitleElement::StopwordPlusAny(s)
            | TitleElement::WordPlusSymbols(s) => s,
        }
    }
}

/// Tokenize a normalized title.
///
/// A title whose whole element sequence has one of the shortcut shapes comes
/// back as a single composite element.
pub fn tokenize(chars: &[char]) -> Vec<TitleElement> {
    let elements: Vec<TitleElement> = Lexer::new(chars).collect();

    let whole = |first: &TitleElement, last: &TitleElement| {
        Span::new(chars, first.span().start, last.span().end)
    };

    match elements.as_slice() {
        [
            only @ (TitleElement::Word(_) | TitleElement::Stopword(_) | TitleElement::Article(_)),
        ] => vec![TitleElement::SingleWordTitle(whole(only, only))],
        [first @ TitleElement::Stopword(_), second] => {
            vec![TitleElement::StopwordPlusAny(whole(first, second))]
        }
        [first @ TitleElement::Word(w), second @ TitleElement::SymbolRun(s)] if w.end == s.start => {
            vec![TitleElement::WordPlusSymbols(whole(first, second))]
        }
        _ => elements,
    }
}

/// Left-to-right lexer over the normalized title.
pub struct Lexer<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(chars: &'a [char]) -> Self {
        Self { chars, pos: 0 }
    }

    fn at(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    /// A `-` at `i` joining two alphanumeric characters.
    fn is_hyphen_at(&self, i: usize) -> bool {
        self.at(i) == Some('-')
            && i > 0
            && self.at(i - 1).is_some_and(char::is_alphanumeric)
            && self.at(i + 1).is_some_and(char::is_alphanumeric)
    }

    fn letters(&mut self, start: usize) -> TitleElement {
        let mut end = start;
        while let Some(c) = self.at(end) {
            let inner_apostrophe = is_apostrophe(c)
                && end > start
                && self.at(end + 1).is_some_and(is_letter);
            if is_letter(c) || inner_apostrophe {
                end += 1;
            } else {
                break;
            }
        }

        let run: String = self.chars[start..end].iter().collect();
        let key = fold_key(&run);

        // Elided article or preposition glued to the next word
        if let Some(apostrophe) = key.find('\'') {
            let elided = &key[..=apostrophe];
            let split = start + elided.chars().count();
            if split < end {
                if ELIDED_ARTICLES.contains(&elided) {
                    self.pos = split;
                    return TitleElement::Article(Span::new(self.chars, start, split));
                }
                if ELIDED_STOPWORDS.contains(&elided) {
                    self.pos = split;
                    return TitleElement::Stopword(Span::new(self.chars, start, split));
                }
            }
        }

        // "Phys." but not "Society..."
        if self.at(end) == Some('.') && self.at(end + 1) != Some('.') {
            self.pos = end + 1;
            return TitleElement::PreAbbreviated(Span::new(self.chars, start, end + 1));
        }

        self.pos = end;
        let span = Span::new(self.chars, start, end);

        // Parts of a hyphenated compound are always words ("state-of-the-art")
        let hyphenated = (start > 0 && self.is_hyphen_at(start - 1)) || self.is_hyphen_at(end);
        if hyphenated {
            TitleElement::Word(span)
        } else if ARTICLES.contains(key.as_str()) {
            TitleElement::Article(span)
        } else if STOPWORDS.contains(key.as_str()) {
            TitleElement::Stopword(span)
        } else {
            TitleElement::Word(span)
        }
    }

    fn digits(&mut self, start: usize) -> TitleElement {
        let mut end = start;
        while self.at(end).is_some_and(|c| c.is_ascii_digit()) {
            end += 1;
        }

        let suffix: String = self.chars[end..(end + 2).min(self.chars.len())]
            .iter()
            .flat_map(|c| c.to_lowercase())
            .collect();
        let suffix_ends_word = !self.at(end + 2).is_some_and(is_letter);
        if ORDINAL_SUFFIXES.contains(&suffix.as_str()) && suffix_ends_word {
            self.pos = end + 2;
            return TitleElement::Ordinal(Span::new(self.chars, start, end + 2));
        }

        self.pos = end;
        let span = Span::new(self.chars, start, end);
        // Bare numbers are dropped unless part of a compound ("3-D")
        if (start > 0 && self.is_hyphen_at(start - 1)) || self.is_hyphen_at(end) {
            TitleElement::Word(span)
        } else {
            TitleElement::SymbolRun(span)
        }
    }

    fn braced(&mut self, start: usize) -> TitleElement {
        let mut depth = 0usize;
        let mut end = start;
        while let Some(c) = self.at(end) {
            end += 1;
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        self.pos = end;
        TitleElement::PreAbbreviated(Span::new(self.chars, start, end))
    }

    fn symbols(&mut self, start: usize) -> TitleElement {
        let mut end = start + 1;
        while let Some(c) = self.at(end) {
            if c.is_whitespace() || c.is_alphanumeric() || is_combining_mark(c) || c == '{' {
                break;
            }
            end += 1;
        }
        self.pos = end;
        TitleElement::SymbolRun(Span::new(self.chars, start, end))
    }
}

impl Iterator for Lexer<'_> {
    type Item = TitleElement;

    fn next(&mut self) -> Option<TitleElement> {
        while self.at(self.pos).is_some_and(char::is_whitespace) {
            self.pos += 1;
        }

        let start = self.pos;
        let c = self.at(start)?;

        let element = if c == '{' {
            self.braced(start)
        } else if c.is_ascii_digit() {
            self.digits(start)
        } else if is_letter(c) {
            self.letters(start)
        } else if self.is_hyphen_at(start) {
            self.pos = start + 1;
            TitleElement::Hyphen(Span::new(self.chars, start, start + 1))
        } else {
            self.symbols(start)
        };

        Some(element)
    }
}

fn is_letter(c: char) -> bool {
    (c.is_alphabetic() || is_combining_mark(c)) && !c.is_ascii_digit()
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Lowercase, accent-free spelling used for the closed word lists.
fn fold_key(run: &str) -> String {
    strip_diacritics(&run.to_lowercase()).replace('\u{2019}', "'")
}
