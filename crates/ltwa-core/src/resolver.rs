//! Per-element abbreviation: rule lookup, restoration and cursor handling.

use crate::CoreError;
use crate::matcher::{self, Matched};
use crate::normalize::fold_char;
use crate::store::RuleStore;
use crate::tokenizer::{Span, TitleElement};

/// What a piece came from, as far as reconstruction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Word,
    Ordinal,
    Stopword,
    Article,
    Hyphen,
    /// Symbols, pre-abbreviated tokens and whole-title shortcuts.
    Verbatim,
}

/// A resolved stretch of the title, ready to be joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub role: Role,
    /// Output text. Empty when the element emits nothing.
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Piece {
    fn verbatim(role: Role, span: &Span) -> Self {
        Self {
            role,
            text: span.text.clone(),
            start: span.start,
            end: span.end,
        }
    }
}

/// Resolve every element of a tokenized title.
///
/// `title` is the normalized title and `folded` its lookup form, aligned code
/// point by code point. Elements starting inside a span already consumed by
/// a multi-word rule are absorbed into that rule's piece.
pub fn resolve(
    store: &RuleStore,
    title: &[char],
    folded: &[char],
    elements: &[TitleElement],
) -> Result<Vec<Piece>, CoreError> {
    let mut pieces: Vec<Piece> = Vec::with_capacity(elements.len());
    let mut cursor = 0;

    for element in elements {
        let span = element.span();
        if span.start < cursor {
            if let Some(last) = pieces.last_mut() {
                last.end = last.end.max(span.end);
            }
            cursor = cursor.max(span.end);
            continue;
        }

        let piece = match element {
            TitleElement::Word(span) => resolve_word(store, title, folded, span)?,
            TitleElement::Stopword(span) => Piece::verbatim(Role::Stopword, span),
            TitleElement::Article(span) => Piece::verbatim(Role::Article, span),
            TitleElement::Ordinal(span) => Piece::verbatim(Role::Ordinal, span),
            TitleElement::Hyphen(span) => Piece::verbatim(Role::Hyphen, span),
            TitleElement::SymbolRun(span) => Piece {
                text: emitted_symbols(&span.text).to_string(),
                ..Piece::verbatim(Role::Verbatim, span)
            },
            TitleElement::PreAbbreviated(span)
            | TitleElement::SingleWordTitle(span)
            | TitleElement::StopwordPlusAny(span)
            | TitleElement::WordPlusSymbols(span) => Piece::verbatim(Role::Verbatim, span),
        };

        cursor = piece.end;
        pieces.push(piece);
    }

    Ok(pieces)
}

/// Sentence punctuation, conjunction signs, commas and bare numbers emit
/// nothing.
fn emitted_symbols(run: &str) -> &str {
    if run.chars().all(|c| matches!(c, '.' | ',' | '&' | '+') || c.is_ascii_digit()) {
        ""
    } else {
        run
    }
}

fn resolve_word(
    store: &RuleStore,
    title: &[char],
    folded: &[char],
    span: &Span,
) -> Result<Piece, CoreError> {
    let remaining = &folded[span.start..];
    let word = &folded[span.start..span.end];

    let candidates = store.candidates(remaining, word, matcher::tail_skips(word));
    let best = matcher::select_best(candidates.into_iter().filter_map(|entry| {
        matcher::match_entry(entry, remaining, word).map(|m| (entry, m))
    }));

    let Some((entry, matched)) = best else {
        return Ok(Piece::verbatim(Role::Word, span));
    };

    tracing::trace!(word = %span.text, rule = %entry.word, "matched LTWA rule");

    let (end, text) = match matched {
        Matched::Forward(consumed) => {
            let end = (span.start + consumed).max(span.end);
            let text = match &entry.abbreviation {
                Some(abbreviation) => restore(
                    abbreviation,
                    &title[span.start..],
                    &folded[span.start..],
                )?,
                None => title[span.start..end].iter().collect(),
            };
            (end, text)
        }
        Matched::Tail(tail) => {
            let split = span.end - tail;
            let text = match &entry.abbreviation {
                Some(abbreviation) => {
                    let head: String = title[span.start..split].iter().collect();
                    let abbreviation = abbreviation.strip_prefix('-').unwrap_or(abbreviation);
                    head + &restore(abbreviation, &title[split..], &folded[split..])?
                }
                None => span.text.clone(),
            };
            (span.end, text)
        }
    };

    Ok(Piece {
        role: Role::Word,
        text,
        start: span.start,
        end,
    })
}

/// Carry case and diacritics of the original occurrence into `abbreviation`.
///
/// Each code point of the abbreviation takes the original code point at the
/// same position when both fold to the same character. Positions restart at
/// every space, so each word of a multi-word abbreviation lines up with the
/// corresponding original word.
pub fn restore(
    abbreviation: &str,
    original: &[char],
    original_folded: &[char],
) -> Result<String, CoreError> {
    let mut restored = String::with_capacity(abbreviation.len());
    let mut word_start = 0;
    let mut k = 0;
    let mut after_space = false;

    for (offset, a) in abbreviation.chars().enumerate() {
        if a.is_whitespace() {
            if !after_space {
                word_start = next_word_start(original, word_start);
                k = 0;
            }
            after_space = true;
            restored.push(a);
            continue;
        }
        after_space = false;

        let i = word_start + k;
        k += 1;
        let Some(&orig) = original.get(i) else {
            restored.push(a);
            continue;
        };
        let folded = fold_char(a).ok_or_else(|| CoreError::Restoration {
            abbreviation: abbreviation.to_string(),
            offset,
        })?;
        restored.push(if original_folded.get(i) == Some(&folded) { orig } else { a });
    }

    Ok(restored)
}

fn next_word_start(text: &[char], from: usize) -> usize {
    let mut i = from;
    while text.get(i).is_some_and(|c| !c.is_whitespace()) {
        i += 1;
    }
    while text.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    i
}
