//! Positional match predicate and tie-break between candidate rules.

use ltwa_index::LtwaEntry;

use crate::normalize::fold_char;

/// Characters an inflection skip may consume.
const INFLECTION_CHARS: &[char] = &['i', 'e', 'a', 's', 'n', '\'', '\u{2019}'];

/// Longest inflection skip, in code points.
const MAX_INFLECTION: usize = 3;

/// Punctuation that ends a word for matching purposes.
const BOUNDARY_PUNCTUATION: &[char] = &[
    '-', '\u{2013}', '\u{2014}', '_', '.', ',', ':', ';', '!', '|', '=', '+', '*', '\\', '/', '"',
    '(', ')', '&', '#', '%', '@', '$', '?',
];

/// How a rule matched at the current word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matched {
    /// Forward match consuming this many code points from the word start.
    Forward(usize),
    /// Suffix match covering this many code points at the end of the word.
    Tail(usize),
}

pub fn is_boundary(c: char) -> bool {
    c.is_whitespace() || BOUNDARY_PUNCTUATION.contains(&c)
}

/// Test `entry` against the folded text at the current word.
///
/// `remaining` runs from the word start to the end of the title; `word` is
/// just the current word.
pub fn match_entry(entry: &LtwaEntry, remaining: &[char], word: &[char]) -> Option<Matched> {
    let stem: Vec<char> = entry.stem().chars().collect();
    if stem.is_empty() || remaining.len() < stem.len() {
        return None;
    }

    if entry.is_suffix_fragment() {
        match_tail(&stem, word).map(Matched::Tail)
    } else {
        match_forward(&stem, remaining, entry.is_open_stem()).map(Matched::Forward)
    }
}

fn match_forward(stem: &[char], text: &[char], open: bool) -> Option<usize> {
    let (mut i, mut j) = (0, 0);
    while j < stem.len() {
        if i < text.len() && same_letter(text[i], stem[j]) {
            i += 1;
            j += 1;
            continue;
        }
        // An inflected word before the next word of a multi-word pattern
        if !is_boundary(stem[j]) {
            return None;
        }
        i += inflection_before_boundary(text, i, false)?;
    }

    if open || i == text.len() || is_boundary(text[i]) {
        return Some(i);
    }
    inflection_before_boundary(text, i, true).map(|k| i + k)
}

fn match_tail(stem: &[char], word: &[char]) -> Option<usize> {
    let reversed: Vec<char> = word.iter().rev().copied().collect();
    let ends_with_stem = |skip: usize| {
        reversed.len() >= skip + stem.len()
            && stem
                .iter()
                .rev()
                .zip(&reversed[skip..])
                .all(|(&s, &w)| same_letter(s, w))
    };

    if ends_with_stem(0) {
        return Some(stem.len());
    }
    (1..=MAX_INFLECTION)
        .take_while(|&k| k <= reversed.len() && INFLECTION_CHARS.contains(&reversed[k - 1]))
        .find(|&k| ends_with_stem(k))
        .map(|k| k + stem.len())
}

/// Inflection lengths to skip at the end of `word` before a suffix lookup,
/// starting with no skip.
pub fn tail_skips(word: &[char]) -> Vec<usize> {
    let inflected = word
        .iter()
        .rev()
        .take(MAX_INFLECTION)
        .take_while(|c| INFLECTION_CHARS.contains(c))
        .count();
    (0..=inflected).collect()
}

/// Length of an inflection starting at `at` that is directly followed by a
/// boundary. Longer skips are preferred. With `at_end`, end of text also
/// counts as a boundary.
fn inflection_before_boundary(text: &[char], at: usize, at_end: bool) -> Option<usize> {
    let available = text[at.min(text.len())..]
        .iter()
        .take(MAX_INFLECTION)
        .take_while(|c| INFLECTION_CHARS.contains(c))
        .count();

    (1..=available).rev().find(|&k| match text.get(at + k) {
        Some(&c) => is_boundary(c),
        None => at_end,
    })
}

fn same_letter(a: char, b: char) -> bool {
    a == b || fold_char(a) == fold_char(b)
}

/// Ordering key: open stem, then pattern length, then a real abbreviation,
/// then English. A `mul` tag alone does not count as English.
fn priority(entry: &LtwaEntry) -> (bool, usize, bool, bool) {
    (
        entry.is_open_stem(),
        entry.word.chars().count(),
        entry.has_abbreviation(),
        entry.is_english(),
    )
}

/// Pick the winning rule. On a full tie the earliest candidate stays.
pub fn select_best<'a>(
    matches: impl IntoIterator<Item = (&'a LtwaEntry, Matched)>,
) -> Option<(&'a LtwaEntry, Matched)> {
    let mut best: Option<(&'a LtwaEntry, Matched)> = None;
    for candidate in matches {
        let replace = match &best {
            None => true,
            Some((current, _)) => priority(candidate.0) > priority(current),
        };
        if replace {
            best = Some(candidate);
        }
    }
    best
}
