//! The two-sided rule index used by the resolver.

use ltwa_index::{IndexError, LtwaEntry, LtwaIndex};

use crate::trie::Trie;

/// A provider of `(key, entries)` pairs for both lookup directions.
///
/// The offline SQLite index implements this; tests and embedders can hand
/// in rules from anywhere else.
pub trait RuleSource {
    /// Pairs keyed by the stem read forward.
    fn prefix_entries(&self) -> Result<Vec<(String, Vec<LtwaEntry>)>, IndexError>;

    /// Pairs keyed by the stem read backward.
    fn suffix_entries(&self) -> Result<Vec<(String, Vec<LtwaEntry>)>, IndexError>;
}

impl RuleSource for LtwaIndex {
    fn prefix_entries(&self) -> Result<Vec<(String, Vec<LtwaEntry>)>, IndexError> {
        LtwaIndex::prefix_entries(self)
    }

    fn suffix_entries(&self) -> Result<Vec<(String, Vec<LtwaEntry>)>, IndexError> {
        LtwaIndex::suffix_entries(self)
    }
}

/// Plain list of rules, routed into the two tables by their hyphen markers.
impl RuleSource for [LtwaEntry] {
    fn prefix_entries(&self) -> Result<Vec<(String, Vec<LtwaEntry>)>, IndexError> {
        Ok(keyed(self, false))
    }

    fn suffix_entries(&self) -> Result<Vec<(String, Vec<LtwaEntry>)>, IndexError> {
        Ok(keyed(self, true))
    }
}

fn keyed(entries: &[LtwaEntry], suffixes: bool) -> Vec<(String, Vec<LtwaEntry>)> {
    entries
        .iter()
        .filter(|e| e.is_suffix_fragment() == suffixes)
        .map(|e| (e.index_key().1, vec![e.clone()]))
        .collect()
}

/// Prefix and suffix tries over the rule set. Immutable once built.
#[derive(Debug, Default)]
pub struct RuleStore {
    prefix: Trie<LtwaEntry>,
    suffix: Trie<LtwaEntry>,
}

impl RuleStore {
    /// A store with no rules; every word resolves to itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build both tries from the given pairs.
    pub fn from_pairs(
        prefixes: impl IntoIterator<Item = (String, Vec<LtwaEntry>)>,
        suffixes: impl IntoIterator<Item = (String, Vec<LtwaEntry>)>,
    ) -> Self {
        let mut store = Self::empty();
        for (key, entries) in prefixes {
            store.prefix.insert(&key, entries);
        }
        for (key, entries) in suffixes {
            store.suffix.insert(&key, entries);
        }
        store
    }

    /// Load every pair a source yields.
    pub fn load(source: &(impl RuleSource + ?Sized)) -> Result<Self, IndexError> {
        Ok(Self::from_pairs(
            source.prefix_entries()?,
            source.suffix_entries()?,
        ))
    }

    /// Rules whose forward key is a prefix of `text`, followed by rules
    /// whose backward key is a prefix of `word` read backward. The backward
    /// lookup is repeated after dropping each length in `tail_skips` from
    /// the end of `word`; a rule reached more than once is listed once.
    pub fn candidates(
        &self,
        text: &[char],
        word: &[char],
        tail_skips: impl IntoIterator<Item = usize>,
    ) -> Vec<&LtwaEntry> {
        let mut found = self.prefix.search(text.iter().copied());
        for skip in tail_skips {
            let Some(kept) = word.len().checked_sub(skip) else {
                break;
            };
            for entry in self.suffix.search(word[..kept].iter().rev().copied()) {
                if !found.iter().any(|seen| std::ptr::eq(*seen, entry)) {
                    found.push(entry);
                }
            }
        }
        found
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix.len()
    }

    pub fn suffix_len(&self) -> usize {
        self.suffix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }
}
