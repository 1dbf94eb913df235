//! ISO 4 / LTWA journal title abbreviation engine.
//!
//! [`Abbreviator`] owns a prefix and a suffix trie of LTWA rules and turns a
//! full title into its abbreviated form:
//!
//! ```
//! use ltwa_core::Abbreviator;
//! use ltwa_index::LtwaEntry;
//!
//! let rules = vec![LtwaEntry {
//!     word: "journal".to_string(),
//!     abbreviation: Some("j.".to_string()),
//!     languages: vec!["eng".to_string()],
//! }];
//! let abbreviator = Abbreviator::from_source(rules.as_slice()).unwrap();
//! assert_eq!(abbreviator.abbreviate("Journal of Testing").as_deref(), Some("J. Testing"));
//! ```

use std::path::Path;

use thiserror::Error;

pub mod config_file;
pub mod matcher;
pub mod normalize;
pub mod reconstruct;
pub mod resolver;
pub mod store;
pub mod tokenizer;
pub mod trie;

// Re-export for convenience
pub use ltwa_index::{IndexError, LtwaEntry, LtwaIndex};
pub use store::{RuleSource, RuleStore};
pub use tokenizer::{Span, TitleElement};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("cannot fold {found:?} at offset {offset} to a single code point")]
    Normalization { offset: usize, found: char },
    #[error("abbreviation {abbreviation:?} has an unfoldable character at {offset}")]
    Restoration { abbreviation: String, offset: usize },
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Title abbreviation engine.
///
/// Immutable after construction; share it behind an `Arc` across threads.
#[derive(Debug, Default)]
pub struct Abbreviator {
    store: RuleStore,
}

impl Abbreviator {
    /// An engine with no rules. Titles still lose articles, non-leading
    /// stopwords and sentence punctuation.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(store: RuleStore) -> Self {
        Self { store }
    }

    /// Load every rule a source provides.
    pub fn from_source(source: &(impl RuleSource + ?Sized)) -> Result<Self, CoreError> {
        let store = RuleStore::load(source)?;
        Ok(Self::new(store))
    }

    /// Open the SQLite index at `path`.
    ///
    /// A missing or unreadable index is logged and yields an engine with no
    /// rules.
    pub fn open(path: &Path) -> Self {
        let loaded = LtwaIndex::open(path).and_then(|index| RuleStore::load(&index));
        match loaded {
            Ok(store) => {
                tracing::info!(
                    path = %path.display(),
                    prefixes = store.prefix_len(),
                    suffixes = store.suffix_len(),
                    "loaded LTWA index"
                );
                Self::new(store)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load LTWA index, continuing without rules");
                Self::empty()
            }
        }
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Abbreviate a full title.
    ///
    /// Returns None for empty input, for a title that cannot be normalized
    /// or restored, and when nothing is left to emit.
    pub fn abbreviate(&self, title: &str) -> Option<String> {
        match self.try_abbreviate(title) {
            Ok(abbreviated) => abbreviated,
            Err(e) => {
                tracing::debug!(title, error = %e, "no abbreviation for title");
                None
            }
        }
    }

    /// Like [`abbreviate`](Self::abbreviate), but reports why a title failed.
    pub fn try_abbreviate(&self, title: &str) -> Result<Option<String>, CoreError> {
        if title.trim().is_empty() {
            return Ok(None);
        }

        let chars: Vec<char> = normalize::to_compatibility_form(title).chars().collect();
        let folded = normalize::fold(&chars)?;
        let elements = tokenizer::tokenize(&chars);
        let pieces = resolver::resolve(&self.store, &chars, &folded, &elements)?;
        Ok(reconstruct::reconstruct(&pieces))
    }
}
