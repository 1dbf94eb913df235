//! Offline LTWA rule index builder and reader.
//!
//! Provides a SQLite-backed store of List of Title Word Abbreviations rules,
//! split into a forward-keyed `prefixes` table and a backward-keyed
//! `suffixes` table, a parser for the published semicolon-separated CSV, and
//! ETag-based conditional downloads of that CSV.

mod builder;
mod db;
pub mod parser;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;

// Re-export for convenience
pub use builder::DEFAULT_LTWA_URL;

/// Abbreviation field value meaning "keep the word unabbreviated".
pub const NO_ABBREVIATION: &str = "n.a.";

/// Language code for English.
pub const ENGLISH: &str = "eng";

/// Language code sentinel meaning "applies to all languages".
pub const MULTIPLE_LANGUAGES: &str = "mul";

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("download error: {0}")]
    Download(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single abbreviation rule.
///
/// `word` is normalized (NFKC, no diacritics, lowercase). A leading `-`
/// marks a suffix fragment, a trailing `-` an open stem; neither is a
/// literal hyphen. `abbreviation` is `None` when the rule says the word must
/// stay unabbreviated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LtwaEntry {
    pub word: String,
    pub abbreviation: Option<String>,
    pub languages: Vec<String>,
}

impl LtwaEntry {
    /// Whether the pattern matches only as the tail of a word (`-ology`).
    pub fn is_suffix_fragment(&self) -> bool {
        self.word.starts_with('-')
    }

    /// Whether the pattern is an open stem (`comput-`).
    pub fn is_open_stem(&self) -> bool {
        self.word.ends_with('-')
    }

    /// The pattern without its hyphen markers.
    pub fn stem(&self) -> &str {
        let word = self.word.strip_prefix('-').unwrap_or(&self.word);
        word.strip_suffix('-').unwrap_or(word)
    }

    pub fn has_abbreviation(&self) -> bool {
        self.abbreviation.is_some()
    }

    pub fn is_english(&self) -> bool {
        self.languages.iter().any(|l| l == ENGLISH)
    }

    pub fn applies_to_all_languages(&self) -> bool {
        self.languages.iter().any(|l| l == MULTIPLE_LANGUAGES)
    }

    /// The table this entry is stored in and its key there.
    pub fn index_key(&self) -> (Table, String) {
        if self.is_suffix_fragment() {
            (Table::Suffixes, self.stem().chars().rev().collect())
        } else {
            (Table::Prefixes, self.stem().to_string())
        }
    }
}

/// The two logical tables of the persisted index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Keyed by the stem read forward.
    Prefixes,
    /// Keyed by the stem read backward.
    Suffixes,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Prefixes => "prefixes",
            Table::Suffixes => "suffixes",
        }
    }
}

/// Index build statistics stored in the metadata table.
#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub build_date: Option<String>,
    pub schema_version: Option<String>,
    pub prefix_count: Option<String>,
    pub suffix_count: Option<String>,
    pub source: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Progress events emitted during index building.
#[derive(Debug, Clone)]
pub enum BuildProgress {
    Downloading {
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },
    Parsing {
        /// Lines read from the CSV file.
        rows_read: u64,
        /// Rules committed to SQLite.
        rules_inserted: u64,
        /// Header, blank and malformed lines.
        rows_skipped: u64,
    },
    Complete {
        prefixes: u64,
        suffixes: u64,
        skipped: bool,
    },
}

/// Result of a staleness check.
#[derive(Debug, Clone)]
pub struct StalenessCheck {
    pub is_stale: bool,
    pub age_days: Option<u64>,
    pub build_date: Option<String>,
}

/// Handle to an opened LTWA index.
pub struct LtwaIndex {
    conn: Connection,
    path: PathBuf,
}

impl LtwaIndex {
    /// Open an existing index.
    ///
    /// Verifies that both rule tables exist.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('prefixes', 'suffixes')",
            [],
            |row| row.get(0),
        )?;

        if tables != 2 {
            return Err(IndexError::Database(rusqlite::Error::QueryReturnedNoRows));
        }

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// All `(key, entries)` pairs of the forward-keyed table.
    pub fn prefix_entries(&self) -> Result<Vec<(String, Vec<LtwaEntry>)>, IndexError> {
        db::load_table(&self.conn, Table::Prefixes)
    }

    /// All `(key, entries)` pairs of the backward-keyed table.
    pub fn suffix_entries(&self) -> Result<Vec<(String, Vec<LtwaEntry>)>, IndexError> {
        db::load_table(&self.conn, Table::Suffixes)
    }

    /// Get index metadata.
    pub fn info(&self) -> Result<IndexInfo, IndexError> {
        Ok(IndexInfo {
            build_date: db::get_metadata(&self.conn, "last_updated")?,
            schema_version: db::get_metadata(&self.conn, "schema_version")?,
            prefix_count: db::get_metadata(&self.conn, "prefix_count")?,
            suffix_count: db::get_metadata(&self.conn, "suffix_count")?,
            source: db::get_metadata(&self.conn, "source")?,
            etag: db::get_metadata(&self.conn, "etag")?,
            last_modified: db::get_metadata(&self.conn, "last_modified")?,
        })
    }

    /// Check if the index is older than `threshold_days`.
    pub fn check_staleness(&self, threshold_days: u64) -> Result<StalenessCheck, IndexError> {
        let build_date = db::get_metadata(&self.conn, "last_updated")?;

        let age_days = build_date.as_ref().and_then(|ts| {
            let build_secs: u64 = ts.parse().ok()?;
            let now_secs = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .ok()?
                .as_secs();
            Some((now_secs.saturating_sub(build_secs)) / 86400)
        });

        let is_stale = age_days.is_none_or(|days| days >= threshold_days);

        Ok(StalenessCheck {
            is_stale,
            age_days,
            build_date,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Download the LTWA CSV from `url` and build (or rebuild) the index.
///
/// Uses ETag/Last-Modified for conditional requests. Returns `false` if the
/// remote file hasn't changed since the last build (no work done).
pub async fn build_index(
    db_path: &Path,
    url: &str,
    progress: impl FnMut(BuildProgress),
) -> Result<bool, IndexError> {
    builder::build(db_path, url, progress).await
}

/// Build the index from a local LTWA CSV file, replacing any existing rules.
pub fn build_index_from_file(
    db_path: &Path,
    csv_path: &Path,
    progress: impl FnMut(BuildProgress),
) -> Result<(), IndexError> {
    builder::build_from_file(db_path, csv_path, progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(word: &str) -> LtwaEntry {
        LtwaEntry {
            word: word.to_string(),
            abbreviation: Some("x.".to_string()),
            languages: vec![ENGLISH.to_string()],
        }
    }

    #[test]
    fn test_stem_strips_markers() {
        assert_eq!(entry("comput-").stem(), "comput");
        assert_eq!(entry("-ology").stem(), "ology");
        assert_eq!(entry("-olog-").stem(), "olog");
        assert_eq!(entry("journal").stem(), "journal");
    }

    #[test]
    fn test_index_key_routes_suffix_fragments() {
        assert_eq!(
            entry("-ology").index_key(),
            (Table::Suffixes, "ygolo".to_string())
        );
        assert_eq!(
            entry("comput-").index_key(),
            (Table::Prefixes, "comput".to_string())
        );
    }

    #[test]
    fn test_language_tags() {
        let mut e = entry("journal");
        assert!(e.is_english());
        assert!(!e.applies_to_all_languages());

        e.languages = vec!["ger".to_string(), MULTIPLE_LANGUAGES.to_string()];
        assert!(!e.is_english());
        assert!(e.applies_to_all_languages());
    }

    #[test]
    fn test_open_rejects_uninitialized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (x INTEGER);")
            .unwrap();
        assert!(LtwaIndex::open(&path).is_err());
    }
}
