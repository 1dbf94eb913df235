//! SQLite database operations for the LTWA index.

use rusqlite::{Connection, params};

use crate::{IndexError, LtwaEntry, Table};

/// Initialize the database with the required schema.
/// Sets WAL mode and NORMAL synchronous for performance.
pub fn init_database(conn: &Connection) -> Result<(), IndexError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS prefixes (
            id INTEGER PRIMARY KEY,
            key TEXT NOT NULL,
            word TEXT NOT NULL,
            abbreviation TEXT,
            languages TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS suffixes (
            id INTEGER PRIMARY KEY,
            key TEXT NOT NULL,
            word TEXT NOT NULL,
            abbreviation TEXT,
            languages TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_prefixes_key ON prefixes(key);
        CREATE INDEX IF NOT EXISTS idx_suffixes_key ON suffixes(key);
        "#,
    )?;

    Ok(())
}

/// Remove every rule so a rebuild starts from an empty index.
pub fn clear_rules(conn: &Connection) -> Result<(), IndexError> {
    conn.execute_batch("DELETE FROM prefixes; DELETE FROM suffixes;")?;
    Ok(())
}

/// Batch of rules to insert into the database.
#[derive(Default)]
pub struct InsertBatch {
    pub prefixes: Vec<(String, LtwaEntry)>, // (key, entry)
    pub suffixes: Vec<(String, LtwaEntry)>, // (reversed key, entry)
}

impl InsertBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an entry to the table its word markers call for.
    pub fn push(&mut self, entry: LtwaEntry) {
        match entry.index_key() {
            (Table::Prefixes, key) => self.prefixes.push((key, entry)),
            (Table::Suffixes, key) => self.suffixes.push((key, entry)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.suffixes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len() + self.suffixes.len()
    }

    pub fn clear(&mut self) {
        self.prefixes.clear();
        self.suffixes.clear();
    }
}

/// Insert a batch of rules in one transaction.
pub fn insert_batch(conn: &Connection, batch: &InsertBatch) -> Result<(), IndexError> {
    let tx = conn.unchecked_transaction()?;

    for (table, rows) in [
        (Table::Prefixes, &batch.prefixes),
        (Table::Suffixes, &batch.suffixes),
    ] {
        let mut stmt = tx.prepare_cached(&format!(
            "INSERT INTO {} (key, word, abbreviation, languages) VALUES (?1, ?2, ?3, ?4)",
            table.name()
        ))?;
        for (key, entry) in rows {
            stmt.execute(params![
                key,
                entry.word,
                entry.abbreviation,
                entry.languages.join(",")
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Read a whole table as `(key, entries)` pairs.
///
/// Rows sharing a key are grouped in insertion order.
pub fn load_table(
    conn: &Connection,
    table: Table,
) -> Result<Vec<(String, Vec<LtwaEntry>)>, IndexError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT key, word, abbreviation, languages FROM {} ORDER BY key, id",
        table.name()
    ))?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut grouped: Vec<(String, Vec<LtwaEntry>)> = Vec::new();
    for row in rows {
        let (key, word, abbreviation, languages) = row?;
        let languages: Vec<String> = languages
            .split(',')
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        if word.is_empty() || languages.is_empty() {
            return Err(IndexError::Parse(format!(
                "invalid rule for key {:?} in {}",
                key,
                table.name()
            )));
        }

        let entry = LtwaEntry {
            word,
            abbreviation,
            languages,
        };
        match grouped.last_mut() {
            Some((last_key, entries)) if *last_key == key => entries.push(entry),
            _ => grouped.push((key, vec![entry])),
        }
    }

    Ok(grouped)
}

/// Get a metadata value by key.
pub fn get_metadata(conn: &Connection, key: &str) -> Result<Option<String>, IndexError> {
    let mut stmt = conn.prepare_cached("SELECT value FROM metadata WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).ok();
    Ok(result)
}

/// Set a metadata value (upsert).
pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<(), IndexError> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Get row counts of the prefix and suffix tables.
pub fn get_counts(conn: &Connection) -> Result<(i64, i64), IndexError> {
    let prefixes: i64 = conn.query_row("SELECT COUNT(*) FROM prefixes", [], |row| row.get(0))?;
    let suffixes: i64 = conn.query_row("SELECT COUNT(*) FROM suffixes", [], |row| row.get(0))?;
    Ok((prefixes, suffixes))
}
