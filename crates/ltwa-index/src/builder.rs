//! Download and build pipeline for the LTWA index.
//!
//! Downloads the LTWA CSV published by the ISSN International Centre, parses
//! it row by row and writes the normalized rules into SQLite.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use futures_util::StreamExt;
use rusqlite::Connection;

use crate::db::{self, InsertBatch};
use crate::parser;
use crate::{BuildProgress, IndexError};

/// Default LTWA CSV export (2021-07-02 release).
pub const DEFAULT_LTWA_URL: &str = "https://www.issn.org/wp-content/uploads/2021/07/ltwa_20210702.csv";

/// Schema version written to the metadata table.
const SCHEMA_VERSION: &str = "1";

/// Rules per insert transaction.
const BATCH_SIZE: usize = 10_000;

/// Build (or update) the index by downloading the CSV from `url`.
///
/// Phase 1: Downloads the CSV to a temporary file with progress reporting.
/// Phase 2: Parses and inserts into SQLite (runs in a blocking thread).
///
/// Uses ETag/Last-Modified headers for conditional requests. If the remote
/// file hasn't changed since the last build, returns `Ok(false)`.
pub async fn build(
    db_path: &Path,
    url: &str,
    mut progress: impl FnMut(BuildProgress),
) -> Result<bool, IndexError> {
    let conn = Connection::open(db_path)?;
    db::init_database(&conn)?;

    let stored_etag = db::get_metadata(&conn, "etag")?;
    let stored_last_modified = db::get_metadata(&conn, "last_modified")?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("ltwa-index/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| IndexError::Download(e.to_string()))?;

    let mut request = client.get(url);
    if let Some(ref etag) = stored_etag {
        request = request.header("If-None-Match", etag.as_str());
    }
    if let Some(ref lm) = stored_last_modified {
        request = request.header("If-Modified-Since", lm.as_str());
    }

    let response = request
        .send()
        .await
        .map_err(|e| IndexError::Download(e.to_string()))?;

    if response.status() == reqwest::StatusCode::NOT_MODIFIED {
        tracing::info!(url, "LTWA source not modified, keeping existing index");
        progress(BuildProgress::Complete {
            prefixes: 0,
            suffixes: 0,
            skipped: true,
        });
        return Ok(false);
    }

    if !response.status().is_success() {
        return Err(IndexError::Download(format!(
            "HTTP error: {}",
            response.status()
        )));
    }

    let new_etag = response
        .headers()
        .get("etag")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let new_last_modified = response
        .headers()
        .get("last-modified")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let total_bytes = response.content_length();

    // Phase 1: Download the CSV to a temporary file
    let db_dir = db_path.parent().unwrap_or(Path::new("."));
    let tmp_dir = tempfile::TempDir::new_in(db_dir)?;
    let csv_path = tmp_dir.path().join("ltwa.csv");

    progress(BuildProgress::Downloading {
        bytes_downloaded: 0,
        total_bytes,
    });

    {
        let mut out = File::create(&csv_path)?;
        let mut stream = response.bytes_stream();
        let mut bytes_downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| IndexError::Download(e.to_string()))?;
            out.write_all(&chunk)?;
            bytes_downloaded += chunk.len() as u64;

            progress(BuildProgress::Downloading {
                bytes_downloaded,
                total_bytes,
            });
        }
        out.flush()?;
    }

    // Phase 2: Parse and insert. SQLite writes are sync I/O, so this runs
    // on the blocking pool and forwards progress over a channel.
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<BuildProgress>(64);
    let source = url.to_string();

    let parse_handle = tokio::task::spawn_blocking(move || {
        let _tmp_dir = tmp_dir; // keep temp directory alive until parsing is done

        let counts = rebuild(&conn, &csv_path, &source, |evt| {
            let _ = progress_tx.blocking_send(evt);
        })?;

        if let Some(etag) = new_etag {
            db::set_metadata(&conn, "etag", &etag)?;
        }
        if let Some(lm) = new_last_modified {
            db::set_metadata(&conn, "last_modified", &lm)?;
        }

        Ok::<(i64, i64), IndexError>(counts)
    });

    while let Some(evt) = progress_rx.recv().await {
        progress(evt);
    }

    let (prefixes, suffixes) = parse_handle
        .await
        .map_err(|e| IndexError::Download(format!("parse task panicked: {}", e)))??;

    progress(BuildProgress::Complete {
        prefixes: prefixes as u64,
        suffixes: suffixes as u64,
        skipped: false,
    });

    Ok(true)
}

/// Build the index from a local CSV file.
pub fn build_from_file(
    db_path: &Path,
    csv_path: &Path,
    mut progress: impl FnMut(BuildProgress),
) -> Result<(), IndexError> {
    let conn = Connection::open(db_path)?;
    db::init_database(&conn)?;

    let source = csv_path.display().to_string();
    let (prefixes, suffixes) = rebuild(&conn, csv_path, &source, &mut progress)?;

    progress(BuildProgress::Complete {
        prefixes: prefixes as u64,
        suffixes: suffixes as u64,
        skipped: false,
    });

    Ok(())
}

/// Replace all rules with the contents of `csv_path` and refresh metadata.
fn rebuild(
    conn: &Connection,
    csv_path: &Path,
    source: &str,
    progress: impl FnMut(BuildProgress),
) -> Result<(i64, i64), IndexError> {
    db::clear_rules(conn)?;
    parse_and_insert(conn, csv_path, progress)?;

    db::set_metadata(conn, "last_updated", &now_unix_timestamp())?;
    db::set_metadata(conn, "schema_version", SCHEMA_VERSION)?;
    db::set_metadata(conn, "source", source)?;

    let (prefixes, suffixes) = db::get_counts(conn)?;
    db::set_metadata(conn, "prefix_count", &prefixes.to_string())?;
    db::set_metadata(conn, "suffix_count", &suffixes.to_string())?;

    tracing::info!(prefixes, suffixes, source, "LTWA index rebuilt");
    Ok((prefixes, suffixes))
}

/// Parse a CSV file line by line and insert the rules into the database.
///
/// Lines that are not valid UTF-8 are decoded lossily; rows the parser
/// rejects are counted as skipped.
fn parse_and_insert(
    conn: &Connection,
    csv_path: &Path,
    mut progress: impl FnMut(BuildProgress),
) -> Result<(), IndexError> {
    let mut reader = BufReader::with_capacity(256 * 1024, File::open(csv_path)?);

    let mut batch = InsertBatch::new();
    let mut rows_read: u64 = 0;
    let mut rows_skipped: u64 = 0;
    let mut rules_inserted: u64 = 0;
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        rows_read += 1;

        let text = String::from_utf8_lossy(&line);
        match parser::parse_row(&text) {
            Some(entry) => batch.push(entry),
            None => {
                tracing::trace!(line = rows_read, "skipping LTWA row");
                rows_skipped += 1;
            }
        }

        if batch.len() >= BATCH_SIZE {
            rules_inserted += batch.len() as u64;
            db::insert_batch(conn, &batch)?;
            batch.clear();

            progress(BuildProgress::Parsing {
                rows_read,
                rules_inserted,
                rows_skipped,
            });
        }
    }

    // Flush remaining
    if !batch.is_empty() {
        rules_inserted += batch.len() as u64;
        db::insert_batch(conn, &batch)?;
    }

    progress(BuildProgress::Parsing {
        rows_read,
        rules_inserted,
        rows_skipped,
    });

    Ok(())
}

/// Unix timestamp as a string (seconds since epoch).
fn now_unix_timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}
