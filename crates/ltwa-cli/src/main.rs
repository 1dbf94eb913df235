use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use indicatif::{HumanBytes, HumanCount, MultiProgress, ProgressBar, ProgressStyle};
use ltwa_core::Abbreviator;
use ltwa_core::config_file::{self, ConfigFile};
use ltwa_index::{BuildProgress, LtwaIndex};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Index older than this gets a rebuild hint.
const STALE_AFTER_DAYS: u64 = 365;

/// ISO 4 journal title abbreviation using the List of Title Word Abbreviations
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Abbreviate titles given as arguments, or one per line on stdin
    Abbreviate {
        /// Titles to abbreviate
        titles: Vec<String>,

        /// Path to the LTWA index
        #[arg(long)]
        index: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Build the LTWA index from a local CSV export
    BuildIndex {
        /// Path to store the LTWA SQLite index
        db: PathBuf,

        /// LTWA CSV file to read
        #[arg(long)]
        from: PathBuf,
    },

    /// Download the LTWA CSV and rebuild the index if it changed
    UpdateIndex {
        /// Path to store the LTWA SQLite index
        db: PathBuf,

        /// CSV URL (defaults to the ISSN export)
        #[arg(long)]
        url: Option<String>,
    },

    /// Show metadata of an LTWA index
    Info {
        /// Path to the LTWA SQLite index
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config_file::load_config();

    match cli.command {
        Command::Abbreviate {
            titles,
            index,
            no_color,
        } => abbreviate(titles, index, no_color, &config),
        Command::BuildIndex { db, from } => build_index(&db, &from),
        Command::UpdateIndex { db, url } => update_index(&db, url, &config).await,
        Command::Info { db } => info(&db, &config),
    }
}

fn abbreviate(
    titles: Vec<String>,
    index: Option<PathBuf>,
    no_color: bool,
    config: &ConfigFile,
) -> anyhow::Result<()> {
    // Resolve the index path: CLI flag > env var > config file > default
    let index_path = index
        .or_else(|| std::env::var("LTWA_INDEX_PATH").ok().map(PathBuf::from))
        .or_else(|| config.index_path())
        .or_else(config_file::default_index_path)
        .ok_or_else(|| anyhow::anyhow!("Could not determine an LTWA index path; pass --index"))?;

    let color = ColorMode(!no_color && config.color().unwrap_or(true));

    if !index_path.exists() {
        output::print_warning(
            &mut std::io::stderr(),
            &format!(
                "No LTWA index at {}. Build it with: ltwa update-index {}",
                index_path.display(),
                index_path.display()
            ),
            color,
        )?;
    }
    let abbreviator = Abbreviator::open(&index_path);

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();

    if titles.is_empty() {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let title = line.trim();
            if title.is_empty() {
                continue;
            }
            let result = abbreviator.abbreviate(title);
            output::print_result(&mut writer, title, result.as_deref(), color)?;
        }
    } else {
        for title in &titles {
            let result = abbreviator.abbreviate(title);
            output::print_result(&mut writer, title, result.as_deref(), color)?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn build_index(db_path: &Path, csv_path: &Path) -> anyhow::Result<()> {
    if !csv_path.exists() {
        anyhow::bail!("LTWA CSV not found at {}", csv_path.display());
    }
    ensure_parent_dir(db_path)?;

    let bars = BuildBars::new(&csv_path.display().to_string());
    ltwa_index::build_index_from_file(db_path, csv_path, |event| bars.handle(event))?;

    let canonical = std::fs::canonicalize(db_path).unwrap_or_else(|_| db_path.to_path_buf());
    println!("LTWA index saved to: {}", canonical.display());
    Ok(())
}

async fn update_index(db_path: &Path, url: Option<String>, config: &ConfigFile) -> anyhow::Result<()> {
    let url = url
        .or_else(|| config.source_url().map(String::from))
        .unwrap_or_else(|| ltwa_index::DEFAULT_LTWA_URL.to_string());
    ensure_parent_dir(db_path)?;

    let bars = BuildBars::new("Connecting...");
    let updated = ltwa_index::build_index(db_path, &url, |event| bars.handle(event)).await?;

    let canonical = std::fs::canonicalize(db_path).unwrap_or_else(|_| db_path.to_path_buf());
    if !updated {
        println!("LTWA index is already up to date: {}", canonical.display());
    } else {
        println!("LTWA index saved to: {}", canonical.display());
    }
    Ok(())
}

fn info(db_path: &Path, config: &ConfigFile) -> anyhow::Result<()> {
    if !db_path.exists() {
        anyhow::bail!(
            "LTWA index not found at {}. Build it with: ltwa update-index {}",
            db_path.display(),
            db_path.display()
        );
    }
    let index = LtwaIndex::open(db_path)?;
    let info = index.info()?;
    let staleness = index.check_staleness(STALE_AFTER_DAYS)?;

    let color = ColorMode(config.color().unwrap_or(true));
    output::print_info(&mut std::io::stdout(), index.path(), &info, &staleness, color)?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Download and parse progress bars for the index builders.
struct BuildBars {
    dl_bar: ProgressBar,
    parse_bar: ProgressBar,
    dl_bar_style: ProgressStyle,
    parse_start: std::cell::Cell<Option<Instant>>,
}

impl BuildBars {
    fn new(initial_message: &str) -> Self {
        let multi = MultiProgress::new();

        let dl_bar_style = ProgressStyle::with_template(
            "{spinner:.cyan} {msg} [{bar:40.cyan/dim}] {bytes}/{total_bytes} ({bytes_per_sec}, eta {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        let dl_unknown_style =
            ProgressStyle::with_template("{spinner:.cyan} {msg} {bytes} ({bytes_per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let parse_spinner_style = ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let dl_bar = multi.add(ProgressBar::new(0));
        dl_bar.set_style(dl_unknown_style);
        dl_bar.set_message(initial_message.to_string());
        dl_bar.enable_steady_tick(Duration::from_millis(120));

        let parse_bar = multi.add(ProgressBar::new(0));
        parse_bar.set_style(parse_spinner_style);
        parse_bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            dl_bar,
            parse_bar,
            dl_bar_style,
            parse_start: std::cell::Cell::new(None),
        }
    }

    fn finish_download(&self) {
        if !self.dl_bar.is_finished() {
            self.dl_bar.finish_with_message(format!(
                "Read {} in {:.0?}",
                HumanBytes(self.dl_bar.position()),
                self.dl_bar.elapsed()
            ));
        }
    }

    fn handle(&self, event: BuildProgress) {
        match event {
            BuildProgress::Downloading {
                bytes_downloaded,
                total_bytes,
            } => {
                if let Some(total) = total_bytes
                    && self.dl_bar.length() == Some(0)
                {
                    self.dl_bar.set_length(total);
                    self.dl_bar.set_style(self.dl_bar_style.clone());
                }
                self.dl_bar.set_position(bytes_downloaded);
                self.dl_bar.set_message("ltwa.csv");
            }
            BuildProgress::Parsing {
                rows_read,
                rules_inserted,
                rows_skipped,
            } => {
                self.finish_download();
                if self.parse_start.get().is_none() {
                    self.parse_start.set(Some(Instant::now()));
                }
                self.parse_bar.set_message(format!(
                    "{} rows read, {} rules inserted, {} skipped",
                    HumanCount(rows_read),
                    HumanCount(rules_inserted),
                    HumanCount(rows_skipped),
                ));
            }
            BuildProgress::Complete {
                prefixes,
                suffixes,
                skipped,
            } => {
                self.finish_download();
                let total_elapsed = self
                    .parse_start
                    .get()
                    .map(|s| format!(" in {:.0?}", s.elapsed()))
                    .unwrap_or_default();
                if skipped {
                    self.parse_bar
                        .finish_with_message("Index is already up to date (304 Not Modified)");
                } else {
                    self.parse_bar.finish_with_message(format!(
                        "Indexed {} prefix rules, {} suffix rules{}",
                        HumanCount(prefixes),
                        HumanCount(suffixes),
                        total_elapsed
                    ));
                }
            }
        }
    }
}
