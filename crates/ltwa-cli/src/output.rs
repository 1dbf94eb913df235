use std::io::Write;
use std::path::Path;

use ltwa_index::{IndexInfo, StalenessCheck};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print one `title → abbreviation` line.
pub fn print_result(
    w: &mut dyn Write,
    title: &str,
    abbreviation: Option<&str>,
    color: ColorMode,
) -> std::io::Result<()> {
    match abbreviation {
        Some(abbreviation) => {
            if color.enabled() {
                writeln!(w, "{} → {}", title, abbreviation.green())
            } else {
                writeln!(w, "{} → {}", title, abbreviation)
            }
        }
        None => {
            if color.enabled() {
                writeln!(w, "{} → {}", title, "(no result)".dimmed())
            } else {
                writeln!(w, "{} → (no result)", title)
            }
        }
    }
}

pub fn print_warning(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "WARNING:".yellow(), message)
    } else {
        writeln!(w, "WARNING: {}", message)
    }
}

/// Print index metadata as `key: value` lines.
pub fn print_info(
    w: &mut dyn Write,
    path: &Path,
    info: &IndexInfo,
    staleness: &StalenessCheck,
    color: ColorMode,
) -> std::io::Result<()> {
    let unknown = "unknown";
    let built = match staleness.age_days {
        Some(0) => "today".to_string(),
        Some(1) => "1 day ago".to_string(),
        Some(days) => format!("{} days ago", days),
        None => unknown.to_string(),
    };

    let rows = [
        ("Path", path.display().to_string()),
        ("Source", info.source.clone().unwrap_or_else(|| unknown.to_string())),
        ("Built", built),
        (
            "Prefix rules",
            info.prefix_count.clone().unwrap_or_else(|| "0".to_string()),
        ),
        (
            "Suffix rules",
            info.suffix_count.clone().unwrap_or_else(|| "0".to_string()),
        ),
        (
            "Schema version",
            info.schema_version.clone().unwrap_or_else(|| unknown.to_string()),
        ),
    ];

    for (label, value) in rows {
        if color.enabled() {
            writeln!(w, "{:>15} {}", format!("{}:", label).bold(), value)?;
        } else {
            writeln!(w, "{:>15} {}", format!("{}:", label), value)?;
        }
    }
    if let Some(etag) = &info.etag {
        writeln!(w, "{:>15} {}", "ETag:", etag)?;
    }

    if staleness.is_stale {
        writeln!(w)?;
        print_warning(
            w,
            &format!(
                "Index may be stale. Consider running: ltwa update-index {}",
                path.display()
            ),
            color,
        )?;
    }
    Ok(())
}
