use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub index: Option<IndexConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// SQLite index built by `ltwa build-index` / `ltwa update-index`.
    pub path: Option<String>,
    /// CSV export to download on update.
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub color: Option<bool>,
}

impl ConfigFile {
    pub fn index_path(&self) -> Option<PathBuf> {
        self.index
            .as_ref()
            .and_then(|i| i.path.as_deref())
            .map(PathBuf::from)
    }

    pub fn source_url(&self) -> Option<&str> {
        self.index.as_ref().and_then(|i| i.source_url.as_deref())
    }

    pub fn color(&self) -> Option<bool> {
        self.display.as_ref().and_then(|d| d.color)
    }
}

/// Platform config directory path: `<config_dir>/ltwa/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ltwa").join("config.toml"))
}

/// Default index location: `<data_dir>/ltwa/ltwa.db`.
pub fn default_index_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("ltwa").join("ltwa.db"))
}

/// Load config by cascading CWD `.ltwa.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".ltwa.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        index: Some(IndexConfig {
            path: overlay
                .index
                .as_ref()
                .and_then(|i| i.path.clone())
                .or_else(|| base.index.as_ref().and_then(|i| i.path.clone())),
            source_url: overlay
                .index
                .as_ref()
                .and_then(|i| i.source_url.clone())
                .or_else(|| base.index.as_ref().and_then(|i| i.source_url.clone())),
        }),
        display: Some(DisplayConfig {
            color: overlay
                .display
                .as_ref()
                .and_then(|d| d.color)
                .or_else(|| base.display.as_ref().and_then(|d| d.color)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_path_round_trip_toml() {
        let config = ConfigFile {
            index: Some(IndexConfig {
                path: Some("/tmp/ltwa.db".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.index_path(), Some(PathBuf::from("/tmp/ltwa.db")));
    }

    #[test]
    fn absent_fields_deserialize_as_none() {
        let toml_str = "[display]\ncolor = false\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert!(parsed.index.is_none());
        assert_eq!(parsed.color(), Some(false));
        assert!(parsed.source_url().is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            index: Some(IndexConfig {
                path: Some("/base/ltwa.db".to_string()),
                source_url: Some("https://example.org/base.csv".to_string()),
            }),
            display: Some(DisplayConfig { color: Some(true) }),
        };
        let overlay = ConfigFile {
            index: Some(IndexConfig {
                path: Some("/overlay/ltwa.db".to_string()),
                ..Default::default()
            }),
            display: Some(DisplayConfig { color: Some(false) }),
        };
        let merged = merge(base, overlay);
        assert_eq!(merged.index_path(), Some(PathBuf::from("/overlay/ltwa.db")));
        assert_eq!(merged.source_url(), Some("https://example.org/base.csv"));
        assert_eq!(merged.color(), Some(false));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            index: Some(IndexConfig {
                path: Some("/base/ltwa.db".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.index_path(), Some(PathBuf::from("/base/ltwa.db")));
        assert!(merged.color().is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[index]\npath = \"/data/ltwa.db\"\n\n[display]\ncolor = false\n")
            .unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded.index_path(), Some(PathBuf::from("/data/ltwa.db")));
        assert_eq!(loaded.color(), Some(false));
    }

    #[test]
    fn unparsable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[index\npath = ").unwrap();
        assert!(load_from_path(&path).is_none());
        assert!(load_from_path(&dir.path().join("missing.toml")).is_none());
    }
}
