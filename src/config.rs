use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigWeekStart {
    #[default]
    Monday,
    Sunday,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SourceConfig {
    /// Command line that prints the session list as JSON
    #[serde(default)]
    pub(crate) command: Option<Vec<String>>,
    /// HTTP endpoint returning the session list
    #[serde(default)]
    pub(crate) url: Option<String>,
    /// Saved session list (mostly for testing and replay)
    #[serde(default)]
    pub(crate) file: Option<PathBuf>,
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) data_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) lock_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) lock_timeout_secs: Option<f64>,
    #[serde(default)]
    pub(crate) pricing_file: Option<PathBuf>,
    #[serde(default)]
    pub(crate) week_start: Option<ConfigWeekStart>,
    #[serde(default)]
    pub(crate) no_color: bool,
    #[serde(default)]
    pub(crate) source: SourceConfig,
}

impl Config {
    /// Load from an explicit path; a missing or invalid file is an error
    pub(crate) fn load_from(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = toml::from_str::<Config>(&content)
            .map_err(|e| AppError::Config(format!("cannot parse {}: {e}", path.display())))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Search the default locations; unreadable files are skipped with a warning
    pub(crate) fn load() -> Self {
        // Try config locations in order of priority
        for path in Self::get_config_paths() {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        debug!("Loaded config from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::default()
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/sessionstats/config.toml (Linux/cross-platform)
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("sessionstats").join("config.toml"));
        }

        // 2. macOS Application Support: ~/Library/Application Support/sessionstats/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            let macos_path = config_dir.join("sessionstats").join("config.toml");
            if !paths.contains(&macos_path) {
                paths.push(macos_path);
            }
        }

        // 3. Home directory: ~/.sessionstats.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".sessionstats.toml"));
        }

        paths
    }
}

/// Default snapshot directory: `<data dir>/sessionstats/snapshots`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .unwrap_or_else(std::env::temp_dir)
        .join("sessionstats")
        .join("snapshots")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        let paths = Config::get_config_paths();
        assert!(paths.iter().all(|p| p.to_string_lossy().contains("sessionstats")));
    }

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
data_dir = "/var/lib/sessionstats"
lock_timeout_secs = 2.5
week_start = "sunday"

[source]
command = ["openclaw", "sessions", "--json"]
timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/sessionstats")));
        assert_eq!(config.lock_timeout_secs, Some(2.5));
        assert_eq!(config.week_start, Some(ConfigWeekStart::Sunday));
        assert_eq!(
            config.source.command.as_deref(),
            Some(&["openclaw".to_string(), "sessions".to_string(), "--json".to_string()][..])
        );
    }

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.data_dir.is_none());
        assert!(config.source.url.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("data_directory = \"x\"").is_err());
    }

    #[test]
    fn load_from_missing_file_is_config_error() {
        let err = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn default_data_dir_ends_with_snapshots() {
        assert!(default_data_dir().ends_with("sessionstats/snapshots"));
    }
}
