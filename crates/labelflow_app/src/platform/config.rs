//! Application configuration: `labelflow.ron` merged with command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use labelflow_core::PollPolicy;
use labelflow_engine::{ClientSettings, EngineConfig};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const DEFAULT_CONFIG_FILE: &str = "labelflow.ron";
const PREFERENCES_FILE: &str = "preferences.ron";
const APP_DIR: &str = "labelflow";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub poll_interval_ms: u64,
    /// 0 disables the limit.
    pub max_poll_secs: u64,
    /// 0 disables the limit.
    pub max_poll_failures: u32,
    pub connect_timeout_secs: u64,
    pub status_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub max_download_mb: u64,
    pub log: String,
    pub log_file: PathBuf,
    /// Defaults to the per-user config directory.
    pub preferences_file: Option<PathBuf>,
    pub color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let poll = PollPolicy::default();
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            output_dir: PathBuf::from("output"),
            poll_interval_ms: poll.interval.as_millis() as u64,
            max_poll_secs: poll.max_duration.map_or(0, |d| d.as_secs()),
            max_poll_failures: poll.max_consecutive_failures.unwrap_or(0),
            connect_timeout_secs: client.connect_timeout.as_secs(),
            status_timeout_secs: client.status_timeout.as_secs(),
            read_timeout_secs: client.read_timeout.as_secs(),
            max_download_mb: client.max_download_bytes / (1024 * 1024),
            log: "file".to_string(),
            log_file: PathBuf::from(flow_logging::DEFAULT_LOG_FILE),
            preferences_file: None,
            color: true,
        }
    }
}

impl AppConfig {
    /// Reads `path` when it exists; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        ron::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Loads the configured file and applies command-line overrides on top.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::load(&path)?;
        config.apply_overrides(cli);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(ms) = cli.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
        if let Some(secs) = cli.max_poll_secs {
            self.max_poll_secs = secs;
        }
        if let Some(failures) = cli.max_poll_failures {
            self.max_poll_failures = failures;
        }
        if let Some(log) = &cli.log {
            self.log = log.clone();
        }
        if cli.no_color {
            self.color = false;
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            max_duration: (self.max_poll_secs > 0).then(|| Duration::from_secs(self.max_poll_secs)),
            max_consecutive_failures: (self.max_poll_failures > 0).then_some(self.max_poll_failures),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            client: ClientSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                status_timeout: Duration::from_secs(self.status_timeout_secs),
                read_timeout: Duration::from_secs(self.read_timeout_secs),
                max_download_bytes: self.max_download_mb.saturating_mul(1024 * 1024),
            },
            output_dir: self.output_dir.clone(),
        }
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_file
            .clone()
            .unwrap_or_else(default_preferences_path)
    }
}

fn default_preferences_path() -> PathBuf {
    preferences_path_under(dirs::config_dir(), dirs::home_dir())
}

/// Platform config dir, then `~/.config`, then `./.labelflow` as a last resort.
fn preferences_path_under(config_dir: Option<PathBuf>, home_dir: Option<PathBuf>) -> PathBuf {
    let base = config_dir
        .or_else(|| home_dir.map(|home| home.join(".config")))
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".labelflow"));
    base.join(PREFERENCES_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("labelflow.ron");
        fs::write(
            &path,
            r#"(base_url: "http://gpu-box:8000", max_poll_secs: 0, max_poll_failures: 5)"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "http://gpu-box:8000");
        assert_eq!(config.poll_interval_ms, 2000);
        let policy = config.poll_policy();
        assert_eq!(policy.max_duration, None);
        assert_eq!(policy.max_consecutive_failures, Some(5));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("labelflow.ron");
        fs::write(&path, "(base_url: ").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn command_line_overrides_file() {
        let cli = Cli::parse_from([
            "labelflow",
            "--base-url",
            "http://10.0.0.5:9000",
            "--poll-interval-ms",
            "500",
            "--no-color",
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(&cli);

        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.poll_policy().interval, Duration::from_millis(500));
        assert!(!config.color);
        assert_eq!(config.engine_config().client.base_url, "http://10.0.0.5:9000");
    }

    #[test]
    fn preferences_live_in_the_platform_config_dir() {
        assert_eq!(
            preferences_path_under(Some(PathBuf::from("/cfg")), Some(PathBuf::from("/home/u"))),
            PathBuf::from("/cfg/labelflow/preferences.ron")
        );
        assert_eq!(
            preferences_path_under(None, Some(PathBuf::from("/home/u"))),
            PathBuf::from("/home/u/.config/labelflow/preferences.ron")
        );
        assert_eq!(
            preferences_path_under(None, None),
            PathBuf::from(".labelflow/preferences.ron")
        );
    }

    #[test]
    fn default_preferences_path_is_absolute_when_a_config_dir_exists() {
        let config = AppConfig::default();
        if dirs::config_dir().is_some() {
            assert!(config.preferences_path().is_absolute());
        }
        assert!(config.preferences_path().ends_with("labelflow/preferences.ron"));
    }
}
