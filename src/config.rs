//! Configuration management for scanwise
//!
//! Stores settings in ~/.config/scanwise/config.json

use crate::engine::{ChartValue, EnginePolicy, DEFAULT_CHART_THRESHOLD};
use crate::schema::UserProfile;
use crate::ui::MotionSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub profile: UserProfile,
    /// A RISK result with at least this many items gets an overview chart
    pub chart_threshold: usize,
    pub chart_value: ChartValue,
    /// Entrance delay between siblings
    pub stagger_ms: u64,
    pub exit_ms: u64,
    /// Characters per chunk when replaying a document
    pub stream_chunk_chars: usize,
    pub stream_delay_ms: u64,
    /// Where log files go (defaults under the local data dir)
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: UserProfile::default(),
            chart_threshold: DEFAULT_CHART_THRESHOLD,
            chart_value: ChartValue::default(),
            stagger_ms: 60,
            exit_ms: 220,
            stream_chunk_chars: 12,
            stream_delay_ms: 40,
            log_dir: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("scanwise"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`. A missing file gives defaults; a corrupt one is moved
    /// aside to `config.json.corrupt` and defaults are used.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "config file was corrupted; a backup was saved and defaults were loaded"
                );
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("Could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        write_config_atomic(path, &content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    pub fn engine_policy(&self) -> EnginePolicy {
        EnginePolicy {
            chart_threshold: self.chart_threshold,
            chart_value: self.chart_value,
        }
    }

    pub fn motion(&self) -> MotionSettings {
        MotionSettings {
            stagger: Duration::from_millis(self.stagger_ms),
            exit: Duration::from_millis(self.exit_ms),
            ..MotionSettings::default()
        }
    }

    pub fn stream_delay(&self) -> Duration {
        Duration::from_millis(self.stream_delay_ms)
    }

    /// Log directory, falling back to `<data_local_dir>/scanwise/logs`.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("scanwise")
                .join("logs")
        })
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}

fn write_config_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
            tracing::warn!(error = %e, "failed to set temp config file permissions");
        }
    }

    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    drop(file);

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.profile, UserProfile::Diabetic);
        assert_eq!(config.chart_threshold, 10);
        assert_eq!(config.chart_value, ChartValue::Uniform);
        assert_eq!(config.engine_policy(), EnginePolicy::default());
        assert_eq!(config.motion().stagger, Duration::from_millis(60));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            profile: UserProfile::Paleo,
            chart_threshold: 4,
            chart_value: ChartValue::Weighted,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"chart_threshold": 3}"#).unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.chart_threshold, 3);
        assert_eq!(config.stagger_ms, 60);
    }

    #[test]
    fn test_corrupt_file_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config, Config::default());
        assert!(!path.exists());
        let backup = fs::read_to_string(dir.path().join("config.json.corrupt")).unwrap();
        assert_eq!(backup, "{ not json");
    }
}
