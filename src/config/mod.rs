// Configuration management for TuneDeck
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "tunedeck";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library_dir: PathBuf,
    pub playlist_dir: PathBuf,
    pub log_dir: PathBuf,
    pub audio: AudioSettings,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub volume: f32,
    pub end_poll_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_ms: u64,
    pub status_ms: u64,
    pub download_notice_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let app_config_dir = config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        let app_data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            library_dir: dirs::audio_dir().unwrap_or_else(|| PathBuf::from("music")),
            playlist_dir: app_config_dir.join("playlists"),
            log_dir: app_data_dir.join("logs"),
            audio: AudioSettings::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 0.7,
            end_poll_ms: 500,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            status_ms: 3000,
            download_notice_ms: 3000,
        }
    }
}

impl UiConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }

    pub fn status_lifetime(&self) -> Duration {
        Duration::from_millis(self.status_ms)
    }

    pub fn download_notice(&self) -> Duration {
        Duration::from_millis(self.download_notice_ms)
    }
}

impl Config {
    /// Load from the default location, writing defaults there on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join(APP_DIR);

        Ok(dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.audio.end_poll_ms, 500);
        assert_eq!(config.ui.download_notice(), Duration::from_secs(3));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "library_dir = \"/srv/music\"\n[audio]\nvolume = 0.3\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.library_dir, PathBuf::from("/srv/music"));
        assert!((config.audio.volume - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.audio.end_poll_ms, 500);
        assert_eq!(config.ui.status_ms, 3000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "library_dir = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
