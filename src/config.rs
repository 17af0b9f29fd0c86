// SPDX-License-Identifier: GPL-3.0-only

//! Booth configuration, persisted as `settings.toml` in the user config directory

use crate::constants::{app_info, download, prompt, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the generation server (`/api/generate`, `/api/health`)
    pub server_url: String,
    /// Graduate display name used in prompts and download file names
    pub display_name: Option<String>,
    /// Selected track/program name
    pub track: Option<String>,
    /// Prompt template with `{track}` and `{name}` placeholders
    pub prompt_template: String,
    /// Substituted for `{track}` when no track is selected
    pub default_track_phrase: String,
    /// Download file name prefix
    pub filename_prefix: String,
    /// Folder under the picture directory where downloads land
    pub save_folder_name: String,
    /// Explicit output directory, overrides `save_folder_name`
    pub output_dir: Option<PathBuf>,
    /// Camera device path (e.g. `/dev/video2`); front-facing camera is preferred otherwise
    pub camera_device: Option<String>,
    /// Countdown length before capture
    pub countdown_seconds: u32,
    /// Notification display time
    pub notification_seconds: u64,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Play the confetti bursts when a result arrives
    pub celebrations: bool,
    /// Optional request timeout for generation calls; none by default
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            display_name: None,
            track: None,
            prompt_template: prompt::DEFAULT_TEMPLATE.to_string(),
            default_track_phrase: prompt::DEFAULT_TRACK_PHRASE.to_string(),
            filename_prefix: download::DEFAULT_PREFIX.to_string(),
            save_folder_name: download::DEFAULT_SAVE_FOLDER.to_string(),
            output_dir: None,
            camera_device: None,
            countdown_seconds: timing::COUNTDOWN_SECONDS,
            notification_seconds: timing::NOTIFICATION_DURATION.as_secs(),
            mirror_preview: true,
            celebrations: true,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Display name with the guest fallback applied
    pub fn display_name_or_default(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(prompt::DEFAULT_DISPLAY_NAME)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_secs(self.notification_seconds)
    }

    /// Directory downloads are written to
    pub fn download_directory(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        dirs::picture_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join(&self.save_folder_name)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|path| path.join(app_info::APP_DIR).join(CONFIG_FILE))
}

/// Load the config from the default location, defaults if absent
pub fn load() -> AppResult<Config> {
    if let Some(path) = get_default_config_path()
        && path.exists()
    {
        return load_from_path(&path);
    }
    Ok(Config::default())
}

/// Save to the default location and return where it was written
pub fn save(config: &Config) -> AppResult<PathBuf> {
    let path = get_default_config_path()
        .ok_or_else(|| AppError::Config("no user config directory".to_string()))?;
    save_to_path(config, &path)?;
    info!(path = %path.display(), "Saved configuration");
    Ok(path)
}

/// Load from an explicit path; unparsable files fall back to defaults
pub fn load_from_path(path: &Path) -> AppResult<Config> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => {
            debug!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invalid configuration, using defaults");
            Ok(Config::default())
        }
    }
}

pub fn save_to_path(config: &Config, path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config(e.to_string()))?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_fields() {
        let config = Config {
            display_name: Some("José".to_string()),
            track: Some("Nutrition".to_string()),
            countdown_seconds: 5,
            ..Config::default()
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &path).expect("failed to save config");
        let loaded = load_from_path(&path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn invalid_toml_falls_back_to_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "not = valid = toml").expect("failed to write");

        let loaded = load_from_path(&path).expect("load should not error");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "server_url = \"http://booth:8080\"\n").expect("failed to write");

        let loaded = load_from_path(&path).expect("load should not error");
        assert_eq!(loaded.server_url, "http://booth:8080");
        assert_eq!(loaded.countdown_seconds, 3);
        assert!(loaded.mirror_preview);
    }

    #[test]
    fn blank_display_name_uses_guest() {
        let config = Config {
            display_name: Some("   ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.display_name_or_default(), "Guest");
    }
}
