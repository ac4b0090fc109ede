use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "BlogDesk";
const SETTINGS_FILENAME: &str = "settings.json";
const DATA_DIR_ENV: &str = "BLOGDESK_DATA_DIR";

/// Application settings, stored as `settings.json` in the data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub log_filter: String,
    pub file_logging: bool,
    /// Upper bound on re-rolls when picking a different icon color
    pub color_retry_limit: u32,
    pub name_fetch_timeout_secs: u64,
    /// Never touch the OS keychain, even when one is available
    pub disable_keychain: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_filter: "blogdesk_lib=debug".to_string(),
            file_logging: false,
            color_retry_limit: 32,
            name_fetch_timeout_secs: 15,
            disable_keychain: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

fn data_dir_override() -> Option<PathBuf> {
    let value = std::env::var(DATA_DIR_ENV).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

impl Settings {
    /// Settings from the default location, honouring `BLOGDESK_DATA_DIR`
    pub fn load() -> Self {
        let data_dir = data_dir_override().unwrap_or_else(default_data_dir);
        Self::load_from(&data_dir)
    }

    /// Settings from `data_dir`, falling back to defaults when missing or unreadable
    pub fn load_from(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILENAME);
        let mut settings = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<Settings>(&contents).unwrap_or_else(|err| {
                tracing::warn!("Ignoring invalid settings at {}: {}", path.display(), err);
                Settings::default()
            }),
            Err(_) => Settings::default(),
        };
        settings.data_dir = data_dir.to_path_buf();
        settings
    }

    pub fn save(&self) -> anyhow::Result<()> {
        use anyhow::Context;

        fs::create_dir_all(&self.data_dir).context("Failed to create data directory")?;
        let payload = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(self.data_dir.join(SETTINGS_FILENAME), payload)
            .context("Failed to write settings")?;
        Ok(())
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("blogdesk-debug.log")
    }
}
