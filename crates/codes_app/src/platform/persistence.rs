use std::path::{Path, PathBuf};

use codes_core::Settings;
use codes_engine::{ensure_state_dir, AtomicFileWriter};
use codes_logging::{codes_error, codes_info, codes_warn};
use serde::{Deserialize, Serialize};

const SETTINGS_FILENAME: &str = ".codes_settings.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct PersistedSettings {
    endpoint_url: String,
    delete_url: String,
    dark_mode: Option<bool>,
    auto_refresh_secs: u32,
}

impl From<PersistedSettings> for Settings {
    fn from(persisted: PersistedSettings) -> Self {
        Settings {
            endpoint_url: persisted.endpoint_url.trim().to_string(),
            delete_url: persisted.delete_url.trim().to_string(),
            dark_mode: persisted.dark_mode,
            auto_refresh_secs: persisted.auto_refresh_secs,
        }
    }
}

impl From<&Settings> for PersistedSettings {
    fn from(settings: &Settings) -> Self {
        PersistedSettings {
            endpoint_url: settings.endpoint_url.clone(),
            delete_url: settings.delete_url.clone(),
            dark_mode: settings.dark_mode,
            auto_refresh_secs: settings.auto_refresh_secs,
        }
    }
}

/// Missing or unreadable settings fall back to defaults.
pub(crate) fn load_settings(state_dir: &Path) -> Settings {
    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    let content = match writer.read(SETTINGS_FILENAME) {
        Ok(Some(text)) => text,
        Ok(None) => return Settings::default(),
        Err(err) => {
            codes_warn!("Failed to read settings from {:?}: {}", state_dir, err);
            return Settings::default();
        }
    };

    match ron::from_str::<PersistedSettings>(&content) {
        Ok(persisted) => {
            codes_info!("Loaded settings from {:?}", state_dir.join(SETTINGS_FILENAME));
            persisted.into()
        }
        Err(err) => {
            codes_warn!("Failed to parse settings in {:?}: {}", state_dir, err);
            Settings::default()
        }
    }
}

pub(crate) fn save_settings(state_dir: &Path, settings: &Settings) {
    if let Err(err) = ensure_state_dir(state_dir) {
        codes_error!("Failed to ensure state dir {:?}: {}", state_dir, err);
        return;
    }

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&PersistedSettings::from(settings), pretty) {
        Ok(text) => text,
        Err(err) => {
            codes_error!("Failed to serialize settings: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    if let Err(err) = writer.write(SETTINGS_FILENAME, &content) {
        codes_error!("Failed to write settings to {:?}: {}", state_dir, err);
    }
}
