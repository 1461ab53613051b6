//! Settings for the NeuroMark core.
//!
//! [`SettingsEngine`] keeps an [`AppSettings`] document in `settings.json`
//! under the platform config directory. Individual values are addressed with
//! dot paths such as `cloud.supabase_url`. A few values can also come from
//! the environment; those overrides are applied by [`SettingsEngine::effective`]
//! and are never written back.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

pub const ENV_DATA_DIR: &str = "NEUROMARK_DATA_DIR";
pub const ENV_SUPABASE_URL: &str = "NEUROMARK_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "NEUROMARK_SUPABASE_ANON_KEY";
pub const ENV_AI_API_KEY: &str = "NEUROMARK_AI_API_KEY";
/// Older name for the AI key, still honoured when the prefixed one is unset.
pub const ENV_AI_API_KEY_LEGACY: &str = "API_KEY";

pub const SETTINGS_FILE: &str = "settings.json";
/// File name of the library database inside the data directory.
pub const DATABASE_FILE: &str = "neuromark.db";

pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    /// Replaces the value at a dot path and persists the result.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Applies environment overrides read through `lookup`. Empty values are
/// treated as unset.
pub fn apply_env_overrides<F>(settings: &mut AppSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(dir) = get(ENV_DATA_DIR) {
        settings.storage.data_dir = Some(dir);
    }
    if let Some(url) = get(ENV_SUPABASE_URL) {
        settings.cloud.supabase_url = Some(url);
    }
    if let Some(key) = get(ENV_SUPABASE_ANON_KEY) {
        settings.cloud.anon_key = Some(key);
    }
    if let Some(key) = get(ENV_AI_API_KEY).or_else(|| get(ENV_AI_API_KEY_LEGACY)) {
        settings.ai.api_key = Some(key);
    }
}

/// Location of the library database for the given settings.
pub fn database_path(settings: &AppSettings) -> PathBuf {
    let dir = match &settings.storage.data_dir {
        Some(dir) => PathBuf::from(dir),
        None => platform::get_data_dir(),
    };
    dir.join(DATABASE_FILE)
}

/// Turns `a.b.c` into the JSON pointer `/a/b/c`. Empty segments and
/// pointer metacharacters are rejected.
fn key_to_pointer(key: &str) -> Result<String, SettingsError> {
    if key.is_empty() {
        return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
    }
    let mut pointer = String::with_capacity(key.len() + 1);
    for segment in key.split('.') {
        if segment.is_empty() || segment.contains(['/', '~']) {
            return Err(SettingsError::InvalidKey(format!("Malformed key '{}'", key)));
        }
        pointer.push('/');
        pointer.push_str(segment);
    }
    Ok(pointer)
}

fn serialization_error(context: &str, e: serde_json::Error) -> SettingsError {
    SettingsError::SerializationError(format!("{}: {}", context, e))
}

pub struct SettingsEngine {
    config_path: String,
    settings: AppSettings,
}

impl SettingsEngine {
    /// `path_override` replaces `<config dir>/settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join(SETTINGS_FILE)
                .to_string_lossy()
                .into_owned()
        });
        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }

    /// The stored settings with environment overrides applied.
    pub fn effective(&self) -> AppSettings {
        let mut settings = self.settings.clone();
        apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
        settings
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// A missing file yields defaults; an unreadable one is an error and
    /// leaves the current settings in place.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        self.settings = match fs::read_to_string(&self.config_path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| serialization_error("Malformed settings file", e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => AppSettings::default(),
            Err(e) => {
                return Err(SettingsError::IoError(format!(
                    "Cannot read {}: {}",
                    self.config_path, e
                )))
            }
        };
        Ok(self.settings.clone())
    }

    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash never leaves a truncated settings file.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);
        let io_error = |what: &str, e: std::io::Error| {
            SettingsError::IoError(format!("Cannot {} {}: {}", what, path.display(), e))
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error("create the directory for", e))?;
        }
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| serialization_error("Cannot encode settings", e))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| io_error("write", e))?;
        fs::rename(&tmp, path).map_err(|e| io_error("replace", e))
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// The whole document is decoded again after the edit, so a value of the
    /// wrong type is an `InvalidValue` and nothing is written.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let pointer = key_to_pointer(key)?;
        let mut doc = serde_json::to_value(&self.settings)
            .map_err(|e| serialization_error("Cannot encode settings", e))?;

        let slot = doc
            .pointer_mut(&pointer)
            .ok_or_else(|| SettingsError::InvalidKey(format!("Unknown settings key '{}'", key)))?;
        *slot = value;

        self.settings = serde_json::from_value(doc)
            .map_err(|e| SettingsError::InvalidValue(format!("{}: {}", key, e)))?;
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
