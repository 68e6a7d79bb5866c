// Markstash Settings Engine
// Loads and saves the client configuration (API base URL, storage key, landing route, data dir).
// Settings are stored as a JSON file at the platform-specific config path, and a couple of
// environment variables override the file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::ClientSettings;

/// Overrides `api_base_url`.
pub const ENV_API_URL: &str = "MARKSTASH_API_URL";
/// Overrides `data_dir`.
pub const ENV_DATA_DIR: &str = "MARKSTASH_DATA_DIR";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<ClientSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &ClientSettings;
    fn update(&mut self, settings: ClientSettings) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: ClientSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses `settings.json` in the platform config directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string(),
        };

        Self {
            config_path,
            settings: ClientSettings::default(),
        }
    }

    /// Applies environment overrides on top of `settings`.
    pub fn apply_env_overrides(settings: &mut ClientSettings) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                settings.api_base_url = url;
            }
        }
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                settings.data_dir = Some(dir);
            }
        }
    }

    /// Directory the state database lives in.
    pub fn data_dir(&self) -> PathBuf {
        match &self.settings.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => platform::get_data_dir(),
        }
    }

    fn validate(settings: &ClientSettings) -> Result<(), SettingsError> {
        let url = settings.api_base_url.as_str();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SettingsError::InvalidValue(format!(
                "api_base_url must start with http:// or https://: {}",
                url
            )));
        }
        if settings.storage_key.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "storage_key cannot be empty".to_string(),
            ));
        }
        if settings.request_timeout_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file, then applies environment overrides.
    ///
    /// A missing file yields defaults; a malformed one is a serialization error.
    fn load(&mut self) -> Result<ClientSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        let mut settings = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                SettingsError::IoError(format!("Failed to read config file: {}", e))
            })?;
            serde_json::from_str(&content).map_err(|e| {
                SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
            })?
        } else {
            ClientSettings::default()
        };

        Self::apply_env_overrides(&mut settings);
        Self::validate(&settings)?;
        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Replaces the settings after validating them and saves to disk.
    fn update(&mut self, settings: ClientSettings) -> Result<(), SettingsError> {
        Self::validate(&settings)?;
        self.settings = settings;
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
