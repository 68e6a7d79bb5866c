// Markstash platform paths
// Config and data directories for Windows, macOS, and Linux, selected with `cfg(target_os)`.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "markstash";

#[cfg(any(target_os = "macos", target_os = "windows"))]
const APP_DIR_TITLE: &str = "Markstash";

fn home_dir() -> PathBuf {
    let var = if cfg!(target_os = "windows") { "USERPROFILE" } else { "HOME" };
    PathBuf::from(env::var(var).unwrap_or_else(|_| env::temp_dir().to_string_lossy().to_string()))
}

/// Returns the configuration directory for Markstash.
///
/// - **Linux**: `$XDG_CONFIG_HOME/markstash` or `~/.config/markstash`
/// - **macOS**: `~/Library/Application Support/Markstash`
/// - **Windows**: `%APPDATA%/Markstash`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join(APP_DIR_TITLE)
    }
    #[cfg(target_os = "windows")]
    {
        match env::var("APPDATA") {
            Ok(appdata) => PathBuf::from(appdata).join(APP_DIR_TITLE),
            Err(_) => home_dir().join("AppData").join("Roaming").join(APP_DIR_TITLE),
        }
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        match env::var("XDG_CONFIG_HOME") {
            Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
            _ => home_dir().join(".config").join(APP_DIR),
        }
    }
}

/// Returns the data directory for Markstash.
///
/// - **Linux**: `$XDG_DATA_HOME/markstash` or `~/.local/share/markstash`
/// - **macOS** and **Windows**: same as the config directory
pub fn get_data_dir() -> PathBuf {
    #[cfg(any(target_os = "macos", target_os = "windows"))]
    {
        get_config_dir()
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        match env::var("XDG_DATA_HOME") {
            Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
            _ => home_dir().join(".local").join("share").join(APP_DIR),
        }
    }
}
