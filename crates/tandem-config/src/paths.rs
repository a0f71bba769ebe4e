//! Platform-specific configuration paths.
//!
//! - **User config**: `~/.config/tandem/` (Linux), `~/Library/Application Support/tandem/` (macOS), `%APPDATA%\tandem\` (Windows)
//! - **Default chain**: `chain.toml` inside the user config directory

use std::path::PathBuf;

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "tandem";

/// File name of the default chain configuration.
pub const DEFAULT_CONFIG_FILE: &str = "chain.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the default chain configuration file.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(DEFAULT_CONFIG_FILE)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_config_dir() {
        let dir = user_config_dir();
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert_eq!(path.file_name().unwrap(), DEFAULT_CONFIG_FILE);
        assert_eq!(path.parent().unwrap(), user_config_dir());
    }
}
