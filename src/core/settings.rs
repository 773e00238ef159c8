// src/core/settings.rs

//! Loads `st2chat.toml` and resolves the paths and credentials derived from it.

use crate::{
    constants::{ALIAS_CACHE_FILENAME, APP_DIR, CONFIG_FILENAME},
    models::{ApiUser, Settings},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not find system cache directory.")]
    CacheDirNotFound,
    #[error("Configuration file '{0}' does not exist.")]
    NotFound(PathBuf),
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to expand path '{path}': {reason}")]
    Expand { path: String, reason: String },
}

/// Environment variables that take precedence over the file.
pub const ENV_API_TOKEN: &str = "ST2_API_TOKEN";
pub const ENV_API_KEY: &str = "ST2_API_KEY";
pub const ENV_USERNAME: &str = "ST2_USERNAME";
pub const ENV_PASSWORD: &str = "ST2_PASSWORD";

/// Returns `<config dir>/st2chat/st2chat.toml`.
pub fn default_config_path() -> Result<PathBuf, SettingsError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
        .ok_or(SettingsError::ConfigDirNotFound)
}

/// Loads settings.
///
/// An explicit `path` must exist. Without one, the default location is used and a
/// missing file simply yields the defaults. Environment overrides are applied last.
pub fn load(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = match path {
        Some(explicit) => {
            let expanded = expand(&explicit.to_string_lossy())?;
            if !expanded.exists() {
                return Err(SettingsError::NotFound(expanded));
            }
            read_file(&expanded)?
        }
        None => {
            let default_path = default_config_path()?;
            if default_path.exists() {
                read_file(&default_path)?
            } else {
                log::debug!(
                    "No configuration at '{}', using defaults.",
                    default_path.display()
                );
                Settings::default()
            }
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_file(path: &Path) -> Result<Settings, SettingsError> {
    log::debug!("Loading configuration from '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|e| SettingsError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Overlays credentials found through `lookup` onto `settings`.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let auth = &mut settings.stackstorm.api_auth;

    if let Some(key) = lookup(ENV_API_KEY) {
        auth.key = Some(key);
    }

    let token = lookup(ENV_API_TOKEN);
    let name = lookup(ENV_USERNAME);
    let password = lookup(ENV_PASSWORD);
    if token.is_none() && name.is_none() && password.is_none() {
        return;
    }

    let user = auth.user.get_or_insert_with(ApiUser::default);
    if token.is_some() {
        user.token = token;
    }
    if name.is_some() {
        user.name = name;
    }
    if password.is_some() {
        user.password = password;
    }
}

/// Resolves the last-good alias cache location, expanding `~` and `$VARS`.
pub fn cache_path(settings: &Settings) -> Result<PathBuf, SettingsError> {
    match &settings.cache.path {
        Some(template) => expand(template),
        None => dirs::cache_dir()
            .map(|dir| dir.join(APP_DIR).join(ALIAS_CACHE_FILENAME))
            .ok_or(SettingsError::CacheDirNotFound),
    }
}

fn expand(template: &str) -> Result<PathBuf, SettingsError> {
    shellexpand::full(template)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| SettingsError::Expand {
            path: template.to_string(),
            reason: e.to_string(),
        })
}
