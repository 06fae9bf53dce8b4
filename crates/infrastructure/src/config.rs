//! Settings loading.
//!
//! Layers, later wins: built-in defaults, an optional config file (format
//! from its extension), then `SEA_*` environment variables with `__`
//! between nesting levels, e.g. `SEA_AUTH__REFRESH_TIMEOUT_SECS=5`.

use std::path::Path;

use config::{Config, Environment, File};
use sea_domain::SeaSettings;
use thiserror::Error;

/// Prefix of the environment overrides.
pub const ENV_PREFIX: &str = "SEA";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file is missing.
    #[error("config file not found: {0}")]
    NotFound(String),

    /// A source could not be read or merged.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

/// Loads settings from defaults, `path` and the process environment.
///
/// # Errors
/// Returns an error if `path` does not exist or any layer is malformed.
pub fn load_settings(path: Option<&Path>) -> Result<SeaSettings, ConfigError> {
    load_with(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn load_with(path: Option<&Path>, environment: Environment) -> Result<SeaSettings, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&SeaSettings::default())?);

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        builder = builder.add_source(File::from(path));
    }

    let settings: SeaSettings = builder.add_source(environment).build()?.try_deserialize()?;
    tracing::debug!(base_url = %settings.api.base_url, "Settings loaded");
    Ok(settings)
}
