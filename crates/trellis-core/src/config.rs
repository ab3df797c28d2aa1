//! Configuration management for Trellis components.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`<PREFIX>__SECTION__KEY`)
//! 2. Config file (`<file_prefix>.toml`, optional)
//! 3. Defaults supplied by the caller

use serde::de::DeserializeOwned;

use crate::error::Result;

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "TRELLIS";

/// Load one section of the layered configuration.
///
/// Returns `Ok(None)` when neither the file nor the environment defines the
/// section, so callers can fall back to their own defaults.
pub fn load_section<T: DeserializeOwned>(
    file_prefix: &str,
    env_prefix: &str,
    section: &str,
) -> Result<Option<T>> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<T>(section) {
        Ok(value) => Ok(Some(value)),
        Err(config::ConfigError::NotFound(_)) => {
            tracing::debug!(section, file_prefix, "Config section not found, using defaults");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
