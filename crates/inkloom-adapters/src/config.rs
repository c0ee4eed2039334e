//! Layered configuration loading (spec.md §6, expanded in SPEC_FULL.md
//! AMBIENT-3): compiled-in defaults, an optional `config/default.toml`,
//! an optional `config/local.toml`, then `DIRECTOR_<SECTION>__<KEY>`
//! environment overrides — grounded on the teacher's `config.rs`/
//! `settings_loader.rs` env-first shape, upgraded to the `config` crate
//! since this runtime's override pattern needs nested-key support that
//! ad-hoc `env::var` parsing doesn't give you.

use config::{Config, Environment, File};
use inkloom_domain::RuntimeConfig;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),
    #[error("failed to deserialize configuration: {0}")]
    Deserialize(String),
    #[error("configuration failed validation: {0}")]
    Invalid(String),
}

/// Loads `.env` first (if present), then layers config sources in
/// ascending priority: built-in defaults < `config/default.toml` <
/// `config/local.toml` < `DIRECTOR_`-prefixed environment variables.
pub fn load() -> Result<RuntimeConfig, ConfigError> {
    let _ = dotenvy::dotenv();

    let defaults = RuntimeConfig::default();
    let defaults_value =
        serde_json::to_value(&defaults).map_err(|e| ConfigError::Load(e.to_string()))?;

    let builder = Config::builder()
        .add_source(config::Config::try_from(&defaults_value).map_err(|e| ConfigError::Load(e.to_string()))?)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        .add_source(
            Environment::with_prefix("DIRECTOR")
                .separator("__")
                .try_parsing(true),
        );

    let built = builder.build().map_err(|e| ConfigError::Load(e.to_string()))?;
    let runtime_config: RuntimeConfig = built
        .try_deserialize()
        .map_err(|e| ConfigError::Deserialize(e.to_string()))?;

    runtime_config
        .validate()
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

    Ok(runtime_config)
}
