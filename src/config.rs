//! Configuration for column compilation.
//!
//! [`FieldsConfig::load`] reads `config/fieldguard.toml` (optional) and
//! `FIELDGUARD__*` environment variables, e.g. `FIELDGUARD__FIELDS__DIALECT=mysql`.

use crate::dialect::Dialect;
use crate::error::FieldError;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/fieldguard.toml";
const ENV_PREFIX: &str = "FIELDGUARD";

/// What to do when two subqueries in one session generate the same table alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasPolicy {
    /// Log a warning and keep going
    #[default]
    BestEffort,
    /// Fail with [`FieldError::AliasCollision`]
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldsConfig {
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub alias_policy: AliasPolicy,
    #[serde(default = "default_anonymous_prefix")]
    pub anonymous_prefix: String,
}

fn default_anonymous_prefix() -> String {
    "ANON".to_string()
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            alias_policy: AliasPolicy::default(),
            anonymous_prefix: default_anonymous_prefix(),
        }
    }
}

impl FieldsConfig {
    /// Load the configuration from `config/fieldguard.toml`, falling back to env vars.
    ///
    /// A missing `[fields]` section yields the defaults.
    pub fn load() -> Result<Self, FieldError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!(
                        "failed to load {}, falling back to env: {}",
                        CONFIG_FILE,
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        Self::from_config(&settings)
    }

    /// Read the `[fields]` section of an already built [`Config`].
    pub fn from_config(settings: &Config) -> Result<Self, FieldError> {
        match settings.get::<FieldsConfig>("fields") {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Fields configuration could not be loaded from file or environment: {}",
                e
            ))
            .into()),
        }
    }
}
