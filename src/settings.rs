// config lets you read a separate config file
use config::{Config, Environment as EnvironmentSource, File, Map};
use serde::Deserialize;
use std::path::Path;

use crate::error::Result;
use crate::persist::PersistenceMode;
use crate::security::SecurityHeaders;

pub const ENV_PREFIX: &str = "KEYSTONE";
pub const CONFIG_FILE_VAR: &str = "KEYSTONE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "keystone";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Testing,
    Staging,
    #[serde(alias = "prod")]
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    pub bind: String,
    /// `:memory:` or a path to a SQLite file.
    pub database: String,
    pub log_filter: String,
}

impl Settings {
    /// Defaults, then `keystone.toml` (or the file named by `KEYSTONE_CONFIG`),
    /// then `KEYSTONE_*` environment variables.
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::build(Some(Path::new(&file)), None)
    }

    /// Builds settings from an optional file and, when given, an explicit
    /// variable map standing in for the process environment.
    pub fn build(file: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("environment", "local")?
            .set_default("bind", "127.0.0.1:8080")?
            .set_default("database", "keystone.db")?
            .set_default("log_filter", "keystone=info,tower_http=info")?;
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }
        let settings = builder
            .add_source(EnvironmentSource::with_prefix(ENV_PREFIX).source(env))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn persistence_mode(&self) -> PersistenceMode {
        PersistenceMode::from_location(&self.database)
    }

    pub fn security_headers(&self) -> SecurityHeaders {
        SecurityHeaders::new(self.environment.is_production())
    }
}
