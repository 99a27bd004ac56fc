use crate::settings::DatabaseSettings;
use quarry_schema::types::BackendKind;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{LazyLock, RwLock},
};
use thiserror::Error as ThisError;

const DEFAULT_CONNECTION: &str = "default";

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum ConfigError {
    #[error("flatten settings are required for a relation depth greater than 1 on {backend}")]
    FlattenRequired { backend: BackendKind },

    #[error("connection '{name}' was not found for backend {backend}")]
    NotFound { backend: BackendKind, name: String },
}

///
/// ConnectionConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub name: Option<String>,
    pub backend: BackendKind,
    pub settings: DatabaseSettings,
}

impl ConnectionConfig {
    fn connection_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| DEFAULT_CONNECTION.to_owned())
    }

    /// Flattening is the only way to address nested-entity columns with a
    /// dotted depth beyond one in a single relational row.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.is_relational()
            && self.settings.relation_depth() > 1
            && !self.settings.flatten_objects()
        {
            return Err(ConfigError::FlattenRequired {
                backend: self.backend,
            });
        }

        Ok(())
    }
}

///
/// Configurations
///
/// Connection settings keyed by backend and connection name, populated at
/// configuration-load time and read for every compilation thereafter.
///

static CONFIGURATIONS: LazyLock<Configurations> = LazyLock::new(Configurations::new);

#[derive(Debug, Default)]
pub struct Configurations {
    map: RwLock<BTreeMap<(BackendKind, String), ConnectionConfig>>,
}

impl Configurations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn global() -> &'static Self {
        &CONFIGURATIONS
    }

    pub fn add(&self, config: ConnectionConfig) -> Result<(), ConfigError> {
        config.validate()?;

        self.map
            .write()
            .expect("configuration RwLock poisoned while acquiring write lock")
            .insert((config.backend, config.connection_name()), config);

        Ok(())
    }

    pub fn get(
        &self,
        backend: BackendKind,
        name: Option<&str>,
    ) -> Result<ConnectionConfig, ConfigError> {
        let name = name.unwrap_or(DEFAULT_CONNECTION);

        self.map
            .read()
            .expect("configuration RwLock poisoned while acquiring read lock")
            .get(&(backend, name.to_owned()))
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                backend,
                name: name.to_owned(),
            })
    }
}
