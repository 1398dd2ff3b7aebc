use anyhow::{anyhow, Error};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Mongo,
    Memory,
    Noop,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mongo" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            "noop" => Ok(Self::Noop),
            other => Err(anyhow!("Unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: Backend,
    pub mongo_url: String,
    pub mongo_db: String,
    pub connect_timeout_ms: u64,
    pub max_pool_size: Option<u32>,
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Noop,
            mongo_url: "mongodb://localhost:27017".into(),
            mongo_db: "cinetec".into(),
            connect_timeout_ms: 5000,
            max_pool_size: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContactsConfig {
    pub psql_url: Option<String>,
    pub max_pool_size: u32,
    pub connect_timeout_ms: u64,
}

impl ContactsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            psql_url: None,
            max_pool_size: 4,
            connect_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub contacts: ContactsConfig,
    pub catalog: CatalogConfig,
    pub log: LogConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let parsed: Self = toml::from_str(&contents)?;
        Ok(parsed)
    }

    /// Override values with the ones found in the environment (or a `.env` file)
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<(), Error> {
        if let Some(backend) = vars.get("CINETEC_BACKEND") {
            self.store.backend = backend.parse()?;
        }

        if let Some(url) = vars.get("MONGO_URL") {
            self.store.mongo_url = url.clone();
        }

        if let Some(db) = vars.get("MONGO_DB") {
            self.store.mongo_db = db.clone();
        }

        if let Some(url) = vars.get("DATABASE_URL") {
            self.contacts.psql_url = Some(url.clone());
        }

        if let Some(path) = vars.get("CINETEC_CATALOG") {
            self.catalog.path = Some(path.into());
        }

        Ok(())
    }
}
