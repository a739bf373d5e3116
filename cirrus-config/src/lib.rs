// Configuration management for Cirrus
//
// All sources end up in one nested tree. Later loads overwrite earlier ones
// leaf by leaf, so a `.properties` file can override a single field of a
// table that came from TOML.

pub mod env;
pub mod error;
pub mod loader;
pub mod tree;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Main configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<Value>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(Value::Object(Map::new()))),
            env_prefix: None,
        }
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: Some(prefix.into()),
            ..Self::new()
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let env_vars = loader.load()?;
        debug!(count = env_vars.len(), "Loaded configuration from environment");

        let mut config = self.config.write();
        for (key, value) in env_vars {
            tree::insert_path(&mut config, &tree::split_key(&key), Value::String(value));
        }

        Ok(())
    }

    /// Load configuration from .env file, then from the environment
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        } else {
            dotenvy::dotenv().ok(); // Ignore if .env doesn't exist
        }
        self.load_env()
    }

    /// Load configuration from file, detecting the format from its extension
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let loader = ConfigLoader::auto(path)?;
        self.merge_document(loader.load_file(path)?, &path.display().to_string())
    }

    /// Load configuration from file in an explicit format
    pub fn load_file_as(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let path = path.as_ref();
        let data = ConfigLoader::new(format).load_file(path)?;
        self.merge_document(data, &path.display().to_string())
    }

    /// Load configuration from an in-memory document
    pub fn load_str(&self, content: &str, format: FileFormat) -> Result<()> {
        let data = ConfigLoader::new(format).parse(content)?;
        self.merge_document(data, "<string>")
    }

    /// Set a configuration value at a dotted key
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        let mut config = self.config.write();
        tree::insert_path(&mut config, &tree::split_key(key), json_value);

        Ok(())
    }

    /// Get a configuration value; any subtree can be deserialized
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .section(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Get a string value
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    /// Get an integer value; numeric strings are accepted
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.section(key) {
            Some(Value::String(raw)) => raw.trim().parse().map_err(|_| mismatch(key, "integer", &raw)),
            _ => self.get(key),
        }
    }

    /// Get a boolean value; `"true"` and `"false"` strings are accepted
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.section(key) {
            Some(Value::String(raw)) => raw.trim().parse().map_err(|_| mismatch(key, "boolean", &raw)),
            _ => self.get(key),
        }
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        let config = self.config.read();
        tree::lookup(&config, &tree::split_key(key)).is_some()
    }

    /// Top-level configuration keys
    pub fn keys(&self) -> Vec<String> {
        let config = self.config.read();
        config
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy of the subtree at a dotted key
    pub fn section(&self, key: &str) -> Option<Value> {
        let config = self.config.read();
        tree::lookup(&config, &tree::split_key(key)).cloned()
    }

    /// Copy of the whole tree
    pub fn snapshot(&self) -> Value {
        self.config.read().clone()
    }

    /// Merge configuration from another manager; its values win
    pub fn merge(&self, other: &ConfigManager) -> Result<()> {
        let incoming = other.snapshot();
        tree::merge(&mut self.config.write(), incoming);
        Ok(())
    }

    fn merge_document(&self, data: Value, origin: &str) -> Result<()> {
        if !data.is_object() {
            return Err(ConfigError::LoadError(format!(
                "{} does not contain a table at the top level",
                origin
            )));
        }

        tree::merge(&mut self.config.write(), data);
        debug!(origin, "Merged configuration document");
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn mismatch(key: &str, expected: &str, raw: &str) -> ConfigError {
    ConfigError::DeserializationError {
        key: key.to_string(),
        message: format!("expected {}, found '{}'", expected, raw),
    }
}
