use anyhow::Result;
use config::{Config, ConfigError, Environment, File, Map, Source, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::{marker::PhantomData, path::PathBuf, time::Duration};
use url::Url;

use crate::paths::{config_file, storage_file};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the arena REST API
    pub api_endpoint: Url,
    /// Where session state (tokens, cached profile) is stored
    pub storage_file: PathBuf,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Default number of tournaments per page
    pub page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: Url::parse("http://localhost:8000").expect("Valid hardcoded server URL"),
            storage_file: storage_file(),
            request_timeout_ms: 15_000,
            page_size: 12,
        }
    }
}

impl Settings {
    /// Defaults, then `config.toml`, then `ARENA_*` environment variables
    /// (e.g. `ARENA_API_ENDPOINT`, `ARENA_REQUEST_TIMEOUT_MS`).
    pub fn load() -> Result<Self> {
        let path = config_file();

        let s = Config::builder()
            .add_source(DefaultImplSource::<Settings>::new())
            .add_source(File::with_name(&path.as_path().display().to_string()).required(false))
            .add_source(
                Environment::with_prefix("ARENA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(s.try_deserialize()?)
    }

    /// Settings pointing at a different server, with everything else default
    pub fn for_endpoint(api_endpoint: Url) -> Self {
        Self {
            api_endpoint,
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// Loads `Settings::default()` into `config` by going through
// `toml::Value`, mirroring the conversion `config` does for toml files.

struct DefaultImplSource<T: Default>(PhantomData<T>);

impl<T: Default> Clone for DefaultImplSource<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Default> std::fmt::Debug for DefaultImplSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DefaultImplSource").finish()
    }
}

impl<T: Default> DefaultImplSource<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Default + Serialize + Send + Sync + 'static> Source for DefaultImplSource<T> {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let toml_value =
            toml::Value::try_from(T::default()).map_err(|e| ConfigError::Message(e.to_string()))?;
        match from_toml_value(&toml_value).kind {
            ValueKind::Table(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

fn from_toml_value(value: &toml::Value) -> Value {
    match *value {
        toml::Value::String(ref value) => Value::new(None, value.to_string()),
        toml::Value::Float(value) => Value::new(None, value),
        toml::Value::Integer(value) => Value::new(None, value),
        toml::Value::Boolean(value) => Value::new(None, value),

        toml::Value::Table(ref table) => {
            let mut m = Map::new();

            for (key, value) in table {
                m.insert(key.clone(), from_toml_value(value));
            }

            Value::new(None, m)
        }

        toml::Value::Array(ref array) => {
            let mut l = Vec::new();

            for value in array {
                l.push(from_toml_value(value));
            }

            Value::new(None, l)
        }

        toml::Value::Datetime(ref datetime) => Value::new(None, datetime.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn test_defaults_through_config() -> TestResult {
        let settings: Settings = Config::builder()
            .add_source(DefaultImplSource::<Settings>::new())
            .build()?
            .try_deserialize()?;

        assert_eq!(settings.api_endpoint.as_str(), "http://localhost:8000/");
        assert_eq!(settings.request_timeout(), Duration::from_secs(15));
        assert_eq!(settings.page_size, 12);
        Ok(())
    }

    #[test]
    fn test_overrides_win_over_defaults() -> TestResult {
        let settings: Settings = Config::builder()
            .add_source(DefaultImplSource::<Settings>::new())
            .set_override("page_size", 30i64)?
            .set_override("api_endpoint", "https://api.example.test")?
            .build()?
            .try_deserialize()?;

        assert_eq!(settings.page_size, 30);
        assert_eq!(settings.api_endpoint.host_str(), Some("api.example.test"));
        Ok(())
    }
}
