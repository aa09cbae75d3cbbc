use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

/// Connection settings.
///
/// Deserializable from JSON, every missing key takes its default:
/// ```json
/// {
///     "driver": "mysql",
///     "host": "127.0.0.1",
///     "dbname": "app",
///     "username": "root",
///     "password": "secret",
///     "options": { "ssl-mode": "disabled" },
///     "debug": false,
///     "cache": "/var/cache/app"
/// }
/// ```
/// `cache` is either `false` (keep the discovered schemas in memory only) or the directory where
/// the schema artifacts are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub driver: String,
    pub host: String,
    pub port: Option<u16>,
    pub dbname: String,
    pub username: String,
    pub password: String,
    /// Driver specific options, appended to the connection URL.
    pub options: BTreeMap<String, String>,
    /// Rediscover the schemas on every first use instead of trusting the stored artifacts.
    pub debug: bool,
    #[serde(deserialize_with = "deserialize_cache")]
    pub cache: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            driver: String::new(),
            host: "127.0.0.1".into(),
            port: None,
            dbname: String::new(),
            username: String::new(),
            password: String::new(),
            options: BTreeMap::new(),
            debug: true,
            cache: None,
        }
    }
}

impl Config {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Default::default()
        }
    }
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = dbname.into();
        self
    }
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
    pub fn cache(mut self, directory: impl Into<PathBuf>) -> Self {
        self.cache = Some(directory.into());
        self
    }

    /// Data source name, `driver:host=...;dbname=...`.
    pub fn dsn(&self) -> String {
        let mut result = format!("{}:host={}", self.driver, self.host);
        if let Some(port) = self.port {
            result.push_str(&format!(";port={}", port));
        }
        result.push_str(&format!(";dbname={}", self.dbname));
        result
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            let e = Error::new(e).context("While parsing the connection configuration");
            log::error!("{:#}", e);
            e
        })
    }

    /// Checks that the configuration targets `expected_driver`.
    pub fn validate(&self, expected_driver: &str) -> Result<()> {
        if self.driver.is_empty() {
            return Err(Error::msg("The configuration does not specify a driver"));
        }
        if !self.driver.eq_ignore_ascii_case(expected_driver) {
            return Err(Error::msg(format!(
                "The configuration specifies driver `{}` but the connection uses `{}`",
                self.driver, expected_driver
            )));
        }
        if self.host.is_empty() {
            return Err(Error::msg("The configuration does not specify a host"));
        }
        Ok(())
    }
}

fn deserialize_cache<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<PathBuf>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cache {
        Flag(bool),
        Directory(PathBuf),
    }
    match Option::<Cache>::deserialize(deserializer)? {
        None | Some(Cache::Flag(false)) => Ok(None),
        Some(Cache::Flag(true)) => Err(serde::de::Error::custom(
            "cache must be `false` or a directory path",
        )),
        Some(Cache::Directory(path)) => Ok(Some(path)),
    }
}
