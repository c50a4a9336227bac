use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "plp_bookstore";
pub const DEFAULT_COLLECTION: &str = "books";

pub const URI_ENV: &str = "MONGODB_URI";
pub const CONFIG_ENV: &str = "PLP_BOOKSTORE_CONFIG";

/// Where a single operation connects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Defaults with `MONGODB_URI` applied when set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(uri) = lookup(URI_ENV).filter(|s| !s.trim().is_empty()) {
            cfg.uri = uri;
        }
        cfg
    }

    #[must_use]
    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    /// `database.collection`, used in log lines.
    #[must_use]
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }

    /// The URI with any password masked, for printing.
    #[must_use]
    pub fn redacted_uri(&self) -> String {
        let Some((scheme, rest)) = self.uri.split_once("://") else {
            return self.uri.clone();
        };
        let authority_end = rest.find('/').unwrap_or(rest.len());
        let Some(at) = rest[..authority_end].rfind('@') else {
            return self.uri.clone();
        };
        match rest[..at].split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***{}", &rest[at..]),
            None => self.uri.clone(),
        }
    }
}

/// Settings read by the binary. Every field is optional so that layers can be merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub uri: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// # Errors
    /// Returns `DbError::Config` if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, DbError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("{}: {e}", path.display())))?;
        Ok(toml::from_str::<Self>(&s)?)
    }

    /// Fill unset fields from `other`.
    pub fn merge_missing(&mut self, other: Self) {
        if self.uri.is_none() {
            self.uri = other.uri;
        }
        if self.database.is_none() {
            self.database = other.database;
        }
        if self.collection.is_none() {
            self.collection = other.collection;
        }
        if self.log_level.is_none() {
            self.log_level = other.log_level;
        }
        if self.log_dir.is_none() {
            self.log_dir = other.log_dir;
        }
    }

    /// Resolve the layered configuration.
    ///
    /// Precedence: `overrides` (CLI flags) > environment > config file > defaults.
    /// Only the URI is taken from the environment.
    ///
    /// # Errors
    /// Returns `DbError::Config` if an explicitly named config file is unreadable.
    pub fn load<F>(overrides: Self, cli_path: Option<&Path>, lookup: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = overrides;
        if cfg.uri.is_none() {
            cfg.uri = lookup(URI_ENV).filter(|s| !s.trim().is_empty());
        }
        let file = cli_path
            .map(Path::to_path_buf)
            .or_else(|| lookup(CONFIG_ENV).map(PathBuf::from));
        if let Some(p) = file {
            cfg.merge_missing(Self::from_file(&p)?);
        }
        Ok(cfg)
    }

    #[must_use]
    pub fn connection(&self) -> ConnectionConfig {
        let d = ConnectionConfig::default();
        ConnectionConfig {
            uri: self.uri.clone().unwrap_or(d.uri),
            database: self.database.clone().unwrap_or(d.database),
            collection: self.collection.clone().unwrap_or(d.collection),
        }
    }
}
