//! Store configuration via `tablestore.toml`
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock behaviour: JSON blobs under `db_<name>`, nothing written until the
//! first explicit commit.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tablestore_core::{is_valid_name, NameKind, StoreError, StoreResult};
use tablestore_storage::codec::{get_codec, StateCodec};

/// Config file name conventionally placed next to a directory medium.
pub const CONFIG_FILE_NAME: &str = "tablestore.toml";

/// Default storage key prefix.
pub const DEFAULT_PREFIX: &str = "db_";

/// Store configuration loaded from `tablestore.toml`.
///
/// # Example
///
/// ```toml
/// # Storage key is prefix + database name
/// prefix = "db_"
///
/// # "json" (default) or "msgpack"
/// codec = "json"
///
/// # Persist the empty state as soon as a new database is created
/// commit_on_create = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage key prefix.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Codec identifier: `"json"` or `"msgpack"`.
    #[serde(default = "default_codec")]
    pub codec: String,
    /// Commit immediately when a fresh database is initialised.
    #[serde(default)]
    pub commit_on_create: bool,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_codec() -> String {
    "json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            codec: default_codec(),
            commit_on_create: false,
        }
    }
}

impl StoreConfig {
    /// Check the prefix and resolve the codec.
    ///
    /// # Errors
    ///
    /// `InvalidName` for a prefix with characters outside `[A-Za-z0-9_]`,
    /// `InvalidConfig` for an unknown codec.
    pub fn codec(&self) -> StoreResult<Box<dyn StateCodec>> {
        if !self.prefix.is_empty() && !is_valid_name(&self.prefix) {
            return Err(StoreError::invalid_name(NameKind::Prefix, &self.prefix));
        }
        Ok(get_codec(&self.codec)?)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Table store configuration
#
# Storage key used for a database is prefix + database name.
prefix = "db_"

# Serialization codec: "json" (default) or "msgpack"
codec = "json"

# Persist the empty state as soon as a new database is initialised.
# When false, nothing is written until the first commit.
commit_on_create = false
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or names an unknown codec.
    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        let config: StoreConfig = toml::from_str(content).map_err(|e| {
            StoreError::invalid_config(format!("Failed to parse config: {}", e))
        })?;
        // Validate eagerly
        config.codec()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::invalid_config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> StoreResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StoreError::invalid_config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::invalid_config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StoreError::invalid_config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
