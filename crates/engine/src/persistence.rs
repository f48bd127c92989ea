//! Persistence Gateway
//!
//! Moves the whole [`DatabaseState`] between memory and one key of a
//! [`KeyValueMedium`]. The key is the configured prefix followed by the
//! database name. Nothing is cached here: every `load` reads the medium and
//! every `commit` rewrites the full blob.

use crate::config::StoreConfig;
use std::sync::Arc;
use tablestore_core::{validate_name, DatabaseState, NameKind, StoreError, StoreResult};
use tablestore_storage::codec::StateCodec;
use tablestore_storage::medium::KeyValueMedium;
use tracing::{debug, warn};

/// Result of reading the storage key at open
#[derive(Debug)]
pub enum LoadOutcome {
    /// A well-formed state was found
    Loaded(DatabaseState),
    /// Nothing is stored under the key
    Missing,
    /// Bytes were present but did not decode to a valid state
    Malformed(String),
}

/// Reads and writes a database's blob under its storage key
pub struct PersistenceGateway {
    key: String,
    medium: Arc<dyn KeyValueMedium>,
    codec: Box<dyn StateCodec>,
}

impl PersistenceGateway {
    /// Gateway for database `name` using `config`'s prefix and codec
    ///
    /// # Errors
    ///
    /// `InvalidName` for a bad database name or prefix, `InvalidConfig` for
    /// an unknown codec.
    pub fn new(
        name: &str,
        medium: Arc<dyn KeyValueMedium>,
        config: &StoreConfig,
    ) -> StoreResult<Self> {
        validate_name(NameKind::Database, name)?;
        let codec = config.codec()?;
        Ok(Self {
            key: format!("{}{}", config.prefix, name),
            medium,
            codec,
        })
    }

    /// Storage key this gateway reads and writes
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Identifier of the underlying codec
    pub fn codec_id(&self) -> &str {
        self.codec.codec_id()
    }

    /// Read and decode the stored state
    ///
    /// Decode failures and structurally invalid states come back as
    /// [`LoadOutcome::Malformed`]; only a failing medium is an error.
    pub fn load(&self) -> StoreResult<LoadOutcome> {
        let Some(bytes) = self.medium.read(&self.key)? else {
            return Ok(LoadOutcome::Missing);
        };

        let state = match self.codec.decode(&bytes) {
            Ok(state) => state,
            Err(e) => {
                warn!(target: "tablestore::persistence", key = %self.key, error = %e, "Stored state does not decode");
                return Ok(LoadOutcome::Malformed(e.to_string()));
            }
        };
        if let Err(e) = state.validate() {
            warn!(target: "tablestore::persistence", key = %self.key, error = %e, "Stored state is inconsistent");
            return Ok(LoadOutcome::Malformed(e.to_string()));
        }

        debug!(
            target: "tablestore::persistence",
            key = %self.key,
            bytes = bytes.len(),
            tables = state.tables().len(),
            "Loaded state"
        );
        Ok(LoadOutcome::Loaded(state))
    }

    /// Encode `state` and write it under the storage key
    ///
    /// On error the previously stored blob is left in place.
    pub fn commit(&self, state: &DatabaseState) -> StoreResult<()> {
        let bytes = self.codec.encode(state)?;
        self.medium.write(&self.key, &bytes)?;
        debug!(
            target: "tablestore::persistence",
            key = %self.key,
            medium = self.medium.medium_id(),
            bytes = bytes.len(),
            "Committed state"
        );
        Ok(())
    }

    /// Encode `state` as text without touching the medium
    ///
    /// Always JSON, independent of the configured codec.
    pub fn serialize(&self, state: &DatabaseState) -> StoreResult<String> {
        serde_json::to_string(state).map_err(StoreError::from)
    }

    /// Remove the storage key
    pub fn remove(&self) -> StoreResult<()> {
        self.medium.remove(&self.key)?;
        debug!(target: "tablestore::persistence", key = %self.key, "Removed state");
        Ok(())
    }
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("key", &self.key)
            .field("medium", &self.medium.medium_id())
            .field("codec", &self.codec.codec_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablestore_core::{FieldList, Row};
    use tablestore_storage::medium::MemoryMedium;
    use tablestore_storage::testing::FaultyMedium;

    fn gateway(medium: &MemoryMedium) -> PersistenceGateway {
        PersistenceGateway::new("app", Arc::new(medium.clone()), &StoreConfig::default()).unwrap()
    }

    fn sample() -> DatabaseState {
        let mut state = DatabaseState::new();
        state
            .create_table("people", FieldList::new(["name"]).unwrap())
            .unwrap();
        state
            .insert("people", &Row::new().with("name", "Ana"))
            .unwrap();
        state
    }

    #[test]
    fn key_is_prefix_plus_name() {
        let medium = MemoryMedium::new();
        assert_eq!(gateway(&medium).storage_key(), "db_app");

        let config = StoreConfig {
            prefix: String::new(),
            ..StoreConfig::default()
        };
        let gw = PersistenceGateway::new("app", Arc::new(medium), &config).unwrap();
        assert_eq!(gw.storage_key(), "app");
    }

    #[test]
    fn rejects_bad_database_name() {
        let err = PersistenceGateway::new(
            "my app",
            Arc::new(MemoryMedium::new()),
            &StoreConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidName {
                kind: NameKind::Database,
                ..
            }
        ));
    }

    #[test]
    fn missing_then_loaded() {
        let medium = MemoryMedium::new();
        let gw = gateway(&medium);
        assert!(matches!(gw.load().unwrap(), LoadOutcome::Missing));

        let state = sample();
        gw.commit(&state).unwrap();
        match gw.load().unwrap() {
            LoadOutcome::Loaded(loaded) => assert_eq!(loaded, state),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn garbage_is_malformed() {
        let medium = MemoryMedium::new();
        medium.write("db_app", b"not json at all").unwrap();
        assert!(matches!(
            gateway(&medium).load().unwrap(),
            LoadOutcome::Malformed(_)
        ));
    }

    #[test]
    fn inconsistent_state_is_malformed() {
        let medium = MemoryMedium::new();
        medium
            .write(
                "db_app",
                br#"{"tables":{"a":{"fields":["ID"],"auto_increment":1}},"data":{}}"#,
            )
            .unwrap();
        assert!(matches!(
            gateway(&medium).load().unwrap(),
            LoadOutcome::Malformed(_)
        ));
    }

    #[test]
    fn read_failure_is_an_error() {
        let medium = FaultyMedium::new(MemoryMedium::new());
        medium.fail_reads(true);
        let gw =
            PersistenceGateway::new("app", Arc::new(medium), &StoreConfig::default()).unwrap();
        assert!(gw.load().unwrap_err().is_persistence());
    }

    #[test]
    fn failed_commit_keeps_previous_blob() {
        let medium = Arc::new(FaultyMedium::new(MemoryMedium::new()));
        let gw = PersistenceGateway::new("app", medium.clone(), &StoreConfig::default()).unwrap();

        gw.commit(&DatabaseState::new()).unwrap();
        medium.fail_writes(true);
        assert!(gw.commit(&sample()).is_err());

        medium.fail_writes(false);
        match gw.load().unwrap() {
            LoadOutcome::Loaded(state) => assert!(state.tables().is_empty()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn serialize_is_json_even_with_msgpack() {
        let config = StoreConfig {
            codec: "msgpack".into(),
            ..StoreConfig::default()
        };
        let gw = PersistenceGateway::new("app", Arc::new(MemoryMedium::new()), &config).unwrap();
        let text = gw.serialize(&sample()).unwrap();
        let back: DatabaseState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn remove_clears_key() {
        let medium = MemoryMedium::new();
        let gw = gateway(&medium);
        gw.commit(&sample()).unwrap();
        gw.remove().unwrap();
        assert!(medium.read("db_app").unwrap().is_none());
    }
}
