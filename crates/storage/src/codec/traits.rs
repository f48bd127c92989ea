//! State codec trait definitions.

use tablestore_core::DatabaseState;

/// State codec trait.
///
/// Turns the whole in-memory database into the bytes written to the medium
/// and back. The codec is chosen per store and must be the same one that
/// wrote a blob for the blob to load.
///
/// # Thread Safety
///
/// Codecs must be `Send + Sync` to allow a store to move between threads.
pub trait StateCodec: Send + Sync {
    /// Encode the database state.
    fn encode(&self, state: &DatabaseState) -> Result<Vec<u8>, CodecError>;

    /// Decode a database state.
    ///
    /// Returns an error if the bytes are not a well-formed encoding. The
    /// decoded state is not checked for structural invariants here.
    fn decode(&self, bytes: &[u8]) -> Result<DatabaseState, CodecError>;

    /// Unique codec identifier.
    fn codec_id(&self) -> &str;
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Encoding failed.
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Decoding failed (truncated or foreign bytes, wrong codec).
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Unknown codec identifier.
    #[error("Unknown codec: {0}")]
    UnknownCodec(String),
}

impl From<CodecError> for tablestore_core::StoreError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::UnknownCodec(id) => {
                tablestore_core::StoreError::InvalidConfig(format!("unknown codec '{}'", id))
            }
            other => tablestore_core::StoreError::Serialization(other.to_string()),
        }
    }
}
