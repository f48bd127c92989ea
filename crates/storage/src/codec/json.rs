//! JSON codec.
//!
//! The default codec. The blob is the plain JSON object
//! `{"tables": {...}, "data": {...}}`, readable by anything that reads JSON.

use super::traits::{CodecError, StateCodec};
use tablestore_core::DatabaseState;

/// JSON codec backed by `serde_json`.
///
/// # Example
///
/// ```
/// use tablestore_core::DatabaseState;
/// use tablestore_storage::codec::{JsonCodec, StateCodec};
///
/// let bytes = JsonCodec.encode(&DatabaseState::new()).unwrap();
/// assert_eq!(bytes, br#"{"tables":{},"data":{}}"#);
/// assert_eq!(JsonCodec.decode(&bytes).unwrap(), DatabaseState::new());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl StateCodec for JsonCodec {
    fn encode(&self, state: &DatabaseState) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(state).map_err(|e| CodecError::EncodeError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<DatabaseState, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    fn codec_id(&self) -> &str {
        "json"
    }
}
