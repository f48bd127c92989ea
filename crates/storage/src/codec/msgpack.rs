//! MessagePack codec.
//!
//! Compact binary alternative to JSON. Structs are written with field names
//! (`to_vec_named`) so the blob keeps the same logical shape.

use super::traits::{CodecError, StateCodec};
use tablestore_core::DatabaseState;

/// MessagePack codec backed by `rmp-serde`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackCodec;

impl StateCodec for MessagePackCodec {
    fn encode(&self, state: &DatabaseState) -> Result<Vec<u8>, CodecError> {
        rmp_serde::to_vec_named(state).map_err(|e| CodecError::EncodeError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<DatabaseState, CodecError> {
        rmp_serde::from_slice(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    fn codec_id(&self) -> &str {
        "msgpack"
    }
}
