//! State codec abstraction.
//!
//! The codec seam decides how the database state is framed as bytes before
//! it reaches the medium.
//!
//! - `JsonCodec`: plain JSON (default)
//! - `MessagePackCodec`: MessagePack with named fields
//!
//! # Usage
//!
//! ```
//! use tablestore_core::DatabaseState;
//! use tablestore_storage::codec::get_codec;
//!
//! let codec = get_codec("json").unwrap();
//! let bytes = codec.encode(&DatabaseState::new()).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), DatabaseState::new());
//! ```

mod json;
mod msgpack;
mod traits;

pub use json::JsonCodec;
pub use msgpack::MessagePackCodec;
pub use traits::{CodecError, StateCodec};

/// Get a codec by its identifier.
///
/// Returns the codec if recognized, or an error for unknown codec IDs.
///
/// # Known Codecs
///
/// - `"json"`: `JsonCodec`
/// - `"msgpack"`: `MessagePackCodec`
pub fn get_codec(codec_id: &str) -> Result<Box<dyn StateCodec>, CodecError> {
    match codec_id {
        "json" => Ok(Box::new(JsonCodec)),
        "msgpack" => Ok(Box::new(MessagePackCodec)),
        _ => Err(CodecError::UnknownCodec(codec_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_known_codecs() {
        assert_eq!(get_codec("json").unwrap().codec_id(), "json");
        assert_eq!(get_codec("msgpack").unwrap().codec_id(), "msgpack");
    }

    #[test]
    fn test_get_unknown_codec() {
        let result = get_codec("identity");
        assert!(matches!(result, Err(CodecError::UnknownCodec(_))));
    }
}
