//! Storage layer for the table store
//!
//! This crate provides the two external collaborators of the store:
//! - `medium`: where the persisted blob lives (`KeyValueMedium`)
//! - `codec`: how the database state becomes that blob (`StateCodec`)
//!
//! plus `testing` helpers for simulating medium failures.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod medium;
pub mod testing;

pub use codec::{get_codec, CodecError, JsonCodec, MessagePackCodec, StateCodec};
pub use medium::{DirectoryMedium, KeyValueMedium, MediumError, MemoryMedium};
