//! Key-value medium abstraction.
//!
//! The table store keeps its whole state as one blob under one key. The
//! medium is the slot that blob lives in: a browser-style storage area, a
//! directory on disk, or anything else exposing `read`/`write`/`remove`.
//!
//! Two implementations ship here:
//!
//! - `MemoryMedium`: process-local map, optionally capped by a byte quota
//! - `DirectoryMedium`: one file per key with atomic replace on write
//!
//! # Usage
//!
//! ```
//! use tablestore_storage::medium::{KeyValueMedium, MemoryMedium};
//!
//! let medium = MemoryMedium::new();
//! medium.write("db_app", b"{}").unwrap();
//! assert_eq!(medium.read("db_app").unwrap(), Some(b"{}".to_vec()));
//! medium.remove("db_app").unwrap();
//! assert_eq!(medium.read("db_app").unwrap(), None);
//! ```

mod directory;
mod memory;
mod traits;

pub use directory::DirectoryMedium;
pub use memory::MemoryMedium;
pub use traits::{KeyValueMedium, MediumError};
