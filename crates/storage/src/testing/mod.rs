//! Testing utilities for persistence failure handling
//!
//! - **FaultyMedium**: wraps any medium and fails reads, writes or removes
//!   on demand, counting every attempt
//!
//! # Example
//!
//! ```
//! use tablestore_storage::medium::{KeyValueMedium, MemoryMedium};
//! use tablestore_storage::testing::FaultyMedium;
//!
//! let medium = FaultyMedium::new(MemoryMedium::new());
//! medium.fail_writes(true);
//! assert!(medium.write("k", b"v").is_err());
//! assert_eq!(medium.inner().read("k").unwrap(), None);
//! assert_eq!(medium.write_attempts(), 1);
//! ```

mod faulty;

pub use faulty::FaultyMedium;
