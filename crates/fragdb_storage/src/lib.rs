//! # fragdb Storage
//!
//! Byte-store trait and backends for fragdb archive files.
//!
//! Backends are opaque byte stores: read at an offset, append, truncate,
//! flush. The archive layer in `fragdb_core` owns all format
//! interpretation — backends never see segments, separator tokens, or the
//! trailing index.
//!
//! ## Available backends
//!
//! - [`FileBackend`] — persistent storage over OS file APIs
//! - [`InMemoryBackend`] — ephemeral archives and tests
//!
//! ```
//! use fragdb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
