//! fragdb_core: an append-friendly, queryable archive for nested
//! calculation records.
//!
//! Documents are flattened into path-addressed fragments at a fixed
//! map-nesting depth and stored in a single binary file together with a
//! path → offset index, so partial reads seek straight to the fragments
//! a query needs instead of parsing the whole file.
//!
//! ```no_run
//! use fragdb_core::{Archive, ArchiveOptions, Mode, Value};
//!
//! # fn main() -> fragdb_core::ArchiveResult<()> {
//! let mut archive = Archive::open("calcs.fdb", Mode::Write)?;
//! archive.add_json(&serde_json::json!({
//!     "calc_1": {"run": {"program": "exciting", "systems": [{"n": 1}]}}
//! }))?;
//! archive.commit()?;
//!
//! let schema = Value::from_json(&serde_json::json!({
//!     "calc_1": {"run": {"systems[:]": null}}
//! }));
//! let result = archive.query(&schema)?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod archive;
mod error;
mod flatten;
mod options;
mod path;
mod query;

pub use archive::{Archive, ArchiveIndex, Mode};
pub use error::{ArchiveError, ArchiveResult};
pub use flatten::{merge_indexed_keys, Flattener, Fragment};
pub use options::ArchiveOptions;
pub use path::Selector;

pub use fragdb_codec::Value;
