//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level byte store underneath an archive file.
///
/// Backends are opaque: they know nothing about segments, separator
/// tokens, or the trailing index. The archive layer owns all format
/// interpretation and drives backends through exactly these operations:
/// seeked reads on the query path, appends plus a single truncate on the
/// commit path.
///
/// # Invariants
///
/// - `append` returns the offset the data was written at
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `flush` pushes all appended data towards durable storage
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `ReadPastEnd` if the range is not fully inside the current
    /// contents, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Flushes all pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs data and metadata to durable storage.
    ///
    /// Stronger than `flush`: file metadata is durable too once this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Truncates the storage to the given size.
    ///
    /// The archive uses this once per append-commit to drop the old
    /// trailing index before writing the new segment.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` is greater than the current size or
    /// the truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}

impl dyn StorageBackend {
    /// Reads the entire contents of the storage.
    ///
    /// Used by the bootstrap token scan; ordinary fragment reads stay
    /// offset-based.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined or the read fails.
    pub fn read_all(&self) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        self.read_at(0, size as usize)
    }
}
