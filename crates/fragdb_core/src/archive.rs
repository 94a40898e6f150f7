//! The archive store.
//!
//! One archive file is a magic header, a run of segments (each one
//! encoded value), a trailing index segment, and an 8-byte footer giving
//! the index segment's offset:
//!
//! ```text
//! "FDB1" | segment | segment | ... | index segment | footer (u64 LE)
//! ```
//!
//! A fragment-list segment is an array alternating separator tokens and
//! fragment payloads. The index maps every fragment path to the byte
//! offsets of its payloads — the byte immediately after each encoded
//! token — so reads seek and decode exactly one value. Committed
//! segments are immutable; only the index segment and footer are ever
//! rewritten.

use crate::error::{ArchiveError, ArchiveResult};
use crate::flatten::Flattener;
use crate::options::ArchiveOptions;
use fragdb_codec::{CodecError, Encoder, Value};
use fragdb_storage::{FileBackend, InMemoryBackend, StorageBackend, StorageError};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, trace};

const MAGIC: &[u8] = b"FDB1";
const FORMAT_VERSION: i64 = 1;
const TOKEN_PREFIX: &str = "@frag:";
const INDEX_TOKEN: &str = "@frag:index";
const FOOTER_LEN: u64 = 8;
/// First read size for a seeked fragment decode; grows geometrically
/// when a fragment turns out larger.
const MIN_READ_CHUNK: u64 = 4096;

/// Access mode of an archive handle, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read-only; the file must exist.
    Read,
    /// Start a fresh archive, truncating any existing file.
    Write,
    /// Add segments to an existing archive (or start one).
    Append,
}

impl Mode {
    /// Whether staging and committing are allowed in this mode.
    pub fn is_writable(self) -> bool {
        matches!(self, Mode::Write | Mode::Append)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Read => write!(f, "read"),
            Mode::Write => write!(f, "write"),
            Mode::Append => write!(f, "append"),
        }
    }
}

/// The path → offsets index stored in the trailing segment.
///
/// A path can carry several offsets, one per commit that touched it;
/// query results merge across all of them, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveIndex {
    max_depth: usize,
    fragment_count: u64,
    paths: BTreeMap<String, Vec<u64>>,
}

impl ArchiveIndex {
    fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            fragment_count: 0,
            paths: BTreeMap::new(),
        }
    }

    /// The fragmentation depth this archive was built with.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Payload offsets recorded for a path, oldest commit first.
    pub fn offsets(&self, path: &str) -> Option<&[u64]> {
        self.paths.get(path).map(Vec::as_slice)
    }

    /// Whether the path has any fragment.
    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    /// All indexed paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Number of indexed paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the index holds no paths at all.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn record(&mut self, path: &str, offset: u64) {
        self.paths.entry(path.to_string()).or_default().push(offset);
    }

    fn to_value(&self) -> Value {
        let paths = self
            .paths
            .iter()
            .map(|(path, offsets)| {
                (
                    path.clone(),
                    Value::Array(
                        offsets
                            .iter()
                            .map(|&offset| Value::Integer(offset as i64))
                            .collect(),
                    ),
                )
            })
            .collect();

        Value::map(vec![
            ("version".to_string(), Value::Integer(FORMAT_VERSION)),
            (
                "max_depth".to_string(),
                Value::Integer(self.max_depth as i64),
            ),
            (
                "fragments".to_string(),
                Value::Integer(self.fragment_count as i64),
            ),
            ("paths".to_string(), Value::Map(paths)),
        ])
    }

    fn from_value(value: &Value) -> ArchiveResult<Self> {
        let field = |name: &str| -> ArchiveResult<i64> {
            value
                .get(name)
                .and_then(Value::as_integer)
                .ok_or_else(|| {
                    ArchiveError::invalid_format(format!("index field `{name}` missing or invalid"))
                })
        };

        let version = field("version")?;
        if version != FORMAT_VERSION {
            return Err(ArchiveError::invalid_format(format!(
                "unsupported format version {version}, expected {FORMAT_VERSION}"
            )));
        }
        let max_depth = usize::try_from(field("max_depth")?)
            .map_err(|_| ArchiveError::invalid_format("negative max_depth in index"))?;
        let fragment_count = u64::try_from(field("fragments")?)
            .map_err(|_| ArchiveError::invalid_format("negative fragment count in index"))?;

        let Some(Value::Map(entries)) = value.get("paths") else {
            return Err(ArchiveError::invalid_format(
                "index field `paths` missing or invalid",
            ));
        };

        let mut paths = BTreeMap::new();
        for (path, offsets_value) in entries {
            let Value::Array(items) = offsets_value else {
                return Err(ArchiveError::invalid_format(format!(
                    "offset list for `{path}` is not an array"
                )));
            };
            let mut offsets = Vec::with_capacity(items.len());
            for item in items {
                let offset = item.as_integer().and_then(|n| u64::try_from(n).ok());
                match offset {
                    Some(offset) => offsets.push(offset),
                    None => {
                        return Err(ArchiveError::invalid_format(format!(
                            "invalid offset for `{path}`"
                        )))
                    }
                }
            }
            paths.insert(path.clone(), offsets);
        }

        Ok(Self {
            max_depth,
            fragment_count,
            paths,
        })
    }
}

/// An archive of fragmented calculation records in a single file.
///
/// Write side: [`add`](Archive::add) stages documents in memory;
/// [`commit`](Archive::commit) flattens them into one new segment and
/// rewrites the trailing index. Read side: [`query`](Archive::query)
/// resolves a schema-shaped template against the index and decodes only
/// the fragments it needs.
///
/// A handle owns its backend; concurrent readers each open their own
/// handle. There is exactly one writer per file during a build pass —
/// that contract is the caller's.
pub struct Archive {
    backend: Box<dyn StorageBackend>,
    mode: Mode,
    options: ArchiveOptions,
    staged: Vec<(String, Value)>,
    index: Option<ArchiveIndex>,
}

impl Archive {
    /// Opens an archive file with default options.
    ///
    /// # Errors
    ///
    /// Read mode on a missing file is `NotFound`; an existing file that
    /// is not a fragdb archive is `InvalidFormat`.
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> ArchiveResult<Self> {
        Self::open_with(path, mode, ArchiveOptions::default())
    }

    /// Opens an archive file.
    ///
    /// `options.max_depth` only matters for a fresh write; append and
    /// read handles take the depth from the stored index.
    ///
    /// # Errors
    ///
    /// See [`Archive::open`].
    pub fn open_with(
        path: impl AsRef<Path>,
        mode: Mode,
        options: ArchiveOptions,
    ) -> ArchiveResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), %mode, "opening archive");

        let backend: Box<dyn StorageBackend> = match mode {
            Mode::Read => Box::new(FileBackend::open_existing(path).map_err(|err| match err {
                StorageError::FileNotFound { path } => ArchiveError::NotFound { path },
                other => ArchiveError::Storage(other),
            })?),
            Mode::Write | Mode::Append => Box::new(FileBackend::open_with_create_dirs(path)?),
        };
        Self::with_backend(backend, mode, options)
    }

    /// Opens an archive over an arbitrary storage backend.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the backend holds bytes that are not a
    /// fragdb archive.
    pub fn with_backend(
        mut backend: Box<dyn StorageBackend>,
        mode: Mode,
        options: ArchiveOptions,
    ) -> ArchiveResult<Self> {
        let size = backend.size()?;
        match mode {
            Mode::Write => {
                if size > 0 {
                    backend.truncate(0)?;
                }
            }
            Mode::Read | Mode::Append => {
                if size > 0 {
                    check_header(backend.as_ref(), size)?;
                }
            }
        }

        Ok(Self {
            backend,
            mode,
            options,
            staged: Vec::new(),
            index: None,
        })
    }

    /// Opens an empty in-memory archive in write mode.
    ///
    /// # Errors
    ///
    /// Never fails in practice; kept fallible for signature symmetry
    /// with the other constructors.
    pub fn in_memory(options: ArchiveOptions) -> ArchiveResult<Self> {
        Self::with_backend(Box::new(InMemoryBackend::new()), Mode::Write, options)
    }

    /// The mode this handle was opened in.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of records currently staged and not yet committed.
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Stage documents for the next commit. No file I/O happens here.
    ///
    /// Accepts a map (each top-level entry becomes one record, keyed by
    /// its id) or a list of maps. Null-valued entries are skipped.
    ///
    /// # Errors
    ///
    /// `Mode` on a read handle; `UnsupportedDocument` for anything that
    /// is not a map or list of maps.
    pub fn add(&mut self, document: Value) -> ArchiveResult<()> {
        self.check_writable("add")?;
        match document {
            Value::Map(pairs) => {
                for (id, value) in pairs {
                    if !value.is_null() {
                        self.stage_record(id, value);
                    }
                }
                Ok(())
            }
            Value::Array(items) => {
                for item in items {
                    self.add(item)?;
                }
                Ok(())
            }
            other => Err(ArchiveError::UnsupportedDocument {
                kind: kind_name(&other),
            }),
        }
    }

    /// Stage documents handed over as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`Archive::add`].
    pub fn add_json(&mut self, document: &serde_json::Value) -> ArchiveResult<()> {
        self.add(Value::from_json(document))
    }

    /// Stage one record under an explicit id.
    ///
    /// Re-staging an id before the next commit replaces the previous
    /// value.
    ///
    /// # Errors
    ///
    /// `Mode` on a read handle.
    pub fn stage(&mut self, id: impl Into<String>, document: Value) -> ArchiveResult<()> {
        self.check_writable("stage")?;
        self.stage_record(id.into(), document);
        Ok(())
    }

    /// Stage a raw text blob as a scalar record.
    ///
    /// Dots in the id are normalized to underscores so the id stays a
    /// single path segment.
    ///
    /// # Errors
    ///
    /// `Mode` on a read handle.
    pub fn add_text(&mut self, id: &str, text: &str) -> ArchiveResult<()> {
        self.check_writable("add_text")?;
        let id = id.replace('.', "_");
        self.stage_record(id, Value::Text(text.to_string()));
        Ok(())
    }

    fn stage_record(&mut self, id: String, document: Value) {
        match self.staged.iter_mut().find(|(key, _)| *key == id) {
            Some(entry) => entry.1 = document,
            None => self.staged.push((id, document)),
        }
    }

    /// Commit all staged records as one new segment.
    ///
    /// With nothing staged this is a no-op and leaves the file bytes
    /// untouched. Otherwise the staged documents are flattened at the
    /// archive's fragmentation depth, appended as a fragment-list
    /// segment after the last committed one, and the index segment and
    /// footer are rewritten. The staging buffer is cleared only once
    /// everything is written, so a failed commit can be retried.
    ///
    /// # Errors
    ///
    /// `Mode` on a read handle, `InvalidFormat` if the existing file's
    /// index cannot be located, or any storage/codec error.
    pub fn commit(&mut self) -> ArchiveResult<()> {
        self.check_writable("commit")?;
        if self.staged.is_empty() {
            trace!("nothing staged, skipping commit");
            return Ok(());
        }

        let (mut index, segment_base, fresh) = match self.read_index_segment()? {
            Some((index, index_offset)) => (index, index_offset, false),
            None => (
                ArchiveIndex::new(self.options.max_depth),
                MAGIC.len() as u64,
                true,
            ),
        };

        let root = Value::Map(self.staged.clone());
        let fragments = Flattener::new(index.max_depth()).flatten(&root, "");

        let mut encoder = Encoder::with_capacity(4096);
        encoder.begin_array(2 * fragments.len());
        for (i, fragment) in fragments.iter().enumerate() {
            let token = format!("{TOKEN_PREFIX}{}", index.fragment_count + i as u64);
            encoder.encode(&Value::Text(token))?;
            // Offsets point at the byte right after the token: the start
            // of the encoded payload.
            index.record(&fragment.path, segment_base + encoder.position() as u64);
            encoder.encode(&fragment.payload)?;
        }
        index.fragment_count += fragments.len() as u64;

        let index_offset = segment_base + encoder.position() as u64;
        encoder.begin_array(2);
        encoder.encode(&Value::Text(INDEX_TOKEN.to_string()))?;
        encoder.encode(&index.to_value())?;

        if fresh {
            self.backend.append(MAGIC)?;
        } else {
            // Committed segments stay in place; only the old index and
            // footer go.
            self.backend.truncate(segment_base)?;
        }
        self.backend.append(encoder.as_bytes())?;
        self.backend.append(&index_offset.to_le_bytes())?;
        self.backend.flush()?;
        if self.options.sync_on_commit {
            self.backend.sync()?;
        }

        debug!(
            fragments = fragments.len(),
            indexed_paths = index.len(),
            "committed segment"
        );
        self.staged.clear();
        self.index = Some(index);
        Ok(())
    }

    /// Close the archive, committing staged records first when writable.
    ///
    /// # Errors
    ///
    /// Any error from the final commit.
    pub fn close(mut self) -> ArchiveResult<()> {
        if self.mode.is_writable() {
            self.commit()?;
        }
        Ok(())
    }

    /// The archive index, loaded lazily and cached for the life of the
    /// handle.
    ///
    /// An empty or never-committed archive gets an empty index at the
    /// handle's configured depth.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` if the trailing index cannot be located or
    /// parsed.
    pub fn index(&mut self) -> ArchiveResult<&ArchiveIndex> {
        if self.index.is_none() {
            let loaded = match self.read_index_segment()? {
                Some((index, _)) => index,
                None => ArchiveIndex::new(self.options.max_depth),
            };
            trace!(paths = loaded.len(), "loaded archive index");
            self.index = Some(loaded);
        }
        match self.index.as_ref() {
            Some(index) => Ok(index),
            None => unreachable!("index was just loaded"),
        }
    }

    pub(crate) fn cached_index(&self) -> Option<&ArchiveIndex> {
        self.index.as_ref()
    }

    /// Seek to `offset` and decode exactly one fragment payload.
    ///
    /// Reads a small chunk first and grows it geometrically if the value
    /// turns out larger, so a query touches roughly the bytes it needs.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` for an offset beyond the file, `Codec` for
    /// corrupt bytes at a claimed offset.
    pub fn fragment_at(&self, offset: u64) -> ArchiveResult<Value> {
        let size = self.backend.size()?;
        if offset >= size {
            return Err(ArchiveError::invalid_format(format!(
                "fragment offset {offset} beyond end of file ({size} bytes)"
            )));
        }

        let mut len = MIN_READ_CHUNK.min(size - offset);
        loop {
            let bytes = self.backend.read_at(offset, len as usize)?;
            match fragdb_codec::from_bytes(&bytes) {
                Ok(value) => return Ok(value),
                Err(CodecError::UnexpectedEof) if offset + len < size => {
                    len = (len * 2).min(size - offset);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Find a fragment by scanning the raw bytes for its separator
    /// token.
    ///
    /// This is the bootstrap lookup: it reads the whole file and is only
    /// used where no offset is available, e.g. recovering the index when
    /// the footer is damaged. Returns `None` if the token does not
    /// occur.
    ///
    /// # Errors
    ///
    /// Storage or codec errors.
    pub fn fragment_by_token(&self, token: &str) -> ArchiveResult<Option<Value>> {
        let bytes = self.backend.read_all()?;
        let needle = fragdb_codec::to_bytes(&Value::Text(token.to_string()))?;
        match rfind(&bytes, &needle) {
            Some(pos) => Ok(Some(fragdb_codec::decode_at(&bytes, pos + needle.len())?)),
            None => Ok(None),
        }
    }

    fn check_writable(&self, operation: &'static str) -> ArchiveResult<()> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(ArchiveError::Mode {
                operation,
                mode: self.mode,
            })
        }
    }

    /// Locate and parse the trailing index segment.
    ///
    /// Returns the index and the file offset its segment starts at, or
    /// `None` for an empty file. The footer is the fast path; a damaged
    /// footer falls back to scanning for the index token.
    fn read_index_segment(&self) -> ArchiveResult<Option<(ArchiveIndex, u64)>> {
        let size = self.backend.size()?;
        if size == 0 {
            return Ok(None);
        }
        check_header(self.backend.as_ref(), size)?;

        let footer = self
            .backend
            .read_at(size - FOOTER_LEN, FOOTER_LEN as usize)?;
        let mut footer_bytes = [0u8; FOOTER_LEN as usize];
        footer_bytes.copy_from_slice(&footer);
        let claimed = u64::from_le_bytes(footer_bytes);

        if claimed >= MAGIC.len() as u64 && claimed < size - FOOTER_LEN {
            let bytes = self
                .backend
                .read_at(claimed, (size - FOOTER_LEN - claimed) as usize)?;
            if let Ok(index) = parse_index_segment(&bytes) {
                return Ok(Some((index, claimed)));
            }
        }

        trace!("index footer unusable, scanning for index token");
        let bytes = self.backend.read_all()?;
        let needle = fragdb_codec::to_bytes(&Value::Text(INDEX_TOKEN.to_string()))?;
        let Some(token_pos) = rfind(&bytes, &needle) else {
            return Err(ArchiveError::invalid_format("no index segment found"));
        };
        // The index segment is always a two-element array, so its header
        // is the single byte before the token.
        if token_pos == 0 || bytes[token_pos - 1] != 0x82 {
            return Err(ArchiveError::invalid_format("index segment header damaged"));
        }
        let segment_start = token_pos - 1;
        let index = parse_index_segment(&bytes[segment_start..])?;
        Ok(Some((index, segment_start as u64)))
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("mode", &self.mode)
            .field("staged", &self.staged.len())
            .field("index_loaded", &self.index.is_some())
            .finish()
    }
}

fn check_header(backend: &dyn StorageBackend, size: u64) -> ArchiveResult<()> {
    if size < MAGIC.len() as u64 + FOOTER_LEN {
        return Err(ArchiveError::invalid_format(
            "file too short to be an archive",
        ));
    }
    let magic = backend.read_at(0, MAGIC.len())?;
    if magic.as_slice() != MAGIC {
        return Err(ArchiveError::invalid_format(
            "bad magic; not a fragdb archive",
        ));
    }
    Ok(())
}

fn parse_index_segment(bytes: &[u8]) -> ArchiveResult<ArchiveIndex> {
    let value = fragdb_codec::from_bytes(bytes)?;
    let Value::Array(items) = value else {
        return Err(ArchiveError::invalid_format(
            "index segment is not a segment array",
        ));
    };
    match items.as_slice() {
        [Value::Text(token), payload] if token == INDEX_TOKEN => ArchiveIndex::from_value(payload),
        _ => Err(ArchiveError::invalid_format(
            "index segment has unexpected shape",
        )),
    }
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::Bytes(_) => "byte string",
        Value::Text(_) => "text",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: i64) -> Value {
        Value::map(vec![(
            "calc".to_string(),
            Value::map(vec![("n".to_string(), Value::Integer(n))]),
        )])
    }

    #[test]
    fn add_rejects_scalars() {
        let mut archive = Archive::in_memory(ArchiveOptions::default()).unwrap();
        let err = archive.add(Value::Integer(5)).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::UnsupportedDocument { kind: "integer" }
        ));
    }

    #[test]
    fn add_accepts_list_of_maps() {
        let mut archive = Archive::in_memory(ArchiveOptions::default()).unwrap();
        archive
            .add(Value::Array(vec![record(1), record(2)]))
            .unwrap();
        // Same id twice: second staging wins.
        assert_eq!(archive.staged_count(), 1);
    }

    #[test]
    fn restaging_an_id_replaces_it() {
        let mut archive = Archive::in_memory(ArchiveOptions::default()).unwrap();
        archive.stage("a", Value::Integer(1)).unwrap();
        archive.stage("b", Value::Integer(2)).unwrap();
        archive.stage("a", Value::Integer(3)).unwrap();
        assert_eq!(archive.staged_count(), 2);
    }

    #[test]
    fn add_text_normalizes_id() {
        let mut archive = Archive::in_memory(ArchiveOptions::default()).unwrap();
        archive.add_text("notes.txt", "hello").unwrap();
        archive.commit().unwrap();

        let index = archive.index().unwrap();
        assert!(index.contains_path("notes_txt"));
        assert!(!index.contains_path("notes.txt"));
    }

    #[test]
    fn empty_commit_is_a_noop() {
        let mut archive = Archive::in_memory(ArchiveOptions::default()).unwrap();
        archive.add(record(1)).unwrap();
        archive.commit().unwrap();

        let before = archive.backend.size().unwrap();
        archive.commit().unwrap();
        assert_eq!(archive.backend.size().unwrap(), before);
    }

    #[test]
    fn commit_records_offsets_for_every_fragment() {
        let mut archive = Archive::in_memory(ArchiveOptions::default()).unwrap();
        archive.add(record(1)).unwrap();
        archive.commit().unwrap();

        let index = archive.index().unwrap();
        let paths: Vec<&str> = index.paths().collect();
        assert_eq!(paths, vec!["", "calc", "calc/n"]);

        // Every offset decodes to one value.
        let offsets: Vec<u64> = index
            .offsets("calc/n")
            .unwrap()
            .to_vec();
        assert_eq!(offsets.len(), 1);
        let payload = archive.fragment_at(offsets[0]).unwrap();
        assert_eq!(payload.get("n"), Some(&Value::Integer(1)));
    }

    #[test]
    fn fragment_by_token_scans_raw_bytes() {
        let mut archive = Archive::in_memory(ArchiveOptions::default()).unwrap();
        archive.add(record(7)).unwrap();
        archive.commit().unwrap();

        // First fragment of the first commit is the deepest leaf.
        let payload = archive.fragment_by_token("@frag:0").unwrap().unwrap();
        assert_eq!(payload.get("n"), Some(&Value::Integer(7)));

        assert!(archive.fragment_by_token("@frag:999").unwrap().is_none());
    }

    #[test]
    fn index_survives_reencoding() {
        let mut index = ArchiveIndex::new(3);
        index.record("a/b", 17);
        index.record("a/b", 99);
        index.record("a", 120);
        index.fragment_count = 3;

        let decoded = ArchiveIndex::from_value(&index.to_value()).unwrap();
        assert_eq!(decoded, index);
    }

    #[test]
    fn index_rejects_unknown_version() {
        let mut value = ArchiveIndex::new(2).to_value();
        value.insert("version", Value::Integer(99));
        assert!(matches!(
            ArchiveIndex::from_value(&value),
            Err(ArchiveError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn write_mode_truncates_existing_bytes() {
        let backend = InMemoryBackend::with_data(b"not an archive".to_vec());
        let archive =
            Archive::with_backend(Box::new(backend), Mode::Write, ArchiveOptions::default())
                .unwrap();
        assert_eq!(archive.backend.size().unwrap(), 0);
    }

    #[test]
    fn read_mode_rejects_foreign_bytes() {
        let backend = InMemoryBackend::with_data(b"definitely not an archive".to_vec());
        let result =
            Archive::with_backend(Box::new(backend), Mode::Read, ArchiveOptions::default());
        assert!(matches!(result, Err(ArchiveError::InvalidFormat { .. })));
    }
}
