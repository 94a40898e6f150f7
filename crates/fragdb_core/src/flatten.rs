//! Path-indexed document flattener.
//!
//! Converts a nested document into a flat list of path-addressed
//! fragments bounded by a maximum map-nesting depth. Shallow levels
//! become many small fragments for fast partial access; everything
//! beyond the cutoff is stored as a single opaque blob.

use crate::path;
use fragdb_codec::Value;

/// One path-addressable unit of stored data.
///
/// A leaf fragment's payload is a single-entry map keyed by the path's
/// basename; a container fragment's payload is an array of its immediate
/// children's paths. The decoder side distinguishes them by type.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// The `/`-delimited path addressing this fragment.
    pub path: String,
    /// The stored payload.
    pub payload: Value,
}

impl Fragment {
    fn leaf(path: &str, value: Value) -> Self {
        Self {
            payload: Value::map(vec![(path::basename(path).to_string(), value)]),
            path: path.to_string(),
        }
    }

    fn container(path: &str, children: Vec<String>) -> Self {
        Self {
            path: path.to_string(),
            payload: Value::Array(children.into_iter().map(Value::Text).collect()),
        }
    }

    /// Whether this fragment lists child paths rather than holding data.
    pub fn is_container(&self) -> bool {
        matches!(self.payload, Value::Array(_))
    }
}

/// Splits documents into fragments at a fixed map-nesting depth.
#[derive(Debug, Clone, Copy)]
pub struct Flattener {
    max_depth: usize,
}

impl Flattener {
    /// Creates a flattener with the given fragmentation depth.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Flatten a document rooted at `prefix` into fragments.
    ///
    /// Fragments come out in strict post-order: every child precedes its
    /// container, so a reader resolving a container can always find its
    /// children's paths already indexed.
    pub fn flatten(&self, document: &Value, prefix: &str) -> Vec<Fragment> {
        let mut out = Vec::new();
        self.walk(document, prefix, 0, &mut out);
        out
    }

    fn walk(&self, document: &Value, prefix: &str, depth: usize, out: &mut Vec<Fragment>) {
        // Sequences of maps stay addressable per element at any depth:
        // list nesting never counts against the cutoff.
        if let Value::Array(items) = document {
            if !items.is_empty() && items.iter().all(Value::is_map) {
                let mut children = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let element_path = path::indexed(prefix, i);
                    self.walk(item, &element_path, depth, out);
                    children.push(element_path);
                }
                out.push(Fragment::container(prefix, children));
                return;
            }
        }

        if depth >= self.max_depth {
            out.push(Fragment::leaf(prefix, document.clone()));
            return;
        }

        match document {
            Value::Map(pairs) => {
                let mut children = Vec::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let child_path = path::join(prefix, key);
                    self.walk(value, &child_path, depth + 1, out);
                    children.push(child_path);
                }
                out.push(Fragment::container(prefix, children));
            }
            // Scalars and non-map sequences are leaves wherever they sit.
            other => out.push(Fragment::leaf(prefix, other.clone())),
        }
    }
}

/// Collapse bracket-indexed map keys back into ordered sequences.
///
/// Within each map, keys of the form `k[0]`, `k[2]`, ... group by `k`,
/// order numerically ascending, and collapse into an array — gaps are
/// omitted, not null-filled. Plain keys pass through unchanged. Applied
/// recursively; reused both when reassembling query results and when
/// normalizing caller-supplied documents.
pub fn merge_indexed_keys(value: Value) -> Value {
    match value {
        Value::Map(pairs) => {
            enum Slot {
                Plain(Value),
                Indexed(Vec<(u64, Value)>),
            }

            let mut slots: Vec<(String, Slot)> = Vec::with_capacity(pairs.len());
            for (key, val) in pairs {
                let val = merge_indexed_keys(val);
                match path::bracket_index(&key) {
                    Some((name, index)) => {
                        let existing = slots.iter_mut().find_map(|(k, slot)| match slot {
                            Slot::Indexed(entries) if k == name => Some(entries),
                            _ => None,
                        });
                        match existing {
                            Some(entries) => entries.push((index, val)),
                            None => {
                                slots.push((name.to_string(), Slot::Indexed(vec![(index, val)])));
                            }
                        }
                    }
                    None => slots.push((key, Slot::Plain(val))),
                }
            }

            Value::Map(
                slots
                    .into_iter()
                    .map(|(key, slot)| match slot {
                        Slot::Plain(val) => (key, val),
                        Slot::Indexed(mut entries) => {
                            entries.sort_by_key(|(index, _)| *index);
                            (
                                key,
                                Value::Array(entries.into_iter().map(|(_, val)| val).collect()),
                            )
                        }
                    })
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(merge_indexed_keys).collect()),
        other => other,
    }
}
