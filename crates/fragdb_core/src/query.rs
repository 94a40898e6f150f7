//! Schema-driven partial queries.
//!
//! A query is a template shaped like the data wanted back: maps name the
//! keys to descend into, `null` leaves mean "everything from here down",
//! and bracket selectors on keys pick sequence elements. Resolution runs
//! in three steps: reduce the template to the archive's fragmentation
//! depth, resolve each leaf path to fragments via the index, then
//! reassemble and reshape the decoded pieces against the original
//! template.

use crate::archive::{Archive, ArchiveIndex};
use crate::error::{ArchiveError, ArchiveResult};
use crate::flatten::merge_indexed_keys;
use crate::path::{self, Selector};
use fragdb_codec::Value;
use std::io::Write;
use tracing::debug;

impl Archive {
    /// Resolve a schema-shaped template against the archive.
    ///
    /// Missing paths and out-of-range selectors are omitted from the
    /// result, never errors; a query matching nothing returns an empty
    /// map.
    ///
    /// # Errors
    ///
    /// `MalformedPath` for bad bracket syntax in the template, plus any
    /// index/storage/codec failure.
    pub fn query(&mut self, schema: &Value) -> ArchiveResult<Value> {
        self.index()?;
        let Some(index) = self.cached_index() else {
            return Ok(Value::empty_map());
        };

        let reduced = reduce_schema(schema, index.max_depth(), 0);
        let mut query_paths = Vec::new();
        collect_schema_paths(&reduced, "", &mut query_paths);
        debug!(paths = query_paths.len(), "resolving query");

        let mut accumulated: Option<Value> = None;
        for query_path in &query_paths {
            if let Some(resolved) = self.resolve_query_path(index, query_path)? {
                accumulated = merge_into(accumulated, resolved);
            }
        }

        match accumulated {
            Some(data) => reshape(schema, &merge_indexed_keys(data)),
            None => Ok(Value::empty_map()),
        }
    }

    /// Run a query and render the result as a JSON string.
    ///
    /// # Errors
    ///
    /// Same as [`Archive::query`].
    pub fn query_json(&mut self, schema: &Value) -> ArchiveResult<String> {
        let result = self.query(schema)?;
        Ok(serde_json::to_string(&result.to_json())?)
    }

    /// Run a query and write the result as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Same as [`Archive::query`], plus serialization failures from the
    /// writer.
    pub fn query_to_writer(&mut self, schema: &Value, writer: &mut impl Write) -> ArchiveResult<()> {
        let result = self.query(schema)?;
        serde_json::to_writer_pretty(writer, &result.to_json())?;
        Ok(())
    }

    /// Resolve one index path to a nested value, or `None` if nothing is
    /// stored there.
    ///
    /// Wildcard paths expand against every matching indexed path. A
    /// concrete path decodes each of its recorded fragments oldest
    /// first: leaf payloads are nested back under their full path,
    /// container payloads recurse into their children.
    fn resolve_query_path(
        &self,
        index: &ArchiveIndex,
        query_path: &str,
    ) -> ArchiveResult<Option<Value>> {
        if query_path.contains(path::WILDCARD) {
            let mut merged: Option<Value> = None;
            for stored in index.paths() {
                if path::wildcard_match(stored, query_path) {
                    if let Some(resolved) = self.resolve_query_path(index, stored)? {
                        merged = merge_into(merged, resolved);
                    }
                }
            }
            return Ok(merged);
        }

        let Some(offsets) = index.offsets(query_path) else {
            return Ok(None);
        };

        let mut merged: Option<Value> = None;
        for &offset in offsets {
            let resolved = match self.fragment_at(offset)? {
                // Leaf: a single-entry map keyed by the path's basename.
                Value::Map(pairs) => pairs
                    .into_iter()
                    .next()
                    .map(|(_, value)| nest_along_path(query_path, value)),
                // Container: an array of child paths to chase.
                Value::Array(children) => {
                    let mut inner: Option<Value> = None;
                    for child in children {
                        let Value::Text(child_path) = child else {
                            return Err(ArchiveError::invalid_format(format!(
                                "container fragment `{query_path}` holds a non-path child"
                            )));
                        };
                        if let Some(resolved) = self.resolve_query_path(index, &child_path)? {
                            inner = merge_into(inner, resolved);
                        }
                    }
                    inner
                }
                _ => {
                    return Err(ArchiveError::invalid_format(format!(
                        "fragment at `{query_path}` is neither a leaf map nor a child list"
                    )))
                }
            };
            if let Some(resolved) = resolved {
                merged = merge_into(merged, resolved);
            }
        }
        Ok(merged)
    }
}

fn merge_into(accumulator: Option<Value>, value: Value) -> Option<Value> {
    Some(match accumulator {
        Some(existing) => deep_merge(existing, value),
        None => value,
    })
}

/// Merge `update` into `base`. Maps merge key-wise recursively; for
/// anything else the later value wins, so fragments from newer commits
/// shadow older ones.
pub(crate) fn deep_merge(base: Value, update: Value) -> Value {
    match (base, update) {
        (Value::Map(mut base_pairs), Value::Map(update_pairs)) => {
            for (key, update_value) in update_pairs {
                match base_pairs.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => {
                        let existing = std::mem::replace(&mut entry.1, Value::Null);
                        entry.1 = deep_merge(existing, update_value);
                    }
                    None => base_pairs.push((key, update_value)),
                }
            }
            Value::Map(base_pairs)
        }
        (_, update) => update,
    }
}

/// Replace template subtrees nested deeper than the fragmentation depth
/// with `null`. Anything past the cutoff is inside an opaque blob anyway,
/// so the template cannot steer below it.
fn reduce_schema(schema: &Value, max_depth: usize, depth: usize) -> Value {
    let Value::Map(pairs) = schema else {
        return schema.clone();
    };
    if depth + 1 > max_depth {
        return Value::Null;
    }
    Value::Map(
        pairs
            .iter()
            .map(|(key, value)| (key.clone(), reduce_schema(value, max_depth, depth + 1)))
            .collect(),
    )
}

/// Collect the leaf paths of a reduced template. Only leaves turn into
/// index lookups; interior map nodes just contribute path segments.
fn collect_schema_paths(schema: &Value, prefix: &str, out: &mut Vec<String>) {
    if let Value::Map(pairs) = schema {
        for (key, value) in pairs {
            let child = path::join(prefix, key);
            if value.is_map() {
                collect_schema_paths(value, &child, out);
            } else {
                out.push(child);
            }
        }
    }
}

/// Wrap a value in nested single-entry maps along the segments of its
/// path, turning a decoded leaf back into a tree rooted at the top.
fn nest_along_path(query_path: &str, value: Value) -> Value {
    let mut nested = value;
    for segment in query_path.rsplit('/') {
        nested = Value::map(vec![(segment.to_string(), nested)]);
    }
    nested
}

/// Shape resolved data according to the original template: apply bracket
/// selectors, keep only requested keys, and omit whatever is absent.
fn reshape(schema: &Value, data: &Value) -> ArchiveResult<Value> {
    let Value::Map(entries) = schema else {
        return Ok(data.clone());
    };

    let mut out = Value::empty_map();
    for (key, sub_schema) in entries {
        let (name, selector) = path::split_selector(key)?;
        let Some(found) = data.get(name) else {
            continue;
        };
        match selector {
            None => {
                out.insert(name, reshape(sub_schema, found)?);
            }
            Some(Selector::Index(index)) => {
                let Some(items) = found.as_array() else {
                    continue;
                };
                let Some(resolved) = path::resolve_index(index, items.len()) else {
                    continue;
                };
                // A concrete index still yields a one-element sequence so
                // the result keeps the shape of the template key.
                out.insert(
                    name,
                    Value::Array(vec![reshape(sub_schema, &items[resolved])?]),
                );
            }
            Some(selector) => {
                let Some(items) = found.as_array() else {
                    continue;
                };
                let range = path::slice_range(selector, items.len());
                let mut picked = Vec::with_capacity(range.len());
                for item in &items[range] {
                    picked.push(reshape(sub_schema, item)?);
                }
                out.insert(name, Value::Array(picked));
            }
        }
    }
    Ok(merge_indexed_keys(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn reduce_schema_cuts_below_depth() {
        let schema = Value::map(vec![(
            "a".to_string(),
            Value::map(vec![(
                "b".to_string(),
                Value::map(vec![("c".to_string(), Value::Null)]),
            )]),
        )]);

        let reduced = reduce_schema(&schema, 2, 0);
        assert_eq!(
            reduced,
            Value::map(vec![(
                "a".to_string(),
                Value::map(vec![("b".to_string(), Value::Null)]),
            )])
        );
    }

    #[test]
    fn collect_paths_takes_leaves_only() {
        let schema = Value::map(vec![
            (
                "run".to_string(),
                Value::map(vec![
                    ("program".to_string(), Value::Null),
                    ("systems[:]".to_string(), Value::Null),
                ]),
            ),
            ("meta".to_string(), Value::Null),
        ]);

        let mut paths = Vec::new();
        collect_schema_paths(&schema, "", &mut paths);
        assert_eq!(paths, vec!["run/program", "run/systems[:]", "meta"]);
    }

    #[test]
    fn deep_merge_is_recursive_and_later_wins() {
        let base = Value::map(vec![(
            "a".to_string(),
            Value::map(vec![
                ("x".to_string(), Value::Integer(1)),
                ("y".to_string(), Value::Integer(2)),
            ]),
        )]);
        let update = Value::map(vec![(
            "a".to_string(),
            Value::map(vec![
                ("y".to_string(), Value::Integer(20)),
                ("z".to_string(), Value::Integer(3)),
            ]),
        )]);

        let merged = deep_merge(base, update);
        let a = merged.get("a").unwrap();
        assert_eq!(a.get("x"), Some(&Value::Integer(1)));
        assert_eq!(a.get("y"), Some(&Value::Integer(20)));
        assert_eq!(a.get("z"), Some(&Value::Integer(3)));
    }

    #[test]
    fn nesting_rebuilds_the_tree() {
        let nested = nest_along_path("run/systems[0]", Value::Integer(1));
        assert_eq!(
            nested,
            Value::map(vec![(
                "run".to_string(),
                Value::map(vec![("systems[0]".to_string(), Value::Integer(1))]),
            )])
        );
    }

    fn sample_data() -> Value {
        Value::map(vec![(
            "run".to_string(),
            Value::map(vec![
                ("program".to_string(), text("exciting")),
                (
                    "systems".to_string(),
                    Value::Array(vec![
                        Value::map(vec![("n".to_string(), Value::Integer(1))]),
                        Value::map(vec![("n".to_string(), Value::Integer(2))]),
                        Value::map(vec![("n".to_string(), Value::Integer(3))]),
                    ]),
                ),
            ]),
        )])
    }

    #[test]
    fn reshape_keeps_requested_keys_only() {
        let schema = Value::map(vec![(
            "run".to_string(),
            Value::map(vec![("program".to_string(), Value::Null)]),
        )]);

        let reshaped = reshape(&schema, &sample_data()).unwrap();
        let run = reshaped.get("run").unwrap();
        assert_eq!(run.get("program"), Some(&text("exciting")));
        assert_eq!(run.get("systems"), None);
    }

    #[test]
    fn reshape_concrete_index_yields_single_element_sequence() {
        let schema = Value::map(vec![(
            "run".to_string(),
            Value::map(vec![("systems[1]".to_string(), Value::Null)]),
        )]);

        let reshaped = reshape(&schema, &sample_data()).unwrap();
        let systems = reshaped.get("run").unwrap().get("systems").unwrap();
        assert_eq!(
            systems,
            &Value::Array(vec![Value::map(vec![(
                "n".to_string(),
                Value::Integer(2)
            )])])
        );
    }

    #[test]
    fn reshape_out_of_range_index_omits_the_entry() {
        let schema = Value::map(vec![(
            "run".to_string(),
            Value::map(vec![("systems[10]".to_string(), Value::Null)]),
        )]);

        let reshaped = reshape(&schema, &sample_data()).unwrap();
        assert_eq!(reshaped.get("run").unwrap().get("systems"), None);
    }

    #[test]
    fn reshape_slice_clamps() {
        let schema = Value::map(vec![(
            "run".to_string(),
            Value::map(vec![("systems[-2:]".to_string(), Value::Null)]),
        )]);

        let reshaped = reshape(&schema, &sample_data()).unwrap();
        let systems = reshaped.get("run").unwrap().get("systems").unwrap();
        let items = systems.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("n"), Some(&Value::Integer(2)));
        assert_eq!(items[1].get("n"), Some(&Value::Integer(3)));
    }

    #[test]
    fn reshape_empty_slice_yields_empty_sequence() {
        let schema = Value::map(vec![(
            "run".to_string(),
            Value::map(vec![("systems[10:20]".to_string(), Value::Null)]),
        )]);

        let reshaped = reshape(&schema, &sample_data()).unwrap();
        let systems = reshaped.get("run").unwrap().get("systems").unwrap();
        assert_eq!(systems, &Value::Array(vec![]));
    }

    #[test]
    fn reshape_rejects_malformed_brackets() {
        let schema = Value::map(vec![("systems[a]".to_string(), Value::Null)]);
        assert!(matches!(
            reshape(&schema, &sample_data()),
            Err(ArchiveError::MalformedPath { .. })
        ));
    }
}
