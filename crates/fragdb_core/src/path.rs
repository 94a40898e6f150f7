//! Fragment path grammar.
//!
//! Paths are `/`-joined segment names. A segment may carry a bracket
//! suffix selecting into a sequence: a concrete index (`systems[3]`,
//! negatives count from the end), a slice (`systems[1:4]`, `systems[-2:]`),
//! or the wildcard `systems[:]` meaning every element.

use crate::error::{ArchiveError, ArchiveResult};
use std::ops::Range;

/// The wildcard selector as it appears inside a path string.
pub const WILDCARD: &str = "[:]";

/// A bracket selector parsed off a path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// A single concrete index; negatives are relative to the length.
    Index(i64),
    /// A half-open range; either endpoint may be omitted.
    Slice {
        /// Start of the range, default 0.
        start: Option<i64>,
        /// End of the range, default the sequence length.
        end: Option<i64>,
    },
    /// Every element (`[:]`).
    All,
}

/// Split a path segment into its name and optional bracket selector.
///
/// # Errors
///
/// Returns `MalformedPath` for an empty name, an unterminated bracket,
/// trailing characters after `]`, or a non-integer index.
pub fn split_selector(segment: &str) -> ArchiveResult<(&str, Option<Selector>)> {
    let Some(bracket) = segment.find('[') else {
        return Ok((segment, None));
    };
    if bracket == 0 {
        return Err(ArchiveError::malformed_path(
            segment,
            "segment name before `[` is empty",
        ));
    }
    let name = &segment[..bracket];
    let rest = &segment[bracket + 1..];
    let Some(inner) = rest.strip_suffix(']') else {
        return Err(ArchiveError::malformed_path(segment, "missing closing `]`"));
    };
    if inner.contains(']') || inner.contains('[') {
        return Err(ArchiveError::malformed_path(
            segment,
            "nested or repeated brackets",
        ));
    }

    let inner = inner.trim();
    let selector = if let Some((lo, hi)) = inner.split_once(':') {
        if hi.contains(':') {
            return Err(ArchiveError::malformed_path(
                segment,
                "at most one `:` allowed in a slice",
            ));
        }
        let start = parse_endpoint(segment, lo)?;
        let end = parse_endpoint(segment, hi)?;
        if start.is_none() && end.is_none() {
            Selector::All
        } else {
            Selector::Slice { start, end }
        }
    } else {
        let index = inner
            .parse::<i64>()
            .map_err(|_| ArchiveError::malformed_path(segment, "index is not an integer"))?;
        Selector::Index(index)
    };

    Ok((name, Some(selector)))
}

fn parse_endpoint(segment: &str, text: &str) -> ArchiveResult<Option<i64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<i64>()
        .map(Some)
        .map_err(|_| ArchiveError::malformed_path(segment, "slice endpoint is not an integer"))
}

/// Resolve a possibly-negative index against a sequence length.
///
/// Out-of-bounds indices are `None`; callers omit the entry rather than
/// fail.
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let n = len as i64;
    let resolved = if index < 0 { n + index } else { index };
    if (0..n).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}

/// Resolve a selector to a concrete element range.
///
/// Negative endpoints are relative to `len`, endpoints clamp to
/// `[0, len]`, and an inverted or fully out-of-range slice collapses to
/// the empty range.
pub fn slice_range(selector: Selector, len: usize) -> Range<usize> {
    let n = len as i64;
    let clamp = |endpoint: i64| -> usize {
        let resolved = if endpoint < 0 { n + endpoint } else { endpoint };
        resolved.clamp(0, n) as usize
    };

    match selector {
        Selector::All => 0..len,
        Selector::Index(_) => 0..0,
        Selector::Slice { start, end } => {
            let lo = clamp(start.unwrap_or(0));
            let hi = end.map_or(len, clamp);
            if lo < hi {
                lo..hi
            } else {
                0..0
            }
        }
    }
}

/// Join a path prefix and a child key.
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}/{key}")
    }
}

/// Path for the `i`-th element of the sequence at `prefix`.
pub fn indexed(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

/// Last segment of a path (bracket suffix included).
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Parse a concrete bracket-indexed key (`k[7]`) into its name and index.
///
/// Returns `None` for plain keys, wildcards, and slices — only concrete
/// numeric indices participate in sequence merging.
pub fn bracket_index(key: &str) -> Option<(&str, u64)> {
    let bracket = key.find('[')?;
    if bracket == 0 {
        return None;
    }
    let inner = key[bracket + 1..].strip_suffix(']')?;
    let index = inner.trim().parse::<u64>().ok()?;
    Some((&key[..bracket], index))
}

/// Match a stored path against a query path containing `[:]` wildcards.
///
/// Each wildcard matches exactly one `[<digits>]` occurrence; the match
/// is anchored at both ends.
pub fn wildcard_match(stored: &str, query: &str) -> bool {
    match query.split_once(WILDCARD) {
        None => stored == query,
        Some((head, tail)) => {
            let Some(rest) = stored.strip_prefix(head) else {
                return false;
            };
            let Some(rest) = rest.strip_prefix('[') else {
                return false;
            };
            let Some(close) = rest.find(']') else {
                return false;
            };
            if close == 0 || !rest.as_bytes()[..close].iter().all(u8::is_ascii_digit) {
                return false;
            }
            wildcard_match(&rest[close + 1..], tail)
        }
    }
}
