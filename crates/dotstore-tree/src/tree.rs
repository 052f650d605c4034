//! Traversal and mutation of the document tree.
//!
//! Reads walk segments left to right: a mapping is indexed by key, a
//! sequence by a non-negative decimal index, and anything else is a
//! [`TreeError::TypeMismatch`]. Writes never fail on the way down; a missing
//! or non-mapping intermediate is replaced with an empty mapping, discarding
//! whatever scalar or sequence was there.
//!
//! Sequence indexing is an extension over plain string-key traversal: a
//! decimal segment such as `tags.0` reaches into a list on reads, membership
//! checks and deletes, where a purely key-based walk would treat any step
//! into a list as a type mismatch. Writes do not index.
//!
//! A document may nest at most [`MAX_NESTING`] containers deep, counting the
//! root, which is as deep as the backing file can be parsed back.

use serde_json::{Map, Value};

use crate::error::{TreeError, TreeResult};
use crate::path::{render, Path};

/// A stored value.
pub type Node = Value;

/// The root container: an insertion-ordered mapping.
pub type Document = Map<String, Value>;

/// Deepest container nesting a document may reach, root included.
///
/// `serde_json` refuses input nested 128 levels or more, so anything deeper
/// would save fine and then fail to load.
pub const MAX_NESTING: usize = 127;

/// How many container levels a value stored at `path` may add itself.
///
/// The root and every parent segment each account for one level.
pub fn nesting_budget(path: &Path) -> TreeResult<usize> {
    MAX_NESTING.checked_sub(path.len()).ok_or_else(|| {
        TreeError::invalid_key(format!(
            "path has {} segments, more than the {MAX_NESTING} levels a document may nest",
            path.len()
        ))
    })
}

fn kind_of(node: &Node) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

fn not_found(segment: &str, walked: &[String]) -> TreeError {
    TreeError::NotFound {
        segment: segment.to_string(),
        parent: render(walked),
    }
}

fn mismatch(segment: &str, walked: &[String], found: &'static str) -> TreeError {
    TreeError::TypeMismatch {
        segment: segment.to_string(),
        parent: render(walked),
        found,
    }
}

fn parse_index(segment: &str, walked: &[String]) -> TreeResult<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(mismatch(segment, walked, "sequence"));
    }
    // All digits but too large for usize: cannot be in range.
    segment
        .parse::<usize>()
        .map_err(|_| not_found(segment, walked))
}

fn child<'a>(node: &'a Node, segment: &str, walked: &[String]) -> TreeResult<&'a Node> {
    match node {
        Value::Object(map) => map.get(segment).ok_or_else(|| not_found(segment, walked)),
        Value::Array(items) => {
            let index = parse_index(segment, walked)?;
            items.get(index).ok_or_else(|| not_found(segment, walked))
        }
        other => Err(mismatch(segment, walked, kind_of(other))),
    }
}

fn child_mut<'a>(
    node: &'a mut Node,
    segment: &str,
    walked: &[String],
) -> TreeResult<&'a mut Node> {
    match node {
        Value::Object(map) => map
            .get_mut(segment)
            .ok_or_else(|| not_found(segment, walked)),
        Value::Array(items) => {
            let index = parse_index(segment, walked)?;
            items
                .get_mut(index)
                .ok_or_else(|| not_found(segment, walked))
        }
        other => Err(mismatch(segment, walked, kind_of(other))),
    }
}

/// Find the node at `segments`. The slice must be non-empty.
pub fn resolve<'a>(doc: &'a Document, segments: &[String]) -> TreeResult<&'a Node> {
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| TreeError::invalid_key("cannot resolve an empty path"))?;
    let mut node = doc.get(first).ok_or_else(|| not_found(first, &[]))?;
    for (depth, segment) in rest.iter().enumerate() {
        node = child(node, segment, &segments[..=depth])?;
    }
    Ok(node)
}

/// Mutable counterpart of [`resolve`].
pub fn resolve_mut<'a>(doc: &'a mut Document, segments: &[String]) -> TreeResult<&'a mut Node> {
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| TreeError::invalid_key("cannot resolve an empty path"))?;
    let mut node = doc.get_mut(first).ok_or_else(|| not_found(first, &[]))?;
    for (depth, segment) in rest.iter().enumerate() {
        node = child_mut(node, segment, &segments[..=depth])?;
    }
    Ok(node)
}

/// Store `value` at `path`, creating or overwriting intermediate mappings.
///
/// Returns the node previously at the terminal segment, if any. Any
/// intermediate that is not a mapping is replaced by an empty mapping.
pub fn insert(doc: &mut Document, path: &Path, value: Node) -> TreeResult<Option<Node>> {
    let (parents, leaf) = path.split_last();
    let mut container = doc;
    for (depth, segment) in parents.iter().enumerate() {
        let slot = container
            .entry(segment.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        container = slot
            .as_object_mut()
            .ok_or_else(|| mismatch(segment, &parents[..depth], "non-mapping"))?;
    }
    Ok(container.insert(leaf.to_string(), value))
}

/// Detach and return the node at `path`.
///
/// The parent must resolve; the terminal segment must be present in it.
pub fn remove(doc: &mut Document, path: &Path) -> TreeResult<Node> {
    let (parents, leaf) = path.split_last();
    if parents.is_empty() {
        return doc.shift_remove(leaf).ok_or_else(|| not_found(leaf, &[]));
    }
    match resolve_mut(doc, parents)? {
        Value::Object(map) => map
            .shift_remove(leaf)
            .ok_or_else(|| not_found(leaf, parents)),
        Value::Array(items) => {
            let index = parse_index(leaf, parents)?;
            if index < items.len() {
                Ok(items.remove(index))
            } else {
                Err(not_found(leaf, parents))
            }
        }
        other => Err(mismatch(leaf, parents, kind_of(other))),
    }
}
