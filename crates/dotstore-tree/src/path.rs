//! Canonical dotted paths.
//!
//! A key is either a string, split on `.` into segments, or an explicit
//! non-empty sequence of segments taken verbatim. Splitting keeps empty
//! segments, so `".a"` is `["", "a"]` and `"a..b"` is `["a", "", "b"]`.

use std::fmt;

use serde_json::Value;

use crate::draft::Draft;
use crate::error::{TreeError, TreeResult};

/// Segment delimiter for string keys.
pub const DELIMITER: char = '.';

/// An ordered, non-empty sequence of string segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Split a dotted string into a path. Never fails: the empty string is
    /// the single empty segment.
    pub fn parse(key: &str) -> Self {
        Self {
            segments: key.split(DELIMITER).map(str::to_owned).collect(),
        }
    }

    /// Take an explicit sequence of segments verbatim.
    pub fn from_segments<I, S>(segments: I) -> TreeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(TreeError::invalid_key(
                "key must be a string or a non-empty sequence of segments",
            ));
        }
        Ok(Self { segments })
    }

    /// A single-segment path, used for attribute-style access.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; kept for parity with `len`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The parent segments and the terminal segment.
    pub fn split_last(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((leaf, parent)) => (parent, leaf.as_str()),
            None => (&[], ""),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Render a (possibly empty) run of segments for error messages.
pub(crate) fn render(segments: &[String]) -> String {
    if segments.is_empty() {
        "<root>".to_string()
    } else {
        format!("{:?}", segments.join("."))
    }
}

/// Anything that can be canonicalized into a [`Path`].
pub trait IntoPath {
    fn into_path(self) -> TreeResult<Path>;
}

impl IntoPath for Path {
    fn into_path(self) -> TreeResult<Path> {
        Ok(self)
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> TreeResult<Path> {
        Ok(self.clone())
    }
}

impl IntoPath for &str {
    fn into_path(self) -> TreeResult<Path> {
        Ok(Path::parse(self))
    }
}

impl IntoPath for String {
    fn into_path(self) -> TreeResult<Path> {
        Ok(Path::parse(&self))
    }
}

impl IntoPath for &String {
    fn into_path(self) -> TreeResult<Path> {
        Ok(Path::parse(self))
    }
}

impl IntoPath for Vec<String> {
    fn into_path(self) -> TreeResult<Path> {
        Path::from_segments(self)
    }
}

impl IntoPath for Vec<&str> {
    fn into_path(self) -> TreeResult<Path> {
        Path::from_segments(self)
    }
}

impl IntoPath for &[&str] {
    fn into_path(self) -> TreeResult<Path> {
        Path::from_segments(self.iter().copied())
    }
}

impl IntoPath for &[String] {
    fn into_path(self) -> TreeResult<Path> {
        Path::from_segments(self.iter().cloned())
    }
}

impl<const N: usize> IntoPath for [&str; N] {
    fn into_path(self) -> TreeResult<Path> {
        Path::from_segments(self)
    }
}

/// Dynamic keys: a string, or a list whose items are all strings.
impl IntoPath for &Draft {
    fn into_path(self) -> TreeResult<Path> {
        match self {
            Draft::Str(key) => Ok(Path::parse(key)),
            Draft::List(items) => {
                let items = items.borrow();
                let segments = items
                    .iter()
                    .map(|item| match item {
                        Draft::Str(segment) => Ok(segment.clone()),
                        other => Err(TreeError::invalid_key(format!(
                            "path segment must be a string, got {}",
                            other.type_name()
                        ))),
                    })
                    .collect::<TreeResult<Vec<_>>>()?;
                Path::from_segments(segments)
            }
            other => Err(TreeError::invalid_key(format!(
                "key must be a string or a non-empty sequence of segments, got {}",
                other.type_name()
            ))),
        }
    }
}

impl IntoPath for &Value {
    fn into_path(self) -> TreeResult<Path> {
        match self {
            Value::String(key) => Ok(Path::parse(key)),
            Value::Array(items) => {
                let segments = items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_owned).ok_or_else(|| {
                            TreeError::invalid_key("path segment must be a string")
                        })
                    })
                    .collect::<TreeResult<Vec<_>>>()?;
                Path::from_segments(segments)
            }
            _ => Err(TreeError::invalid_key(
                "key must be a string or a non-empty sequence of segments",
            )),
        }
    }
}
