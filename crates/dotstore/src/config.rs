//! Store construction parameters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Indentation width used when none is configured.
pub const DEFAULT_INDENT: usize = 2;

fn default_indent() -> Option<usize> {
    Some(DEFAULT_INDENT)
}

fn default_auto_commit() -> bool {
    true
}

/// Configuration for a [`Store`](crate::Store).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// The backing JSON file.
    pub path: PathBuf,
    /// Spaces per nesting level in the written file; `None` writes the
    /// whole document on one line. Formatting only.
    #[serde(default = "default_indent")]
    pub indent: Option<usize>,
    /// Persist after every mutation made outside a transaction.
    #[serde(default = "default_auto_commit")]
    pub auto_commit: bool,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            indent: default_indent(),
            auto_commit: default_auto_commit(),
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }

    /// Write the file without newlines or indentation.
    pub fn compact(mut self) -> Self {
        self.indent = None;
        self
    }

    pub fn with_auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    /// Parse a TOML table with `path`, `indent`, and `auto_commit` keys.
    ///
    /// A missing or non-string `path` is an [`StoreError::InvalidArgument`].
    pub fn from_toml_str(source: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| StoreError::InvalidArgument(format!("store config: {}", e.message())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot name a backing file.
    pub fn validate(&self) -> StoreResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StoreError::InvalidArgument(
                "the store path must not be empty".into(),
            ));
        }
        if self.path.is_dir() {
            return Err(StoreError::InvalidArgument(format!(
                "the store path {} is a directory",
                self.path.display()
            )));
        }
        Ok(())
    }
}
