//! Error types for document tree operations.

use thiserror::Error;

/// Errors produced while canonicalizing keys, validating values, or walking
/// the document tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The key is empty or has a shape that cannot become a path.
    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },

    /// The value holds a leaf or key type outside the storable set.
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },

    /// A list or map contains itself, directly or transitively.
    #[error("cycle detected in list/map value")]
    CyclicStructure,

    /// A segment is absent from its parent container.
    #[error("unable to get {segment:?} from {parent}: not found")]
    NotFound { segment: String, parent: String },

    /// A segment addresses into something that is not a suitable container.
    #[error("unable to get {segment:?} from {parent}: {found} is not indexable by this segment")]
    TypeMismatch {
        segment: String,
        parent: String,
        found: &'static str,
    },
}

impl TreeError {
    pub(crate) fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// Returns `true` for the two lookup failures a containment check
    /// reports as "absent" rather than as an error.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::TypeMismatch { .. })
    }
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
