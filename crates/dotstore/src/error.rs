//! Error types for store operations.

use std::io;
use std::path::PathBuf;

use dotstore_tree::TreeError;
use thiserror::Error;

/// Errors produced by the store facade, persistence, and transactions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store was constructed with an unusable configuration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Creating, reading, writing, or renaming the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing file does not hold a JSON object.
    #[error("corrupt store {path}: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    /// Attribute-style access named a top-level key that does not exist.
    #[error("store has no attribute {0:?}")]
    AttributeNotFound(String),

    /// A transaction exit was requested with no transaction open.
    #[error("no transaction is active")]
    NoActiveTransaction,

    /// Key, value, or traversal failure from the document tree.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The flat classification of this error, independent of the layer
    /// that raised it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Io { .. } => ErrorKind::IoFailure,
            Self::CorruptStore { .. } => ErrorKind::CorruptStore,
            Self::AttributeNotFound(_) => ErrorKind::NotFound,
            Self::NoActiveTransaction => ErrorKind::NoActiveTransaction,
            Self::Tree(err) => match err {
                TreeError::InvalidKey { .. } => ErrorKind::InvalidKey,
                TreeError::InvalidValue { .. } => ErrorKind::InvalidValue,
                TreeError::CyclicStructure => ErrorKind::CyclicStructure,
                TreeError::NotFound { .. } => ErrorKind::NotFound,
                TreeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            },
        }
    }
}

/// Error classification shared by every store operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    IoFailure,
    CorruptStore,
    InvalidKey,
    InvalidValue,
    CyclicStructure,
    NotFound,
    TypeMismatch,
    NoActiveTransaction,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
