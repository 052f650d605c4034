//! Document tree for dotstore.
//!
//! This crate holds everything that operates on the in-memory document and
//! nothing that touches the filesystem:
//!
//! - [`Node`] / [`Document`] -- the stored tree, an insertion-ordered JSON
//!   object at the root
//! - [`Draft`] -- a candidate value handed to a write; it may share
//!   containers, form cycles, or carry unsupported leaves
//! - [`validate`] / [`materialize`] -- the type whitelist, cycle check and
//!   nesting bound that every write passes before the document is touched
//! - [`Path`] / [`IntoPath`] -- canonical dotted paths
//! - [`resolve`], [`insert`], [`remove`] -- traversal and mutation
//!
//! # Rules
//!
//! 1. Reads hand out clones; nothing returned aliases the document.
//! 2. Validation runs to completion before any mutation.
//! 3. Write traversal replaces non-mapping intermediates with empty mappings.

pub mod draft;
pub mod error;
pub mod path;
pub mod tree;

pub use draft::{materialize, materialize_within, validate, validate_within, Draft};
pub use error::{TreeError, TreeResult};
pub use path::{IntoPath, Path};
pub use tree::{
    insert, nesting_budget, remove, resolve, resolve_mut, Document, Node, MAX_NESTING,
};
