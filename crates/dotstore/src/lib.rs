//! Durable, dotted-path-addressable key/value store backed by one JSON file.
//!
//! A [`Store`] loads the whole file into memory as an insertion-ordered JSON
//! object and exposes it two ways:
//!
//! - **attributes** -- [`Store::get_attr`], [`Store::set_attr`],
//!   [`Store::delete_attr`] address one top-level key, verbatim
//! - **paths** -- [`Store::get`], [`Store::set`], [`Store::delete`],
//!   [`Store::contains`] take `"a.b.c"` or an explicit segment list
//!
//! Writes are validated (type whitelist and cycle check) before the document
//! is touched, and persisted by writing `<path>~` and renaming it over the
//! backing file.
//!
//! # Transactions
//!
//! [`Store::scope`] returns a [`Transaction`] guard; [`Store::transaction`]
//! wraps a closure. Edits inside a transaction stay in memory. Committing the
//! outermost transaction persists; a failure, or dropping the guard,
//! restores the document as it was on entry.
//!
//! ```no_run
//! use dotstore::{Store, StoreResult};
//!
//! fn main() -> StoreResult<()> {
//!     let mut store = Store::open("data.json")?;
//!     store.set("user.name", "Jane")?;
//!
//!     store.transaction(|s| -> StoreResult<()> {
//!         s.set("user.age", 30)?;
//!         s.set("user.email", "jane@example.com")
//!     })?;
//!
//!     assert!(store.contains("user.age")?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod persist;
pub mod store;
pub mod transaction;

pub use config::{StoreConfig, DEFAULT_INDENT};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use store::Store;
pub use transaction::{Snapshot, Transaction, TransactionStack};

// Re-export the tree types that appear in the facade's signatures.
pub use dotstore_tree::{Document, Draft, IntoPath, Node, Path, TreeError, MAX_NESTING};
