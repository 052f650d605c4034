//! The store facade.

use std::fmt;
use std::path::Path;

use dotstore_tree::{self as tree, materialize_within, Document, Draft, IntoPath, Node};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::persist;
use crate::transaction::{Transaction, TransactionStack};

/// A JSON file exposed as a nested key/value store.
///
/// Values are reached either as attributes (one top-level key) or by path
/// (`"a.b.c"` or an explicit segment list). Every read returns a copy and
/// every write stores a copy, so values handed in or out never alias the
/// document.
///
/// Outside a transaction each successful write is persisted immediately when
/// auto-commit is on. Inside a transaction writes only touch memory until the
/// outermost transaction commits.
pub struct Store {
    config: StoreConfig,
    document: Document,
    transactions: TransactionStack,
}

impl Store {
    /// Open the store at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::with_config(StoreConfig::new(path.as_ref()))
    }

    /// Open a store, creating the backing file if it does not exist.
    pub fn with_config(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let document = persist::load_document(&config.path)?;
        debug!(
            path = %config.path.display(),
            auto_commit = config.auto_commit,
            "opened store"
        );
        Ok(Self {
            config,
            document,
            transactions: TransactionStack::new(),
        })
    }

    // ---------------------------------------------------------------
    // Attribute access
    // ---------------------------------------------------------------

    /// A copy of the top-level value `name`.
    pub fn get_attr(&self, name: &str) -> StoreResult<Node> {
        let path = tree::Path::attribute(name);
        tree::resolve(&self.document, path.segments())
            .cloned()
            .map_err(|_| StoreError::AttributeNotFound(name.to_string()))
    }

    /// Validate `value` and store a copy of it as the top-level value `name`.
    /// The name is taken whole, never split on dots.
    pub fn set_attr(&mut self, name: &str, value: impl Into<Draft>) -> StoreResult<()> {
        self.write(tree::Path::attribute(name), value.into())
    }

    /// Remove the top-level value `name`.
    pub fn delete_attr(&mut self, name: &str) -> StoreResult<()> {
        tree::remove(&mut self.document, &tree::Path::attribute(name))
            .map_err(|_| StoreError::AttributeNotFound(name.to_string()))?;
        self.auto_commit()
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.document.contains_key(name)
    }

    // ---------------------------------------------------------------
    // Path access
    // ---------------------------------------------------------------

    /// A copy of the value at `key`.
    pub fn get(&self, key: impl IntoPath) -> StoreResult<Node> {
        let path = key.into_path()?;
        Ok(tree::resolve(&self.document, path.segments())?.clone())
    }

    /// Store a copy of `value` at `key`.
    ///
    /// Missing intermediates are created as empty mappings. An intermediate
    /// that exists but is not a mapping (a scalar or a sequence) is
    /// overwritten with an empty mapping, losing its previous content.
    /// The value is validated before anything is touched.
    pub fn set(&mut self, key: impl IntoPath, value: impl Into<Draft>) -> StoreResult<()> {
        self.write(key.into_path()?, value.into())
    }

    // The value may only nest as deep as the path leaves room for, so the
    // saved file never exceeds what loading accepts.
    fn write(&mut self, path: tree::Path, value: Draft) -> StoreResult<()> {
        let budget = tree::nesting_budget(&path)?;
        let node = materialize_within(&value, budget)?;
        tree::insert(&mut self.document, &path, node)?;
        self.auto_commit()
    }

    /// Remove the value at `key`. Its parent must exist.
    pub fn delete(&mut self, key: impl IntoPath) -> StoreResult<()> {
        let path = key.into_path()?;
        tree::remove(&mut self.document, &path)?;
        self.auto_commit()
    }

    /// Whether `key` resolves. Only a malformed key is an error.
    pub fn contains(&self, key: impl IntoPath) -> StoreResult<bool> {
        let path = key.into_path()?;
        match tree::resolve(&self.document, path.segments()) {
            Ok(_) => Ok(true),
            Err(e) if e.is_lookup_miss() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Top-level keys in document order.
    pub fn keys(&self) -> Vec<String> {
        self.document.keys().cloned().collect()
    }

    /// The live document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// A copy of the live document.
    pub fn snapshot(&self) -> Document {
        self.document.clone()
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Write the document to the backing file now.
    ///
    /// On failure the in-memory document is kept as is and the file is left
    /// with its previous content, so the call can be retried.
    pub fn commit(&self) -> StoreResult<()> {
        persist::save_document(&self.config.path, &self.document, self.config.indent)
    }

    fn auto_commit(&self) -> StoreResult<()> {
        if self.config.auto_commit && self.transactions.is_empty() {
            self.commit()
        } else {
            Ok(())
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_auto_commit(&self) -> bool {
        self.config.auto_commit
    }

    pub fn set_auto_commit(&mut self, auto_commit: bool) {
        self.config.auto_commit = auto_commit;
    }

    // ---------------------------------------------------------------
    // Transactions
    // ---------------------------------------------------------------

    /// Current transaction nesting depth.
    pub fn depth(&self) -> usize {
        self.transactions.depth()
    }

    pub fn in_transaction(&self) -> bool {
        !self.transactions.is_empty()
    }

    /// Open a transaction. Must be paired with
    /// [`finish_transaction`](Self::finish_transaction) or
    /// [`abort_transaction`](Self::abort_transaction); prefer
    /// [`scope`](Self::scope) or [`transaction`](Self::transaction).
    pub fn begin_transaction(&mut self) {
        self.transactions.enter(&mut self.document);
        debug!(depth = self.transactions.depth(), "transaction begin");
    }

    /// Close the innermost transaction keeping its edits.
    ///
    /// Closing the outermost transaction always persists, regardless of the
    /// auto-commit setting.
    pub fn finish_transaction(&mut self) -> StoreResult<()> {
        let outermost = self.transactions.release()?;
        debug!(depth = self.transactions.depth(), outermost, "transaction commit");
        if outermost {
            self.commit()?;
        }
        Ok(())
    }

    /// Close the innermost transaction discarding its edits.
    pub fn abort_transaction(&mut self) -> StoreResult<()> {
        self.transactions.rollback(&mut self.document)?;
        debug!(depth = self.transactions.depth(), "transaction rollback");
        Ok(())
    }

    /// Open a transaction tied to the returned guard's lifetime.
    pub fn scope(&mut self) -> Transaction<'_> {
        Transaction::begin(self)
    }

    /// Run `body` in a transaction: commit if it returns `Ok`, roll back if
    /// it returns `Err` or panics.
    pub fn transaction<T, E, F>(&mut self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut Store) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut scope = self.scope();
        match body(&mut *scope) {
            Ok(value) => {
                scope.commit()?;
                Ok(value)
            }
            Err(err) => {
                scope.rollback()?;
                Err(err)
            }
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.config.path)
            .field("keys", &self.document.len())
            .field("depth", &self.transactions.depth())
            .field("auto_commit", &self.config.auto_commit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("store.json")).unwrap();
        (dir, store)
    }

    fn on_disk(store: &Store) -> serde_json::Value {
        serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap()
    }

    // -----------------------------------------------------------------------
    // Attributes
    // -----------------------------------------------------------------------

    #[test]
    fn attribute_get_set_delete() {
        let (_dir, mut store) = temp_store();
        store.set_attr("username", "JohnDoe").unwrap();
        assert_eq!(store.get_attr("username").unwrap(), json!("JohnDoe"));
        assert!(store.has_attr("username"));

        store.set_attr("username", "new_value").unwrap();
        assert_eq!(store.get_attr("username").unwrap(), "new_value");

        store.delete_attr("username").unwrap();
        assert!(!store.has_attr("username"));
    }

    #[test]
    fn missing_attribute() {
        let (_dir, mut store) = temp_store();
        assert!(matches!(
            store.get_attr("nope").unwrap_err(),
            StoreError::AttributeNotFound(name) if name == "nope"
        ));
        assert_eq!(
            store.delete_attr("nope").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn attribute_name_is_not_split() {
        let (_dir, mut store) = temp_store();
        store.set_attr("a.b", 1).unwrap();
        assert_eq!(store.keys(), ["a.b"]);
        assert!(!store.contains("a.b").unwrap());
        assert_eq!(store.get(["a.b"]).unwrap(), json!(1));
    }

    #[test]
    fn attribute_set_persists() {
        let (_dir, mut store) = temp_store();
        store.set_attr("count", 3).unwrap();
        assert_eq!(on_disk(&store), json!({"count": 3}));
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    #[test]
    fn path_get_set_delete() {
        let (_dir, mut store) = temp_store();
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap(), "value");

        store.delete("key").unwrap();
        assert_eq!(store.get("key").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn path_set_creates_intermediates() {
        let (_dir, mut store) = temp_store();
        store.set("user.profile.email", "jane@example.com").unwrap();
        assert_eq!(store.get("user.profile.email").unwrap(), "jane@example.com");
        assert_eq!(
            store.get("user").unwrap(),
            json!({"profile": {"email": "jane@example.com"}})
        );
    }

    #[test]
    fn path_set_overwrites_scalar_intermediate() {
        let (_dir, mut store) = temp_store();
        store.set("user", "flat").unwrap();
        store.set("user.name", "Jane").unwrap();
        assert_eq!(store.get("user").unwrap(), json!({"name": "Jane"}));
    }

    #[test]
    fn contains_reports_misses_as_false() {
        let (_dir, mut store) = temp_store();
        store.set("key", "value").unwrap();
        assert!(store.contains("key").unwrap());
        assert!(!store.contains("nonexistent_key").unwrap());
        assert!(!store.contains("key.deeper").unwrap());
        assert_eq!(
            store.contains(Vec::<String>::new()).unwrap_err().kind(),
            ErrorKind::InvalidKey
        );
    }

    #[test]
    fn invalid_key_leaves_document_unchanged() {
        let (_dir, mut store) = temp_store();
        let err = store.set(&Draft::Int(123), "invalid").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
        assert!(store.keys().is_empty());
    }

    #[test]
    fn invalid_value_leaves_document_unchanged() {
        let (_dir, mut store) = temp_store();
        let err = store
            .set("user.name", Draft::Bytes(vec![1, 2, 3]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(!store.contains("user").unwrap());
        assert_eq!(on_disk(&store), json!({}));
    }

    #[test]
    fn delete_under_scalar_is_type_mismatch() {
        let (_dir, mut store) = temp_store();
        store.set("age", 30).unwrap();
        assert_eq!(
            store.delete("age.years").unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn sequence_elements_are_addressable() {
        let (_dir, mut store) = temp_store();
        store.set("tags", vec!["a", "b", "c"]).unwrap();
        assert_eq!(store.get("tags.1").unwrap(), "b");
        store.delete("tags.0").unwrap();
        assert_eq!(store.get("tags").unwrap(), json!(["b", "c"]));
        assert!(!store.contains("tags.5").unwrap());
    }

    #[test]
    fn reopen_sees_committed_data() {
        let (dir, mut store) = temp_store();
        store.set("user.email", "jane@example.com").unwrap();
        drop(store);

        let reopened = Store::open(dir.path().join("store.json")).unwrap();
        assert_eq!(reopened.get("user.email").unwrap(), "jane@example.com");
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    #[test]
    fn explicit_transaction_commit() {
        let (_dir, mut store) = temp_store();
        store.begin_transaction();
        assert!(store.in_transaction());
        store.set("user.age", 30).unwrap();
        assert_eq!(on_disk(&store), json!({}));

        store.finish_transaction().unwrap();
        assert_eq!(store.depth(), 0);
        assert_eq!(on_disk(&store), json!({"user": {"age": 30}}));
    }

    #[test]
    fn explicit_transaction_abort() {
        let (_dir, mut store) = temp_store();
        store.set("keep", true).unwrap();
        store.begin_transaction();
        store.set("user.age", 30).unwrap();
        store.delete("keep").unwrap();
        store.abort_transaction().unwrap();

        assert!(!store.contains("user.age").unwrap());
        assert_eq!(store.get("keep").unwrap(), json!(true));
    }

    #[test]
    fn finish_without_begin_fails() {
        let (_dir, mut store) = temp_store();
        assert_eq!(
            store.finish_transaction().unwrap_err().kind(),
            ErrorKind::NoActiveTransaction
        );
        assert_eq!(
            store.abort_transaction().unwrap_err().kind(),
            ErrorKind::NoActiveTransaction
        );
    }

    #[test]
    fn dropped_scope_rolls_back() {
        let (_dir, mut store) = temp_store();
        {
            let mut scope = store.scope();
            scope.set_attr("temp_value", "Temporary").unwrap();
            assert_eq!(scope.get_attr("temp_value").unwrap(), "Temporary");
        }
        assert!(!store.has_attr("temp_value"));
        assert!(!store.in_transaction());
    }

    #[test]
    fn scope_commit_keeps_edits() {
        let (_dir, mut store) = temp_store();
        let mut scope = store.scope();
        scope.set("x", 1).unwrap();
        scope.commit().unwrap();
        assert_eq!(store.get("x").unwrap(), json!(1));
        assert_eq!(on_disk(&store), json!({"x": 1}));
    }

    #[test]
    fn closure_transaction_rolls_back_on_err() {
        let (_dir, mut store) = temp_store();
        let result: StoreResult<()> = store.transaction(|s| {
            s.set("user.age", 30)?;
            s.get("missing")?;
            Ok(())
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(!store.contains("user.age").unwrap());
    }

    #[test]
    fn closure_transaction_returns_value() {
        let (_dir, mut store) = temp_store();
        let age = store
            .transaction(|s| -> StoreResult<_> {
                s.set("user.age", 30)?;
                s.get("user.age")
            })
            .unwrap();
        assert_eq!(age, json!(30));
        assert_eq!(on_disk(&store), json!({"user": {"age": 30}}));
    }

    #[test]
    fn snapshot_is_detached_copy() {
        let (_dir, mut store) = temp_store();
        store.set("a", 1).unwrap();
        let mut snapshot = store.snapshot();
        snapshot.insert("b".into(), json!(2));

        assert_eq!(&snapshot["a"], &json!(1));
        assert!(!store.has_attr("b"));
        assert_eq!(store.document().len(), 1);
    }

    #[test]
    fn config_and_auto_commit_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let config = StoreConfig::new(&path).with_indent(4).with_auto_commit(false);
        let mut store = Store::with_config(config).unwrap();

        assert_eq!(store.config().path, path);
        assert_eq!(store.config().indent, Some(4));
        assert!(!store.is_auto_commit());

        store.set("x", 1).unwrap();
        assert_eq!(on_disk(&store), json!({}));

        store.set_auto_commit(true);
        assert!(store.is_auto_commit());
        assert!(store.config().auto_commit);
        store.set("y", 2).unwrap();
        assert_eq!(on_disk(&store), json!({"x": 1, "y": 2}));
    }

    #[test]
    fn attribute_writes_respect_nesting_budget() {
        let (_dir, mut store) = temp_store();
        let deepest = (1..tree::MAX_NESTING).fold(json!(0), |inner, _| json!([inner]));
        store.set_attr("deep", deepest.clone()).unwrap();
        assert_eq!(store.get_attr("deep").unwrap(), deepest);

        let err = store.set_attr("deeper", json!([deepest])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(!store.has_attr("deeper"));
    }

    #[test]
    fn debug_is_summary() {
        let (_dir, mut store) = temp_store();
        store.set("a", 1).unwrap();
        let shown = format!("{store:?}");
        assert!(shown.contains("keys: 1"));
        assert!(shown.contains("depth: 0"));
    }
}
