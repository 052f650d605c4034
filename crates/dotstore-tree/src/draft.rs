//! Candidate values and the value validator.
//!
//! A [`Draft`] is what callers hand to a write. Its containers are
//! reference-counted, so one list or map may be reachable from several
//! places, including from inside itself. Before anything is stored the
//! draft is walked once by [`validate`], which enforces the type whitelist
//! and rejects any container that reappears on its own ancestor chain.
//! Only then does [`materialize`] copy it into an owned [`Node`].
//!
//! The walk also bounds container nesting, so that a stored value can always
//! be read back from the backing file (see [`MAX_NESTING`]).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Number, Value};

use crate::error::{TreeError, TreeResult};
use crate::tree::{Node, MAX_NESTING};

/// Shared list storage.
pub type ListCell = Rc<RefCell<Vec<Draft>>>;

/// Shared map storage. Keys are drafts so that non-string keys can be
/// expressed and rejected.
pub type MapCell = Rc<RefCell<Vec<(Draft, Draft)>>>;

/// A value offered for storage.
#[derive(Clone)]
pub enum Draft {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    /// Raw bytes. Never storable; present so callers can represent leaves
    /// outside the whitelist.
    Bytes(Vec<u8>),
    List(ListCell),
    Map(MapCell),
}

impl Draft {
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Draft>,
    {
        Draft::List(Rc::new(RefCell::new(
            items.into_iter().map(Into::into).collect(),
        )))
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Draft>,
        V: Into<Draft>,
    {
        Draft::Map(Rc::new(RefCell::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )))
    }

    pub fn empty_list() -> Self {
        Draft::List(Rc::default())
    }

    pub fn empty_map() -> Self {
        Draft::Map(Rc::default())
    }

    /// Append to a list draft. Clones of `self` share the same storage, so
    /// pushing a clone of a list into itself builds a cycle.
    pub fn push(&self, item: impl Into<Draft>) -> TreeResult<()> {
        match self {
            Draft::List(items) => {
                items.borrow_mut().push(item.into());
                Ok(())
            }
            other => Err(TreeError::invalid_value(format!(
                "cannot push onto {}",
                other.type_name()
            ))),
        }
    }

    /// Add an entry to a map draft.
    pub fn insert(&self, key: impl Into<Draft>, value: impl Into<Draft>) -> TreeResult<()> {
        match self {
            Draft::Map(entries) => {
                entries.borrow_mut().push((key.into(), value.into()));
                Ok(())
            }
            other => Err(TreeError::invalid_value(format!(
                "cannot insert into {}",
                other.type_name()
            ))),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Draft::Null => "null",
            Draft::Bool(_) => "bool",
            Draft::Int(_) | Draft::UInt(_) => "integer",
            Draft::Float(_) => "float",
            Draft::Str(_) => "string",
            Draft::Bytes(_) => "bytes",
            Draft::List(_) => "list",
            Draft::Map(_) => "map",
        }
    }

    fn identity(&self) -> Option<*const ()> {
        match self {
            Draft::List(items) => Some(Rc::as_ptr(items).cast()),
            Draft::Map(entries) => Some(Rc::as_ptr(entries).cast()),
            _ => None,
        }
    }
}

/// Check that `value` is storable.
///
/// Leaves must be null, bool, integer, finite float, or string; map keys
/// must be strings. The walk keeps the identities of the containers on the
/// current ancestor chain, so a container shared between siblings is fine
/// while one nested inside itself is a [`TreeError::CyclicStructure`].
///
/// Containers may nest at most [`MAX_NESTING`] levels.
pub fn validate(value: &Draft) -> TreeResult<()> {
    validate_within(value, MAX_NESTING)
}

/// [`validate`] with an explicit bound on container nesting. A scalar needs
/// no levels, `[]` needs one, `[[]]` two.
pub fn validate_within(value: &Draft, max_depth: usize) -> TreeResult<()> {
    let mut ancestors = Vec::new();
    walk(value, &mut ancestors, max_depth)
}

fn walk(value: &Draft, ancestors: &mut Vec<*const ()>, max_depth: usize) -> TreeResult<()> {
    if let Some(id) = value.identity() {
        if ancestors.contains(&id) {
            return Err(TreeError::CyclicStructure);
        }
        ancestors.push(id);
        if ancestors.len() > max_depth {
            return Err(TreeError::invalid_value(format!(
                "value nests deeper than {max_depth} levels"
            )));
        }
    }

    match value {
        Draft::List(items) => {
            for item in items.borrow().iter() {
                walk(item, ancestors, max_depth)?;
            }
        }
        Draft::Map(entries) => {
            for (key, item) in entries.borrow().iter() {
                if !matches!(key, Draft::Str(_)) {
                    return Err(TreeError::invalid_value(format!(
                        "map has a non-string key of type {}",
                        key.type_name()
                    )));
                }
                walk(item, ancestors, max_depth)?;
            }
        }
        Draft::Float(f) if !f.is_finite() => {
            return Err(TreeError::invalid_value(format!(
                "non-finite float {f} cannot be stored"
            )));
        }
        Draft::Bytes(_) => {
            return Err(TreeError::invalid_value("bytes cannot be stored"));
        }
        _ => {}
    }

    if value.identity().is_some() {
        ancestors.pop();
    }
    Ok(())
}

/// Validate `value` and copy it into an owned node sharing nothing with the
/// draft.
pub fn materialize(value: &Draft) -> TreeResult<Node> {
    materialize_within(value, MAX_NESTING)
}

/// [`materialize`] with an explicit bound on container nesting.
pub fn materialize_within(value: &Draft, max_depth: usize) -> TreeResult<Node> {
    validate_within(value, max_depth)?;
    Ok(to_node(value))
}

// Only called on validated drafts: no cycles, only whitelisted shapes.
fn to_node(value: &Draft) -> Node {
    match value {
        Draft::Null | Draft::Bytes(_) => Value::Null,
        Draft::Bool(b) => Value::Bool(*b),
        Draft::Int(i) => Value::from(*i),
        Draft::UInt(u) => Value::from(*u),
        Draft::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Draft::Str(s) => Value::String(s.clone()),
        Draft::List(items) => Value::Array(items.borrow().iter().map(to_node).collect()),
        Draft::Map(entries) => {
            let mut map = Map::new();
            for (key, item) in entries.borrow().iter() {
                if let Draft::Str(key) = key {
                    map.insert(key.clone(), to_node(item));
                }
            }
            Value::Object(map)
        }
    }
}

impl fmt::Debug for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn go(
            value: &Draft,
            seen: &mut Vec<*const ()>,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            if let Some(id) = value.identity() {
                if seen.contains(&id) {
                    return f.write_str("<cycle>");
                }
                seen.push(id);
            }
            let res = match value {
                Draft::Null => f.write_str("Null"),
                Draft::Bool(b) => write!(f, "Bool({b})"),
                Draft::Int(i) => write!(f, "Int({i})"),
                Draft::UInt(u) => write!(f, "UInt({u})"),
                Draft::Float(x) => write!(f, "Float({x})"),
                Draft::Str(s) => write!(f, "Str({s:?})"),
                Draft::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
                Draft::List(items) => {
                    f.write_str("[")?;
                    for (i, item) in items.borrow().iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        go(item, seen, f)?;
                    }
                    f.write_str("]")
                }
                Draft::Map(entries) => {
                    f.write_str("{")?;
                    for (i, (key, item)) in entries.borrow().iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        go(key, seen, f)?;
                        f.write_str(": ")?;
                        go(item, seen, f)?;
                    }
                    f.write_str("}")
                }
            };
            if value.identity().is_some() {
                seen.pop();
            }
            res
        }

        go(self, &mut Vec::new(), f)
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<()> for Draft {
    fn from(_: ()) -> Self {
        Draft::Null
    }
}

impl From<bool> for Draft {
    fn from(b: bool) -> Self {
        Draft::Bool(b)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Draft {
            fn from(i: $t) -> Self {
                Draft::Int(i64::from(i))
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Draft {
            fn from(u: $t) -> Self {
                Draft::UInt(u64::from(u))
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<usize> for Draft {
    fn from(u: usize) -> Self {
        Draft::UInt(u as u64)
    }
}

impl From<f32> for Draft {
    fn from(x: f32) -> Self {
        Draft::Float(f64::from(x))
    }
}

impl From<f64> for Draft {
    fn from(x: f64) -> Self {
        Draft::Float(x)
    }
}

impl From<&str> for Draft {
    fn from(s: &str) -> Self {
        Draft::Str(s.to_owned())
    }
}

impl From<String> for Draft {
    fn from(s: String) -> Self {
        Draft::Str(s)
    }
}

impl From<&String> for Draft {
    fn from(s: &String) -> Self {
        Draft::Str(s.clone())
    }
}

impl<T: Into<Draft>> From<Vec<T>> for Draft {
    fn from(items: Vec<T>) -> Self {
        Draft::list(items)
    }
}

impl<T: Into<Draft>> From<Option<T>> for Draft {
    fn from(value: Option<T>) -> Self {
        value.map_or(Draft::Null, Into::into)
    }
}

impl From<&Value> for Draft {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Draft::Null,
            Value::Bool(b) => Draft::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Draft::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Draft::UInt(u)
                } else {
                    Draft::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Draft::Str(s.clone()),
            Value::Array(items) => Draft::list(items.iter().map(Draft::from)),
            Value::Object(map) => {
                Draft::map(map.iter().map(|(k, v)| (Draft::from(k), Draft::from(v))))
            }
        }
    }
}

impl From<Value> for Draft {
    fn from(value: Value) -> Self {
        Draft::from(&value)
    }
}
