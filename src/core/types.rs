// ============================================================================
// cirkit - Core Types
// Signal keys and the payload shapes collections put on the bus
// ============================================================================

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::SEGMENT_SEPARATOR;
use super::error::{CircuitError, Result};

// =============================================================================
// SIGNAL KEY
// =============================================================================

/// A hierarchical signal name such as `"todos.+"` or `"app.colors.item.click"`.
///
/// Keys are shared strings, so cloning one into a slot or a queue entry never
/// copies the text.
///
/// # Example
///
/// ```
/// use cirkit::SignalKey;
///
/// let colors = SignalKey::new("app.colors");
/// let click = colors.child("item.click");
/// assert_eq!(click.as_str(), "app.colors.item.click");
/// assert_eq!(click.last_segment(), "click");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalKey(Rc<str>);

impl SignalKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Rc::from(key.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append one or more segments: `a.b` + `c` = `a.b.c`.
    pub fn child(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            return Self::new(segment);
        }
        Self::new(format!("{}{}{}", self.0, SEGMENT_SEPARATOR, segment))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEGMENT_SEPARATOR)
    }

    pub fn last_segment(&self) -> &str {
        self.0
            .rsplit_once(SEGMENT_SEPARATOR)
            .map_or(&*self.0, |(_, last)| last)
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalKey({:?})", &*self.0)
    }
}

impl AsRef<str> for SignalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SignalKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SignalKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SignalKey {
    fn from(key: String) -> Self {
        Self(Rc::from(key))
    }
}

impl From<&String> for SignalKey {
    fn from(key: &String) -> Self {
        Self::new(key)
    }
}

impl From<&SignalKey> for SignalKey {
    fn from(key: &SignalKey) -> Self {
        key.clone()
    }
}

impl PartialEq<str> for SignalKey {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for SignalKey {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

// =============================================================================
// PAYLOAD SHAPES
// =============================================================================

/// Payload of the add and overwrite signals: an item and its position.
///
/// The index is positional. Any later insert or delete before it moves the
/// item to a different index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedItem<T> {
    pub index: usize,
    pub item: T,
}

/// Payload of the `.sel` signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub selected: bool,
}

/// Decode a bus payload into a typed value.
pub fn decode<T: DeserializeOwned>(payload: &Value) -> Result<T> {
    Ok(T::deserialize(payload)?)
}

/// Read an item index out of a payload.
///
/// Accepts a bare number or an object with an `index` field. `null` and
/// negative numbers mean "no index", following the `-1` convention for an
/// empty selection.
pub fn decode_index(payload: &Value) -> Result<Option<usize>> {
    match payload {
        Value::Null => Ok(None),
        Value::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(index), _) => Ok(Some(index as usize)),
            (None, Some(negative)) if negative < 0 => Ok(None),
            _ => Err(CircuitError::slot("index", format!("not an index: {n}"))),
        },
        Value::Object(fields) => match fields.get("index") {
            Some(inner) => decode_index(inner),
            None => Ok(None),
        },
        other => Err(CircuitError::slot("index", format!("not an index: {other}"))),
    }
}
