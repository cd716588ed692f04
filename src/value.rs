//! The recursive, typed configuration value tree (spec component B).
//!
//! Component parameters passed to `initialize`/`query` (spec §6) and the
//! plug-in descriptor metadata all flow through this type. There is no
//! external schema: the core imposes none, per spec.

use crate::object::FreezeFlag;

/// The kind of a [`Value`], exposed for callers that want to branch on
/// shape without a full `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Signed,
    Unsigned,
    Real,
    String,
    Array,
    Map,
}

/// A recursive, typed configuration datum.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Real(f64),
    String(String),
    Array(ValueArray),
    Map(ValueMap),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Signed(_) => ValueKind::Signed,
            Value::Unsigned(_) => ValueKind::Unsigned,
            Value::Real(_) => ValueKind::Real,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_signed(&self) -> Option<i64> {
        match self {
            Value::Signed(v) => Some(*v),
            Value::Unsigned(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Value::Unsigned(v) => Some(*v),
            Value::Signed(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ValueArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Every `Value` variant owns its data outright, so a structural clone
    /// already is a deep copy; this is named to match the spec's
    /// operation list.
    pub fn deep_copy(&self) -> Value {
        self.clone()
    }

    /// Freezes this value and, recursively, every array/map it contains.
    pub fn freeze(&self) {
        match self {
            Value::Array(a) => a.freeze(),
            Value::Map(m) => m.freeze(),
            _ => {}
        }
    }

    pub fn is_frozen(&self) -> bool {
        match self {
            Value::Array(a) => a.is_frozen(),
            Value::Map(m) => m.is_frozen(),
            _ => false,
        }
    }

    /// Right-biased recursive merge: for a map, entries in `other`
    /// overwrite entries in `self` with the same key; nested maps merge
    /// recursively; anything else is a plain overwrite. First-insertion
    /// order of `self`'s existing keys is preserved; keys new to `self`
    /// are appended in `other`'s order.
    pub fn extend(&mut self, other: &Value) {
        match (self, other) {
            (Value::Map(into), Value::Map(from)) => into.extend(from),
            (slot, other) => *slot = other.clone(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Signed(a), Value::Signed(b)) => a == b,
            (Value::Unsigned(a), Value::Unsigned(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.items == b.items,
            (Value::Map(a), Value::Map(b)) => a.entries == b.entries,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Signed(v)
    }
}
impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Unsigned(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// An ordered sequence of values.
#[derive(Debug, Default)]
pub struct ValueArray {
    items: Vec<Value>,
    frozen: FreezeFlag,
}

impl Clone for ValueArray {
    fn clone(&self) -> Self {
        ValueArray {
            items: self.items.clone(),
            frozen: FreezeFlag::new(),
        }
    }
}

impl ValueArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn push(&mut self, value: Value) -> Result<(), crate::object::FrozenError> {
        self.frozen.check_mutable("append to array")?;
        self.items.push(value);
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_frozen()
    }

    pub fn freeze(&self) {
        self.frozen.freeze();
        for item in &self.items {
            item.freeze();
        }
    }
}

impl FromIterator<Value> for ValueArray {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ValueArray {
            items: iter.into_iter().collect(),
            frozen: FreezeFlag::new(),
        }
    }
}

/// A map preserving first-insertion order for iteration (spec §4.2).
#[derive(Debug, Default)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
    frozen: FreezeFlag,
}

impl Clone for ValueMap {
    fn clone(&self) -> Self {
        ValueMap {
            entries: self.entries.clone(),
            frozen: FreezeFlag::new(),
        }
    }
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or overwrites `key`. Overwriting an existing key keeps its
    /// original position; a new key is appended.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), crate::object::FrozenError> {
        self.frozen.check_mutable("insert into map")?;
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, Value)> {
        self.entries.iter()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_frozen()
    }

    pub fn freeze(&self) {
        self.frozen.freeze();
        for (_, value) in &self.entries {
            value.freeze();
        }
    }

    /// Right-biased recursive merge (see [`Value::extend`]).
    pub fn extend(&mut self, other: &ValueMap) {
        for (key, value) in other.iter() {
            match self.entries.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1.extend(value),
                None => self.entries.push((key.clone(), value.clone())),
            }
        }
    }
}

impl FromIterator<(String, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        ValueMap {
            entries: iter.into_iter().collect(),
            frozen: FreezeFlag::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_first_insertion_order() {
        let mut map = ValueMap::new();
        map.insert("b", Value::Signed(2)).unwrap();
        map.insert("a", Value::Signed(1)).unwrap();
        map.insert("b", Value::Signed(20)).unwrap();
        let keys: Vec<_> = map.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&Value::Signed(20)));
    }

    #[test]
    fn extend_merges_maps_recursively_right_biased() {
        let mut base = ValueMap::new();
        base.insert("name", Value::from("src")).unwrap();
        let mut inner = ValueMap::new();
        inner.insert("retries", Value::Unsigned(3)).unwrap();
        base.insert("opts", Value::Map(inner)).unwrap();

        let mut patch = ValueMap::new();
        let mut inner_patch = ValueMap::new();
        inner_patch.insert("retries", Value::Unsigned(5)).unwrap();
        inner_patch.insert("timeout", Value::Unsigned(30)).unwrap();
        patch.insert("opts", Value::Map(inner_patch)).unwrap();
        patch.insert("new_key", Value::Bool(true)).unwrap();

        base.extend(&patch);

        let opts = base.get("opts").unwrap().as_map().unwrap();
        assert_eq!(opts.get("retries"), Some(&Value::Unsigned(5)));
        assert_eq!(opts.get("timeout"), Some(&Value::Unsigned(30)));
        assert_eq!(base.get("new_key"), Some(&Value::Bool(true)));
        assert_eq!(base.get("name"), Some(&Value::from("src")));
    }

    #[test]
    fn freeze_is_recursive_and_rejects_further_mutation() {
        let mut inner = ValueArray::new();
        inner.push(Value::Signed(1)).unwrap();
        let mut map = ValueMap::new();
        map.insert("items", Value::Array(inner)).unwrap();
        let mut value = Value::Map(map);
        value.freeze();
        assert!(value.is_frozen());
        if let Value::Map(m) = &mut value {
            assert!(m.insert("more", Value::Null).is_err());
            if let Some(Value::Array(a)) = m.get("items").map(|v| v.clone()).as_ref() {
                assert!(a.is_frozen());
            }
        }
    }
}
