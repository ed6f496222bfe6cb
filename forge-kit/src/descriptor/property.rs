//! Typed property trees for build settings, info plists and entitlements.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key-ordered property map
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A value in a settings, info or entitlements tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(PropertyMap),
}

impl PropertyValue {
    /// Convert untyped plan JSON. `null` has no property equivalent and
    /// yields `None`; nulls inside lists and maps are dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(items) => Some(Self::List(items.iter().filter_map(Self::from_json).collect())),
            Value::Object(fields) => Some(Self::Map(
                fields
                    .iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    pub fn as_map(&self) -> Option<&PropertyMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(value: PropertyMap) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Convert an untyped JSON override map from a plan
pub fn map_from_json(fields: &BTreeMap<String, serde_json::Value>) -> PropertyMap {
    fields
        .iter()
        .filter_map(|(k, v)| PropertyValue::from_json(v).map(|v| (k.clone(), v)))
        .collect()
}

/// Deep-merge `overrides` into `base`.
///
/// Where both sides hold a map the merge recurses; in every other case the
/// override replaces the base value.
pub fn merge_properties(base: &mut PropertyMap, overrides: &PropertyMap) {
    for (key, value) in overrides {
        match (base.get_mut(key), value) {
            (Some(PropertyValue::Map(existing)), PropertyValue::Map(incoming)) => {
                merge_properties(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Set a value at a nested path, creating intermediate maps.
///
/// A non-map value sitting on the path is replaced by a map.
pub fn set_path(map: &mut PropertyMap, path: &[&str], value: PropertyValue) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = map;
    for segment in parents {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| PropertyValue::Map(PropertyMap::new()));
        if !matches!(slot, PropertyValue::Map(_)) {
            *slot = PropertyValue::Map(PropertyMap::new());
        }
        let PropertyValue::Map(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert((*last).to_string(), value);
}

/// Append a string to a list-valued key, skipping duplicates.
///
/// A missing key or a non-list value becomes a one-element list.
pub fn append_unique(map: &mut PropertyMap, key: &str, item: &str) {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| PropertyValue::List(Vec::new()));
    if !matches!(entry, PropertyValue::List(_)) {
        *entry = PropertyValue::List(Vec::new());
    }
    if let PropertyValue::List(items) = entry {
        if !items.iter().any(|v| v.as_str() == Some(item)) {
            items.push(PropertyValue::from(item));
        }
    }
}
