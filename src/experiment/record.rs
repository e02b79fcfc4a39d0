//! Normalized run record

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::backend::{ARTIFACTS_KEY, CAPTURED_OUT_KEY, CONFIG_KEY, INFO_KEY};
use crate::codec::{decode, encode, Value};
use crate::store::Document;
use crate::{Error, Result};

/// A run document with every tagged value decoded.
///
/// Returned by value from
/// [`ExperimentRecord::get_record`](super::ExperimentRecord::get_record), so
/// changes to it never reach the handle. Also used as the change set for
/// [`ExperimentRecord::update_record`](super::ExperimentRecord::update_record).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw run document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] for malformed tagged values.
    pub fn from_document(document: &Document) -> Result<Self> {
        Self::try_from(decode(&serde_json::Value::Object(document.clone()))?)
    }

    /// Encode back into document form.
    #[must_use]
    pub fn to_document(&self) -> Document {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), encode(value)))
            .collect()
    }

    /// Look up a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a top-level field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// True if the field is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Field names in order.
    pub fn keys(&self) -> btree_map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// The `config` sub-mapping.
    #[must_use]
    pub fn config(&self) -> Option<&BTreeMap<String, Value>> {
        self.get(CONFIG_KEY).and_then(Value::as_map)
    }

    /// The `info` sub-mapping.
    #[must_use]
    pub fn info(&self) -> Option<&BTreeMap<String, Value>> {
        self.get(INFO_KEY).and_then(Value::as_map)
    }

    /// Captured stdout/stderr of the run.
    #[must_use]
    pub fn captured_out(&self) -> Option<&str> {
        self.get(CAPTURED_OUT_KEY).and_then(Value::as_str)
    }

    /// The `artifacts` field as stored: `{name, file_id}` maps or plain names.
    #[must_use]
    pub fn artifacts(&self) -> Option<&[Value]> {
        self.get(ARTIFACTS_KEY).and_then(Value::as_slice)
    }

    /// Overwrite fields with those of `changes`; other fields are kept.
    pub fn merge(&mut self, changes: Self) {
        self.0.extend(changes.0);
    }

    /// Unwrap into the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => Ok(Self(map)),
            other => Err(Error::DecodeError(format!(
                "run record must be a mapping, got {other:?}"
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_document_decodes() {
        let doc = json!({
            "config": {"shape": {"py/tuple": [2, 3]}},
            "info": {},
            "captured_out": "ok",
            "artifacts": ["a.txt"]
        });
        let record = Record::from_document(doc.as_object().unwrap()).unwrap();
        assert_eq!(
            record.config().unwrap()["shape"],
            Value::Tuple(vec![Value::Int(2), Value::Int(3)])
        );
        assert_eq!(record.captured_out(), Some("ok"));
        assert_eq!(record.artifacts().unwrap().len(), 1);
        assert!(record.info().unwrap().is_empty());
    }

    #[test]
    fn test_merge_overwrites_shallow() {
        let mut record: Record = [("status", "RUNNING"), ("host", "a")].into_iter().collect();
        record.merge([("status", "done")].into_iter().collect());
        assert_eq!(record.get("status"), Some(&Value::from("done")));
        assert_eq!(record.get("host"), Some(&Value::from("a")));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_non_mapping_rejected() {
        assert!(Record::try_from(Value::Int(1)).unwrap_err().is_decode());
    }

    #[test]
    fn test_document_round_trip() {
        let doc = json!({"a": {"py/tuple": [1, 2]}, "b": [1.5, null]});
        let record = Record::from_document(doc.as_object().unwrap()).unwrap();
        assert_eq!(serde_json::Value::Object(record.to_document()), doc);
    }
}
