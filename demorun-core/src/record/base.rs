//! Base implementation of records.
use crate::error::DemorunError;
use chrono::prelude::{DateTime, Local};
use serde_json::{json, Map, Value};
use std::{
    collections::{
        hash_map::{IntoIter, Iter, Keys},
        HashMap,
    },
    convert::Into,
    iter::IntoIterator,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, e.g. a reward or a return.
    Scalar(f32),

    /// A boolean flag, e.g. done or success.
    Bool(bool),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array of floating-point values, e.g. an action.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

impl RecordValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Scalar(v) => json!(v),
            Self::Bool(v) => json!(v),
            Self::DateTime(v) => json!(v.to_rfc3339()),
            Self::Array1(v) => json!(v),
            Self::String(v) => json!(v),
        }
    }
}

/// A container for storing key-value pairs of various data types.
///
/// Records are emitted by environments at every step and by the episode
/// controller for telemetry, and consumed by a [`Recorder`](super::Recorder).
///
/// ```rust
/// use demorun_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("reward", 0.5);
/// record.insert("success", RecordValue::Bool(false));
/// assert_eq!(record.get_scalar("reward").unwrap(), 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        let mut record = Self::empty();
        record.insert(name, RecordValue::Scalar(value));
        record
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<'_, String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns an iterator that consumes the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records, consuming both.
    ///
    /// Values of `record` overwrite values of `self` with the same key.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges another record into this one in place.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, DemorunError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(DemorunError::RecordValueTypeError("Scalar".to_string())),
            None => Err(DemorunError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a boolean value from the record.
    pub fn get_bool(&self, k: &str) -> Result<bool, DemorunError> {
        match self.0.get(k) {
            Some(RecordValue::Bool(v)) => Ok(*v),
            Some(_) => Err(DemorunError::RecordValueTypeError("Bool".to_string())),
            None => Err(DemorunError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, DemorunError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(DemorunError::RecordValueTypeError("Array1".to_string())),
            None => Err(DemorunError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, DemorunError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(DemorunError::RecordValueTypeError("String".to_string())),
            None => Err(DemorunError::RecordKeyError(k.to_string())),
        }
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Converts the record into a JSON object with sorted keys.
    pub fn to_json(&self) -> Value {
        let mut keys: Vec<_> = self.0.keys().collect();
        keys.sort();
        let map: Map<String, Value> = keys
            .into_iter()
            .map(|k| (k.clone(), self.0[k].to_json()))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let record = Record::from_slice(&[
            ("Return", RecordValue::Scalar(1.5)),
            ("success", RecordValue::Bool(true)),
            ("demo", RecordValue::String("demo_0".into())),
        ]);
        assert_eq!(record.get_scalar("Return").unwrap(), 1.5);
        assert!(record.get_bool("success").unwrap());
        assert_eq!(
            record.get_scalar("demo"),
            Err(DemorunError::RecordValueTypeError("Scalar".into()))
        );
        assert_eq!(
            record.get_scalar("missing"),
            Err(DemorunError::RecordKeyError("missing".into()))
        );
    }

    #[test]
    fn test_merge_and_json() {
        let a = Record::from_scalar("x", 1.0);
        let b = Record::from_slice(&[
            ("x", RecordValue::Scalar(2.0)),
            ("act", RecordValue::Array1(vec![0.0, 1.0])),
        ]);
        let merged = a.merge(b);
        assert_eq!(merged.get_scalar("x").unwrap(), 2.0);
        assert_eq!(
            merged.to_json().to_string(),
            r#"{"act":[0.0,1.0],"x":2.0}"#
        );
    }
}
