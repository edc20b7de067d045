//! Base implementation of records.
use crate::error::VecrollError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// Scalar, e.g., loss value.
    Scalar(f32),

    /// Date and time.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array, e.g., per-environment episode returns.
    Array1(Vec<f32>),

    /// String, e.g., the name of the algorithm.
    String(String),
}

/// Represents a record, a set of named values.
#[derive(Debug, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Construct an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Construct a record with a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Construct a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys of the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Insert a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Get a reference to the value for the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merge records, the other record taking precedence on key collision.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Returns `true` if the record has no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get a scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32, VecrollError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Scalar(v) => Ok(*v),
                _ => Err(VecrollError::RecordValueTypeError("Scalar".to_string())),
            }
        } else {
            Err(VecrollError::RecordKeyError(k.to_string()))
        }
    }

    /// Get a 1-dimensional array of values.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, VecrollError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Array1(v) => Ok(v.clone()),
                _ => Err(VecrollError::RecordValueTypeError("Array1".to_string())),
            }
        } else {
            Err(VecrollError::RecordKeyError(k.to_string()))
        }
    }

    /// Get a string value.
    pub fn get_string(&self, k: &str) -> Result<String, VecrollError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::String(s) => Ok(s.clone()),
                _ => Err(VecrollError::RecordValueTypeError("String".to_string())),
            }
        } else {
            Err(VecrollError::RecordKeyError(k.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_scalar() {
        let mut record = Record::from_scalar("loss_value", 0.5);
        record.insert("loss_policy", RecordValue::Scalar(-0.1));

        assert_eq!(record.get_scalar("loss_value").unwrap(), 0.5);
        assert_eq!(record.get_scalar("loss_policy").unwrap(), -0.1);
        assert!(record.get_scalar("missing").is_err());
    }

    #[test]
    fn merge_overwrites() {
        let a = Record::from_scalar("x", 1.0);
        let b = Record::from_scalar("x", 2.0);
        assert_eq!(a.merge(b).get_scalar("x").unwrap(), 2.0);
    }
}
