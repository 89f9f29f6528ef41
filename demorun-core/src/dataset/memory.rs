use super::DatasetStore;
use crate::error::DemorunError;
use anyhow::Result;
use ndarray::ArrayD;
use std::collections::{BTreeMap, BTreeSet};

/// A dataset held in memory.
///
/// Used for synthetic demonstrations and as a staging area when converting
/// data from other sources.
///
/// ```rust
/// use demorun_core::dataset::{DatasetStore, MemoryStore};
/// use ndarray::{arr1, arr2};
///
/// let mut store = MemoryStore::new();
/// store.insert("data/demo_0/actions", arr2(&[[0.0, 1.0], [1.0, 0.0]]).into_dyn());
/// store.insert("data/demo_0/rewards", arr1(&[0.0, 1.0]).into_dyn());
/// assert_eq!(store.demo_ids().unwrap(), vec!["demo_0"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    arrays: BTreeMap<String, ArrayD<f64>>,
    attrs: BTreeMap<(String, String), String>,
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an array at the given key path, replacing an existing one.
    pub fn insert(&mut self, path: &str, array: ArrayD<f64>) {
        self.arrays.insert(normalize(path).to_string(), array);
    }

    /// Stores an `f32` array at the given key path.
    pub fn insert_f32(&mut self, path: &str, array: ArrayD<f32>) {
        self.insert(path, array.mapv(f64::from));
    }

    /// Removes the array at the given key path.
    pub fn remove(&mut self, path: &str) -> Option<ArrayD<f64>> {
        self.arrays.remove(normalize(path))
    }

    /// Sets a string attribute.
    pub fn set_attr(&mut self, path: &str, name: &str, value: impl Into<String>) {
        self.attrs.insert(
            (normalize(path).to_string(), name.to_string()),
            value.into(),
        );
    }

    fn array(&self, path: &str) -> Result<&ArrayD<f64>> {
        let path = normalize(path);
        Ok(self
            .arrays
            .get(path)
            .ok_or_else(|| DemorunError::MissingKey(path.to_string()))?)
    }
}

impl DatasetStore for MemoryStore {
    fn keys(&self, path: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", normalize(path));
        let keys: BTreeSet<String> = self
            .arrays
            .keys()
            .filter_map(|k| k.strip_prefix(prefix.as_str()))
            .filter_map(|rest| rest.split('/').next())
            .map(|s| s.to_string())
            .collect();

        if keys.is_empty() {
            Err(DemorunError::MissingKey(normalize(path).to_string()).into())
        } else {
            Ok(keys.into_iter().collect())
        }
    }

    fn contains(&self, path: &str) -> bool {
        let path = normalize(path);
        let prefix = format!("{}/", path);
        self.arrays.contains_key(path) || self.arrays.keys().any(|k| k.starts_with(&prefix))
    }

    fn read_f32(&self, path: &str) -> Result<ArrayD<f32>> {
        Ok(self.array(path)?.mapv(|v| v as f32))
    }

    fn read_f64(&self, path: &str) -> Result<ArrayD<f64>> {
        Ok(self.array(path)?.clone())
    }

    fn attr(&self, path: &str, name: &str) -> Result<String> {
        let path = normalize(path);
        Ok(self
            .attrs
            .get(&(path.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| DemorunError::MissingAttr {
                path: path.to_string(),
                name: name.to_string(),
            })?)
    }
}
