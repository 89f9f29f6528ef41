//! Record storage and aggregation.
use super::{AggregateRecorder, Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// A storage of records with aggregation.
///
/// Scalar values stored under the same key over many records are aggregated
/// into `{key}_min`, `{key}_max`, `{key}_mean` and `{key}_median`; a key with
/// a single scalar is passed through. For other value types the most recent
/// value is kept. Boolean values are aggregated into the rate of `true`,
/// `{key}_rate`.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().cloned().fold(f32::INFINITY, f32::min))
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().cloned().fold(f32::NEG_INFINITY, f32::max))
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// The number of stored records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn latest(&self, key: &str) -> Option<&RecordValue> {
        self.data.iter().rev().find_map(|record| record.get(key))
    }

    fn scalar(&self, key: &str) -> Record {
        let vs: Vec<f32> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Scalar(v)) => Some(*v),
                _ => None,
            })
            .collect();

        if vs.len() == 1 {
            Record::from_slice(&[(key.to_string(), RecordValue::Scalar(vs[0]))])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ])
        }
    }

    fn rate(&self, key: &str) -> Record {
        let flags: Vec<bool> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Bool(v)) => Some(*v),
                _ => None,
            })
            .collect();
        let n_true = flags.iter().filter(|&&f| f).count();
        Record::from_scalar(
            format!("{}_rate", key),
            n_true as f32 / flags.len() as f32,
        )
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
            let r = match self.latest(key) {
                Some(RecordValue::Scalar(..)) => self.scalar(key),
                Some(RecordValue::Bool(..)) => self.rate(key),
                Some(value) => Record::from_slice(&[(key.clone(), value.clone())]),
                None => continue,
            };
            record.merge_inplace(r);
        }

        self.data = vec![];

        record
    }
}

impl AggregateRecorder for RecordStorage {
    fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    fn flush(&mut self) -> Record {
        self.aggregate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate() {
        let mut storage = RecordStorage::new();
        for (r, s) in [(1.0, true), (3.0, false), (2.0, true), (6.0, true)].iter() {
            let mut record = Record::from_scalar("Return", *r);
            record.insert("success", RecordValue::Bool(*s));
            record.insert("demo", RecordValue::String(format!("demo_{}", r)));
            storage.store(record);
        }
        storage.store(Record::from_scalar("only_once", 5.0));

        let record = storage.flush();
        assert_eq!(record.get_scalar("Return_min").unwrap(), 1.0);
        assert_eq!(record.get_scalar("Return_max").unwrap(), 6.0);
        assert_eq!(record.get_scalar("Return_mean").unwrap(), 3.0);
        assert_eq!(record.get_scalar("Return_median").unwrap(), 3.0);
        assert_eq!(record.get_scalar("success_rate").unwrap(), 0.75);
        assert_eq!(record.get_scalar("only_once").unwrap(), 5.0);
        assert_eq!(record.get_string("demo").unwrap(), "demo_6");
        assert!(storage.is_empty());
    }
}
