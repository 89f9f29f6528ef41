use super::EnvMeta;
use anyhow::{Context, Result};
use ndarray::ArrayD;

/// Key path of a demonstration group, e.g. `data/demo_3`.
pub fn demo_path(demo_id: &str) -> String {
    format!("data/{}", demo_id)
}

/// Sorts demonstration ids such as `demo_10` by their numeric suffix.
///
/// Ids without a numeric suffix are placed after the numbered ones, in
/// lexicographic order.
pub fn sort_demo_ids(ids: &mut [String]) {
    fn index(id: &str) -> Option<u64> {
        id.rsplit('_').next().and_then(|s| s.parse().ok())
    }
    ids.sort_by(|a, b| match (index(a), index(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}

/// Read access to a hierarchical dataset by key path and attribute lookup.
pub trait DatasetStore {
    /// Names of the children of the group at `path`.
    fn keys(&self, path: &str) -> Result<Vec<String>>;

    /// Returns `true` if a group or an array exists at `path`.
    fn contains(&self, path: &str) -> bool;

    /// Reads an array converted to `f32`.
    fn read_f32(&self, path: &str) -> Result<ArrayD<f32>>;

    /// Reads an array converted to `f64`.
    fn read_f64(&self, path: &str) -> Result<ArrayD<f64>>;

    /// Reads a string attribute of the group or array at `path`.
    fn attr(&self, path: &str, name: &str) -> Result<String>;

    /// Ids of the demonstrations, sorted by their numeric suffix.
    fn demo_ids(&self) -> Result<Vec<String>> {
        let mut ids = self.keys("data")?;
        sort_demo_ids(&mut ids);
        Ok(ids)
    }

    /// Environment metadata stored in the `env_args` attribute of `data`.
    fn env_meta(&self) -> Result<EnvMeta> {
        let json = self.attr("data", "env_args")?;
        EnvMeta::from_json(&json).context("Failed to parse env_args")
    }

    /// Reads a flat vector of `f32`.
    fn read_vec_f32(&self, path: &str) -> Result<Vec<f32>> {
        Ok(self.read_f32(path)?.iter().cloned().collect())
    }

    /// Reads a flat vector of flags, non-zero meaning `true`.
    fn read_vec_bool(&self, path: &str) -> Result<Vec<bool>> {
        Ok(self.read_f32(path)?.iter().map(|v| *v != 0.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_demo_ids() {
        let mut ids: Vec<String> = ["demo_10", "demo_2", "mask", "demo_0", "demo_1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_demo_ids(&mut ids);
        assert_eq!(ids, vec!["demo_0", "demo_1", "demo_2", "demo_10", "mask"]);
    }
}
