use super::{demo_path, DatasetStore, Demonstration, EnvMeta};
use anyhow::Result;
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;

/// The number of samples of a demonstration.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DemoSamples {
    /// Id of the demonstration.
    pub id: String,

    /// The number of actions, `None` if the demonstration has no actions.
    pub n_samples: Option<usize>,
}

/// Observation and action at one timestep.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TimestepPreview {
    /// Timestep.
    pub t: usize,

    /// Observation channels, flattened.
    pub obs: BTreeMap<String, Vec<f32>>,

    /// Action, flattened.
    pub action: Vec<f32>,
}

/// Contents of a demonstration for a quick look.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DemoPreview {
    /// Id of the demonstration.
    pub id: String,

    /// Keys in the group of the demonstration.
    pub keys: Vec<String>,

    /// The first timesteps.
    pub timesteps: Vec<TimestepPreview>,

    /// Done flags.
    pub dones: Vec<bool>,

    /// Rewards.
    pub rewards: Vec<f32>,

    /// Model description.
    pub model_file: Option<String>,
}

/// Structure of a dataset.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DatasetInfo {
    /// The number of demonstrations.
    pub n_demos: usize,

    /// The number of samples per demonstration.
    pub demos: Vec<DemoSamples>,

    /// Preview of the first demonstration which can be loaded.
    pub first_demo: Option<DemoPreview>,

    /// Environment metadata, if present and parsable.
    pub env_meta: Option<EnvMeta>,
}

impl DatasetInfo {
    /// Collects the structure of a dataset.
    ///
    /// `n_timesteps` is the number of timesteps in the preview of the first
    /// demonstration. A demonstration without actions is reported with
    /// `n_samples = None` rather than failing, and is not previewed.
    pub fn collect<S: DatasetStore + ?Sized>(store: &S, n_timesteps: usize) -> Result<Self> {
        let ids = store.demo_ids()?;

        let demos = ids
            .iter()
            .map(|id| {
                let n_samples = store
                    .read_f32(&format!("{}/actions", demo_path(id)))
                    .ok()
                    .and_then(|a| a.shape().first().cloned());
                if n_samples.is_none() {
                    warn!("Skipping {} (actions not found)", id);
                }
                DemoSamples {
                    id: id.clone(),
                    n_samples,
                }
            })
            .collect();

        let first_demo = ids
            .iter()
            .find_map(|id| match Self::preview(store, id, n_timesteps) {
                Ok(preview) => Some(preview),
                Err(e) => {
                    warn!("No preview of {}: {:#}", id, e);
                    None
                }
            });

        let env_meta = match store.env_meta() {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("No environment metadata: {:#}", e);
                None
            }
        };

        Ok(Self {
            n_demos: ids.len(),
            demos,
            first_demo,
            env_meta,
        })
    }

    fn preview<S: DatasetStore + ?Sized>(
        store: &S,
        id: &str,
        n_timesteps: usize,
    ) -> Result<DemoPreview> {
        let keys = store.keys(&demo_path(id))?;
        let demo = Demonstration::load(store, id)?;
        let n = n_timesteps.min(demo.len());

        let timesteps = (0..n)
            .map(|t| TimestepPreview {
                t,
                obs: demo
                    .observation(t)
                    .iter()
                    .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
                    .collect(),
                action: demo.action(t).map(|a| a.to_vec()).unwrap_or_default(),
            })
            .collect();

        Ok(DemoPreview {
            id: id.to_string(),
            keys,
            timesteps,
            dones: demo.dones,
            rewards: demo.rewards,
            model_file: demo.model_file,
        })
    }
}
