use super::{demo_path, DatasetStore};
use crate::{Action, Observation, SimState};
use anyhow::{Context, Result};
use log::{debug, warn};
use ndarray::{Array2, ArrayD, Axis, Ix2};
use std::collections::BTreeMap;

/// One recorded episode of a dataset.
///
/// Arrays keep their leading time axis. A [`Demonstration`] is read-only;
/// it is loaded when processing of the demonstration starts and dropped when
/// it ends.
#[derive(Clone, Debug)]
pub struct Demonstration {
    /// Id of the demonstration, e.g. `demo_0`.
    pub id: String,

    /// Observations, channel name to `[T, ...]` array.
    pub observations: BTreeMap<String, ArrayD<f32>>,

    /// Observations after each step, used for checking alignment.
    pub next_observations: Option<BTreeMap<String, ArrayD<f32>>>,

    /// Actions, `[T, A]`.
    pub actions: ArrayD<f32>,

    /// Rewards.
    pub rewards: Vec<f32>,

    /// Done flags.
    pub dones: Vec<bool>,

    /// Simulator snapshots, `[T, S]`.
    pub states: Option<Array2<f64>>,

    /// Model description the snapshots refer to.
    pub model_file: Option<String>,
}

fn read_channels<S: DatasetStore + ?Sized>(
    store: &S,
    path: &str,
) -> Result<BTreeMap<String, ArrayD<f32>>> {
    let mut channels = BTreeMap::new();
    for key in store.keys(path)? {
        let array = store.read_f32(&format!("{}/{}", path, key))?;
        channels.insert(key, array);
    }
    Ok(channels)
}

impl Demonstration {
    /// Loads a demonstration from the store.
    ///
    /// Missing `actions` is an error. Missing `rewards` or `dones` are loaded
    /// as empty sequences, which the validator reports as length mismatches.
    pub fn load<S: DatasetStore + ?Sized>(store: &S, id: &str) -> Result<Self> {
        let base = demo_path(id);
        debug!("Load {}", base);

        let actions = store
            .read_f32(&format!("{}/actions", base))
            .with_context(|| format!("Failed to read actions of {}", id))?;

        let observations = if store.contains(&format!("{}/obs", base)) {
            read_channels(store, &format!("{}/obs", base))?
        } else {
            warn!("{} has no observations", id);
            BTreeMap::new()
        };

        let next_observations = if store.contains(&format!("{}/next_obs", base)) {
            Some(read_channels(store, &format!("{}/next_obs", base))?)
        } else {
            None
        };

        let rewards = match store.read_vec_f32(&format!("{}/rewards", base)) {
            Ok(v) => v,
            Err(e) => {
                warn!("{}: {}", id, e);
                vec![]
            }
        };

        let dones = match store.read_vec_bool(&format!("{}/dones", base)) {
            Ok(v) => v,
            Err(e) => {
                warn!("{}: {}", id, e);
                vec![]
            }
        };

        let states = if store.contains(&format!("{}/states", base)) {
            let states = store.read_f64(&format!("{}/states", base))?;
            let states = states
                .into_dimensionality::<Ix2>()
                .with_context(|| format!("States of {} must be 2-dimensional", id))?;
            Some(states)
        } else {
            None
        };

        let model_file = store.attr(&base, "model_file").ok();

        Ok(Self {
            id: id.to_string(),
            observations,
            next_observations,
            actions,
            rewards,
            dones,
            states,
            model_file,
        })
    }

    /// The number of timesteps, i.e. the number of actions.
    pub fn len(&self) -> usize {
        self.actions.shape().first().cloned().unwrap_or(0)
    }

    /// Returns `true` if the demonstration has no action.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The action at timestep `t`, shaped as stored.
    pub fn action(&self, t: usize) -> Option<Action> {
        if t < self.len() {
            Some(Action::new(self.actions.index_axis(Axis(0), t).to_owned()))
        } else {
            None
        }
    }

    /// All actions, shaped as stored.
    pub fn actions(&self) -> Vec<Action> {
        if self.actions.ndim() == 0 {
            return vec![];
        }
        self.actions
            .outer_iter()
            .map(|row| Action::new(row.to_owned()))
            .collect()
    }

    /// The observation at timestep `t`.
    ///
    /// Channels shorter than `t + 1` are omitted.
    pub fn observation(&self, t: usize) -> Observation {
        self.observations
            .iter()
            .filter(|(_, v)| v.ndim() > 0 && v.shape()[0] > t)
            .map(|(k, v)| (k.clone(), v.index_axis(Axis(0), t).to_owned()))
            .collect()
    }

    /// The snapshot of the first timestep with the model description, used
    /// to reset an environment for exact replay.
    pub fn initial_state(&self) -> Option<SimState> {
        let states = self.states.as_ref()?;
        if states.nrows() == 0 {
            return None;
        }
        Some(SimState::new(
            states.row(0).to_owned(),
            self.model_file.clone(),
        ))
    }
}
