//! Synthetic datasets consistent with the dynamics of `DummyEnv`.
#![allow(dead_code)]
use demorun_core::dataset::MemoryStore;
use ndarray::{Array1, Array2};

pub const LIFT_ENV_ARGS: &str = r#"{
    "env_name": "Lift",
    "env_version": "1.4.1",
    "type": 1,
    "env_kwargs": {"robots": ["Panda"], "control_freq": 20,
                   "controller_configs": {"type": "OSC_POSE"}}
}"#;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Inserts a demonstration of `n` steps with `action_dim`-dimensional actions.
///
/// Observation `pos` is the running sum of the actions, as in `DummyEnv`.
pub fn insert_demo(store: &mut MemoryStore, id: &str, n: usize, action_dim: usize) {
    let base = format!("data/{}", id);
    let actions = Array2::from_shape_fn((n, action_dim), |(t, j)| ((t + j) % 3) as f64 * 0.1 - 0.1);
    let mut obs = Array2::<f64>::zeros((n, action_dim));
    let mut next_obs = Array2::<f64>::zeros((n, action_dim));
    let mut pos = Array1::<f64>::zeros(action_dim);
    for t in 0..n {
        obs.row_mut(t).assign(&pos);
        pos = &pos + &actions.row(t);
        next_obs.row_mut(t).assign(&pos);
    }
    let mut dones = Array1::<f64>::zeros(n);
    if n > 0 {
        dones[n - 1] = 1.0;
    }

    store.insert(&format!("{}/actions", base), actions.into_dyn());
    store.insert(&format!("{}/obs/pos", base), obs.into_dyn());
    store.insert(&format!("{}/next_obs/pos", base), next_obs.into_dyn());
    store.insert(&format!("{}/rewards", base), Array1::<f64>::zeros(n).into_dyn());
    store.insert(&format!("{}/dones", base), dones.into_dyn());
    store.insert(
        &format!("{}/states", base),
        Array2::<f64>::zeros((n, action_dim)).into_dyn(),
    );
    store.set_attr(&base, "model_file", "<mujoco model=\"lift\"/>");
}

/// A dataset of demonstrations with the given numbers of steps.
pub fn dataset(lengths: &[usize], action_dim: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    for (i, n) in lengths.iter().enumerate() {
        insert_demo(&mut store, &format!("demo_{}", i), *n, action_dim);
    }
    store.set_attr("data", "env_args", LIFT_ENV_ARGS);
    store
}
