use crate::util::{ndarray::pyany_to_arrayd, obs::obs_to_pydict};
use anyhow::Result;
use demorun_core::{Action, Observation, Policy};
use pyo3::{types::IntoPyDict, PyAny, PyObject, Python, ToPyObject};

/// A policy restored from a robomimic checkpoint.
///
/// Construct it with [`RobomimicEnv::from_checkpoint`](crate::RobomimicEnv::from_checkpoint).
/// The action is returned with the shape produced by the policy, so a policy
/// returning a scalar is rejected by the driver rather than broadcast.
pub struct RobomimicPolicy {
    policy: PyObject,
}

impl RobomimicPolicy {
    pub(crate) fn from_pyobj(py: Python, policy: &PyAny) -> Self {
        Self {
            policy: policy.to_object(py),
        }
    }
}

impl Policy for RobomimicPolicy {
    fn start_episode(&mut self) -> Result<()> {
        Python::with_gil(|py| {
            self.policy.call_method0(py, "start_episode")?;
            Ok(())
        })
    }

    fn sample(&mut self, obs: &Observation) -> Result<Action> {
        Python::with_gil(|py| {
            let ob = obs_to_pydict(py, obs)?;
            let act = self
                .policy
                .call(py, (), Some(vec![("ob", ob)].into_py_dict(py)))?;
            let act = pyany_to_arrayd::<f32>(py, act.as_ref(py), "float32")?;
            Ok(Action::new(act))
        })
    }
}
