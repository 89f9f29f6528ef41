//! Environments of robomimic.
use crate::util::{
    ndarray::{arrayd_to_pyobj, arrayd_to_rgb, pyany_to_arrayd},
    obs::pydict_to_obs,
    state::{pydict_to_state, state_to_pydict},
};
use anyhow::Result;
use demorun_core::{
    dataset::EnvMeta,
    record::{Record, RecordValue},
    Action, Env, Observation, RenderRequest, SimState, Step, Success,
};
use image::RgbImage;
use log::{debug, info};
use pyo3::{
    types::{IntoPyDict, PyDict, PyTuple},
    PyAny, PyObject, Python, ToPyObject,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`RobomimicEnv`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RobomimicEnvConfig {
    /// Enables the off-screen renderer, required for video.
    pub render_offscreen: bool,

    /// Includes camera images in observations.
    pub use_image_obs: bool,

    /// Low-dimensional observation keys registered to `ObsUtils`.
    pub low_dim_keys: Vec<String>,

    /// Image observation keys registered to `ObsUtils`.
    pub rgb_keys: Vec<String>,
}

impl Default for RobomimicEnvConfig {
    fn default() -> Self {
        Self {
            render_offscreen: true,
            use_image_obs: false,
            low_dim_keys: vec!["robot0_eef_pos".to_string()],
            rgb_keys: vec![],
        }
    }
}

impl RobomimicEnvConfig {
    /// Sets whether the off-screen renderer is enabled.
    pub fn render_offscreen(mut self, v: bool) -> Self {
        self.render_offscreen = v;
        self
    }

    /// Sets the observation keys.
    pub fn obs_keys(mut self, low_dim: Vec<String>, rgb: Vec<String>) -> Self {
        self.low_dim_keys = low_dim;
        self.rgb_keys = rgb;
        self
    }
}

/// Registers observation modalities, which robomimic requires before an
/// environment or a policy is used.
fn initialize_obs_utils(py: Python, config: &RobomimicEnvConfig) -> Result<()> {
    let obs_utils = py.import("robomimic.utils.obs_utils")?;
    let modalities = PyDict::new(py);
    modalities.set_item("low_dim", config.low_dim_keys.clone())?;
    modalities.set_item("rgb", config.rgb_keys.clone())?;
    let specs = PyDict::new(py);
    specs.set_item("obs", modalities)?;
    obs_utils.call_method(
        "initialize_obs_utils_with_obs_specs",
        (),
        Some(vec![("obs_modality_specs", specs)].into_py_dict(py)),
    )?;
    Ok(())
}

/// An environment of robomimic, e.g. the robosuite `Lift` task.
pub struct RobomimicEnv {
    env: PyObject,
    action_dim: usize,
}

impl RobomimicEnv {
    fn from_pyobj(py: Python, env: &PyAny) -> Result<Self> {
        let action_dim = env.getattr("action_dimension")?.extract()?;
        info!("Created environment {} (action_dim = {})", env.str()?, action_dim);
        Ok(Self {
            env: env.to_object(py),
            action_dim,
        })
    }

    /// Restores the environment and the policy of a checkpoint.
    ///
    /// The policy runs on CUDA if available.
    pub fn from_checkpoint(
        ckpt_path: impl AsRef<Path>,
        config: &RobomimicEnvConfig,
    ) -> Result<(Self, crate::RobomimicPolicy)> {
        let ckpt_path = ckpt_path.as_ref().to_string_lossy().to_string();
        info!("Load checkpoint {}", ckpt_path);

        Python::with_gil(|py| {
            let file_utils = py.import("robomimic.utils.file_utils")?;
            let torch_utils = py.import("robomimic.utils.torch_utils")?;
            let device = torch_utils.call_method(
                "get_torch_device",
                (),
                Some(vec![("try_to_use_cuda", true)].into_py_dict(py)),
            )?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("ckpt_path", ckpt_path)?;
            kwargs.set_item("device", device)?;
            kwargs.set_item("verbose", false)?;
            let ret: &PyTuple = file_utils
                .call_method("policy_from_checkpoint", (), Some(kwargs))?
                .downcast()
                .map_err(pyo3::PyErr::from)?;
            let policy = ret.get_item(0)?;
            let ckpt_dict = ret.get_item(1)?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("ckpt_dict", ckpt_dict)?;
            kwargs.set_item("render", false)?;
            kwargs.set_item("render_offscreen", config.render_offscreen)?;
            kwargs.set_item("verbose", false)?;
            let ret: &PyTuple = file_utils
                .call_method("env_from_checkpoint", (), Some(kwargs))?
                .downcast()
                .map_err(pyo3::PyErr::from)?;

            let env = Self::from_pyobj(py, ret.get_item(0)?)?;
            let policy = crate::RobomimicPolicy::from_pyobj(py, policy);
            Ok((env, policy))
        })
    }

    fn obs_or_current(&self, py: Python, ret: &PyAny) -> Result<Observation> {
        // reset_to() returns None when no state was given
        if ret.is_none() {
            let obs = self.env.call_method0(py, "get_observation")?;
            pydict_to_obs(py, obs.as_ref(py))
        } else {
            pydict_to_obs(py, ret)
        }
    }
}

/// Picks up scalar values from the info dictionary of a step.
fn info_to_record(info: &PyAny) -> Record {
    let mut record = Record::empty();
    if let Ok(dict) = info.downcast::<PyDict>() {
        for (k, v) in dict.iter() {
            let k: String = match k.extract() {
                Ok(k) => k,
                Err(_) => continue,
            };
            if let Ok(b) = v.extract::<bool>() {
                record.insert(k, RecordValue::Bool(b));
            } else if let Ok(x) = v.extract::<f32>() {
                record.insert(k, RecordValue::Scalar(x));
            }
        }
    }
    record
}

impl Env for RobomimicEnv {
    type Config = RobomimicEnvConfig;

    fn build(meta: &EnvMeta, config: &Self::Config) -> Result<Self> {
        Python::with_gil(|py| {
            initialize_obs_utils(py, config)?;
            let json = py.import("json")?;
            let env_meta = json.call_method1("loads", (meta.to_json_pretty()?,))?;

            let env_utils = py.import("robomimic.utils.env_utils")?;
            let kwargs = PyDict::new(py);
            kwargs.set_item("env_meta", env_meta)?;
            kwargs.set_item("render", false)?;
            kwargs.set_item("render_offscreen", config.render_offscreen)?;
            kwargs.set_item("use_image_obs", config.use_image_obs)?;
            let env = env_utils.call_method("create_env_from_metadata", (), Some(kwargs))?;
            Self::from_pyobj(py, env)
        })
    }

    fn action_dim(&self) -> usize {
        self.action_dim
    }

    fn reset(&mut self) -> Result<Observation> {
        Python::with_gil(|py| {
            let obs = self.env.call_method0(py, "reset")?;
            pydict_to_obs(py, obs.as_ref(py))
        })
    }

    fn reset_to(&mut self, state: &SimState) -> Result<Observation> {
        Python::with_gil(|py| {
            let state = state_to_pydict(py, state)?;
            let ret = self.env.call_method1(py, "reset_to", (state,))?;
            self.obs_or_current(py, ret.as_ref(py))
        })
    }

    fn step(&mut self, act: &Action) -> Result<(Step, Record)> {
        Python::with_gil(|py| {
            let act = arrayd_to_pyobj(py, &act.array().mapv(f64::from));
            let ret = self.env.call_method1(py, "step", (act,))?;
            let ret: &PyTuple = ret.as_ref(py).downcast().map_err(pyo3::PyErr::from)?;

            let obs = pydict_to_obs(py, ret.get_item(0)?)?;
            let reward: f32 = ret.get_item(1)?.extract()?;
            let is_done = ret.get_item(2)?.is_true()?;
            let record = info_to_record(ret.get_item(3)?);
            Ok((Step::new(obs, reward, is_done), record))
        })
    }

    fn render(&mut self, request: &RenderRequest) -> Result<RgbImage> {
        Python::with_gil(|py| {
            let kwargs = PyDict::new(py);
            kwargs.set_item("mode", "rgb_array")?;
            kwargs.set_item("height", request.height)?;
            kwargs.set_item("width", request.width)?;
            kwargs.set_item("camera_name", request.camera.as_str())?;
            let img = self.env.call_method(py, "render", (), Some(kwargs))?;
            arrayd_to_rgb(pyany_to_arrayd::<u8>(py, img.as_ref(py), "uint8")?)
        })
    }

    fn is_success(&mut self) -> Result<Success> {
        Python::with_gil(|py| {
            let ret = self.env.call_method0(py, "is_success")?;
            let dict: &PyDict = ret.as_ref(py).downcast().map_err(pyo3::PyErr::from)?;
            let mut success = Success::new();
            for (k, v) in dict.iter() {
                success.insert(k.extract()?, v.is_true()?);
            }
            debug!("is_success: {:?}", success);
            Ok(success)
        })
    }

    fn get_state(&mut self) -> Result<SimState> {
        Python::with_gil(|py| {
            let state = self.env.call_method0(py, "get_state")?;
            pydict_to_state(py, state.as_ref(py))
        })
    }
}
