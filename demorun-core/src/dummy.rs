//! Deterministic test doubles of the collaborators of the engine.
//!
//! Used in tests, and in the `demorun` binary for a dry run without the
//! simulator.
use crate::{
    dataset::EnvMeta,
    record::{Record, RecordValue},
    video::VideoSink,
    Action, Env, Observation, Policy, RenderRequest, SimState, Step, Success,
};
use anyhow::{bail, Result};
use image::{Rgb, RgbImage};
use ndarray::{s, Array1, ArrayD};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, rc::Rc};

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DummyEnvConfig {
    /// Dimensionality of the action space.
    pub action_dim: usize,

    /// `done` is reported at this step (1-based) of an episode.
    pub done_at: Option<usize>,

    /// Success is reported from this step (1-based) of an episode.
    pub success_at: Option<usize>,

    /// `step` fails at this step (1-based) of an episode.
    pub fail_step_at: Option<usize>,

    /// `render` fails after this number of steps of an episode.
    pub fail_render_at: Option<usize>,

    /// Cameras which can be rendered.
    pub cameras: Vec<String>,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            action_dim: 7,
            done_at: None,
            success_at: None,
            fail_step_at: None,
            fail_render_at: None,
            cameras: vec![
                "agentview".to_string(),
                "front".to_string(),
                "side".to_string(),
            ],
        }
    }
}

impl DummyEnvConfig {
    /// Sets the dimensionality of the action space.
    pub fn action_dim(mut self, v: usize) -> Self {
        self.action_dim = v;
        self
    }

    /// Sets the step at which `done` is reported.
    pub fn done_at(mut self, v: usize) -> Self {
        self.done_at = Some(v);
        self
    }

    /// Sets the step from which success is reported.
    pub fn success_at(mut self, v: usize) -> Self {
        self.success_at = Some(v);
        self
    }

    /// Sets the step at which `step` fails.
    pub fn fail_step_at(mut self, v: usize) -> Self {
        self.fail_step_at = Some(v);
        self
    }

    /// Sets the step after which `render` fails.
    pub fn fail_render_at(mut self, v: usize) -> Self {
        self.fail_render_at = Some(v);
        self
    }
}

/// A deterministic environment.
///
/// The state is a vector of `action_dim` values. A step adds the action to
/// the state and the reward is the sum of the action. The observation has
/// channels `pos` (the state) and `t` (the step count of the episode).
pub struct DummyEnv {
    config: DummyEnvConfig,
    pos: Array1<f64>,
    t: usize,
    n_steps: usize,
    n_resets: usize,
}

impl DummyEnv {
    /// Constructs an environment.
    pub fn new(config: DummyEnvConfig) -> Self {
        let pos = Array1::zeros(config.action_dim);
        Self {
            config,
            pos,
            t: 0,
            n_steps: 0,
            n_resets: 0,
        }
    }

    /// The number of calls of [`Env::step`] since construction.
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// The number of resets since construction.
    pub fn n_resets(&self) -> usize {
        self.n_resets
    }

    fn obs(&self) -> Observation {
        let pos = self.pos.mapv(|v| v as f32).into_dyn();
        let t = ArrayD::from_elem(ndarray::IxDyn(&[1]), self.t as f32);
        vec![("pos", pos), ("t", t)].into_iter().collect()
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;

    fn build(_meta: &EnvMeta, config: &Self::Config) -> Result<Self> {
        Ok(Self::new(config.clone()))
    }

    fn action_dim(&self) -> usize {
        self.config.action_dim
    }

    fn reset(&mut self) -> Result<Observation> {
        self.pos = Array1::zeros(self.config.action_dim);
        self.t = 0;
        self.n_resets += 1;
        Ok(self.obs())
    }

    /// The first `action_dim` values of the snapshot are taken as the state;
    /// a shorter snapshot is padded with zeros.
    fn reset_to(&mut self, state: &SimState) -> Result<Observation> {
        let n = state.states.len().min(self.config.action_dim);
        self.pos = Array1::zeros(self.config.action_dim);
        self.pos
            .slice_mut(s![..n])
            .assign(&state.states.slice(s![..n]));
        self.t = 0;
        self.n_resets += 1;
        Ok(self.obs())
    }

    fn step(&mut self, act: &Action) -> Result<(Step, Record)> {
        if act.shape() != [self.config.action_dim] {
            bail!("Unexpected action shape {:?}", act.shape());
        }
        if self.config.fail_step_at == Some(self.t + 1) {
            bail!("Simulation diverged at step {}", self.t + 1);
        }

        self.n_steps += 1;
        self.t += 1;
        let act: Array1<f64> = act.array().iter().map(|v| *v as f64).collect();
        self.pos = &self.pos + &act;

        let reward = act.sum() as f32;
        let is_done = self.config.done_at == Some(self.t);
        let info = Record::from_slice(&[("t", RecordValue::Scalar(self.t as f32))]);
        Ok((Step::new(self.obs(), reward, is_done), info))
    }

    fn render(&mut self, request: &RenderRequest) -> Result<RgbImage> {
        let ix = match self.config.cameras.iter().position(|c| c == &request.camera) {
            Some(ix) => ix,
            None => bail!("Unknown camera: {}", request.camera),
        };
        if let Some(n) = self.config.fail_render_at {
            if self.t > n {
                bail!("Renderer is not available");
            }
        }
        let pixel = Rgb([(40 * (ix + 1)) as u8, (self.t % 256) as u8, 0]);
        Ok(RgbImage::from_pixel(request.width, request.height, pixel))
    }

    fn is_success(&mut self) -> Result<Success> {
        let success = match self.config.success_at {
            Some(n) => self.t >= n,
            None => false,
        };
        Ok(vec![("task".to_string(), success)].into_iter().collect())
    }

    fn get_state(&mut self) -> Result<SimState> {
        Ok(SimState::new(self.pos.clone(), None))
    }
}

/// A policy returning a fixed action.
pub struct DummyPolicy {
    action: Action,
    n_episodes: usize,
}

impl DummyPolicy {
    /// Returns `action` at every step.
    pub fn constant(action: Vec<f32>) -> Self {
        Self {
            action: Action::from_vec(action),
            n_episodes: 0,
        }
    }

    /// Returns a 0-dimensional action at every step.
    pub fn scalar(v: f32) -> Self {
        Self {
            action: Action::scalar(v),
            n_episodes: 0,
        }
    }

    /// The number of calls of [`Policy::start_episode`].
    pub fn n_episodes(&self) -> usize {
        self.n_episodes
    }
}

impl Policy for DummyPolicy {
    fn start_episode(&mut self) -> Result<()> {
        self.n_episodes += 1;
        Ok(())
    }

    fn sample(&mut self, _obs: &Observation) -> Result<Action> {
        Ok(self.action.clone())
    }
}

/// Contents of a [`MemorySink`].
#[derive(Debug, Default)]
pub struct MemorySinkState {
    /// Appended frames.
    pub frames: Vec<RgbImage>,

    /// `true` once the sink has been closed.
    pub closed: bool,

    /// The number of calls of [`VideoSink::close`].
    pub n_close: usize,
}

/// A video sink keeping frames in memory.
///
/// Clones share the same contents, so that a test can inspect the sink after
/// it was moved into a [`FrameMultiplexer`](crate::frame::FrameMultiplexer).
#[derive(Clone, Debug, Default)]
pub struct MemorySink(Rc<RefCell<MemorySinkState>>);

impl MemorySink {
    /// Constructs an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of appended frames.
    pub fn n_frames(&self) -> usize {
        self.0.borrow().frames.len()
    }

    /// Dimensions of the appended frames.
    pub fn dimensions(&self) -> Vec<(u32, u32)> {
        self.0.borrow().frames.iter().map(|f| f.dimensions()).collect()
    }

    /// Returns `true` if the sink has been closed.
    pub fn is_closed(&self) -> bool {
        self.0.borrow().closed
    }
}

impl VideoSink for MemorySink {
    fn append(&mut self, frame: &RgbImage) -> Result<()> {
        let mut state = self.0.borrow_mut();
        if state.closed {
            bail!("Sink is already closed");
        }
        state.frames.push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.closed = true;
        state.n_close += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_reset_to_any_state_length() -> Result<()> {
        let mut env = DummyEnv::new(DummyEnvConfig::default().action_dim(3));

        let wide = SimState::new(Array1::range(1.0, 33.0, 1.0), None);
        let obs = env.reset_to(&wide)?;
        assert_eq!(obs.get("pos").unwrap().as_slice(), Some(&[1.0f32, 2.0, 3.0][..]));

        let narrow = SimState::new(arr1(&[5.0]), None);
        let obs = env.reset_to(&narrow)?;
        assert_eq!(obs.get("pos").unwrap().as_slice(), Some(&[5.0f32, 0.0, 0.0][..]));
        assert_eq!(env.n_resets(), 2);
        Ok(())
    }
}
