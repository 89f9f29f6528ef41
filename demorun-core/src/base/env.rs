//! Environment.
use super::{Action, Observation, SimState, Step};
use crate::{dataset::EnvMeta, record::Record};
use anyhow::Result;
use image::RgbImage;
use std::collections::BTreeMap;

/// Success flags reported by an environment, keyed by task name.
///
/// The overall task is reported with the key `"task"`.
pub type Success = BTreeMap<String, bool>;

/// Off-screen rendering request for one camera.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    /// Camera name, e.g. `agentview`.
    pub camera: String,

    /// Height of the image in pixels.
    pub height: u32,

    /// Width of the image in pixels.
    pub width: u32,
}

impl RenderRequest {
    /// Constructs a request.
    pub fn new(camera: impl Into<String>, height: u32, width: u32) -> Self {
        Self {
            camera: camera.into(),
            height,
            width,
        }
    }
}

/// Represents a simulated manipulation environment.
///
/// Methods are synchronous: each call blocks on the physics or render backend.
pub trait Env {
    /// Configurations, e.g. render capability flags.
    type Config: Clone;

    /// Builds an environment from the metadata stored in a dataset.
    fn build(meta: &EnvMeta, config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Dimensionality of the action space.
    fn action_dim(&self) -> usize;

    /// Resets the environment to its own initial state distribution.
    fn reset(&mut self) -> Result<Observation>;

    /// Resets the environment to the given snapshot.
    fn reset_to(&mut self, state: &SimState) -> Result<Observation>;

    /// Performes an environment step.
    ///
    /// The returned [`Record`] holds additional information from the simulator.
    fn step(&mut self, act: &Action) -> Result<(Step, Record)>;

    /// Renders an RGB image from the given camera.
    fn render(&mut self, request: &RenderRequest) -> Result<RgbImage>;

    /// Returns success flags of the tasks.
    fn is_success(&mut self) -> Result<Success>;

    /// Returns the current simulator snapshot.
    fn get_state(&mut self) -> Result<SimState>;
}
