//! Environment step.
use super::Observation;

/// Represents the outcome of an environment step, `(o_t+1, r_t, done_t)`.
///
/// An environment emits [`Step`] object at every interaction steps.
/// Additional information returned by the simulator is emitted as a
/// [`Record`](crate::record::Record) alongside the [`Step`].
#[derive(Clone, Debug)]
pub struct Step {
    /// Observation after the step.
    pub obs: Observation,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the environment reports the end of the episode.
    pub is_done: bool,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(obs: Observation, reward: f32, is_done: bool) -> Self {
        Step {
            obs,
            reward,
            is_done,
        }
    }
}
