//! Policy.
use super::{Action, Observation};
use anyhow::Result;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic, and may keep
/// recurrent state across the steps of an episode.
pub trait Policy {
    /// Prepares the policy for a new episode, e.g. clears a recurrent state.
    fn start_episode(&mut self) -> Result<()>;

    /// Sample an action given an observation.
    fn sample(&mut self, obs: &Observation) -> Result<Action>;
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn start_episode(&mut self) -> Result<()> {
        (**self).start_episode()
    }

    fn sample(&mut self, obs: &Observation) -> Result<Action> {
        (**self).sample(obs)
    }
}
