use super::TrajectoryDriver;
use crate::{episode::EpisodeState, error::DemorunError, Action, Policy};
use anyhow::Result;
use log::trace;

/// Produces actions by calling a policy with the current observation.
pub struct PolicyDriver<P: Policy> {
    policy: P,
    action_dim: usize,
    started: bool,
}

impl<P: Policy> PolicyDriver<P> {
    /// Constructs a driver for an environment with `action_dim`-dimensional actions.
    pub fn new(policy: P, action_dim: usize) -> Self {
        Self {
            policy,
            action_dim,
            started: false,
        }
    }

    /// Returns the policy.
    pub fn into_inner(self) -> P {
        self.policy
    }
}

impl<P: Policy> TrajectoryDriver for PolicyDriver<P> {
    /// Calls [`Policy::start_episode`].
    fn begin_episode(&mut self) -> Result<()> {
        trace!("Start policy episode");
        self.policy.start_episode()?;
        self.started = true;
        Ok(())
    }

    /// The policy never exhausts; the episode ends by the environment or the horizon.
    fn next_action(&mut self, state: &EpisodeState) -> Result<Option<Action>> {
        if !self.started {
            return Err(DemorunError::PolicyNotStarted.into());
        }
        let act = self.policy.sample(&state.obs)?;
        act.check_dim(self.action_dim, Some(state.steps))?;
        Ok(Some(act))
    }
}
