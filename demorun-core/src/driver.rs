//! Sources of actions for an episode.
//!
//! A [`TrajectoryDriver`] hides whether the next action is read from a
//! recorded demonstration ([`ReplayDriver`]) or produced by a policy
//! ([`PolicyDriver`]). Both drivers check the shape of the action against the
//! action space of the environment before handing it out; a mismatch is a
//! [`DemorunError::ActionShape`](crate::error::DemorunError::ActionShape) and
//! the action is never reshaped.
mod policy;
mod replay;
use crate::{episode::EpisodeState, Action};
use anyhow::Result;
pub use policy::PolicyDriver;
pub use replay::ReplayDriver;

/// Provides the next action of an episode.
pub trait TrajectoryDriver {
    /// Called once before the first action of an episode.
    fn begin_episode(&mut self) -> Result<()>;

    /// Returns the next action, or `None` when the trajectory is exhausted.
    fn next_action(&mut self, state: &EpisodeState) -> Result<Option<Action>>;
}

impl<D: TrajectoryDriver + ?Sized> TrajectoryDriver for &mut D {
    fn begin_episode(&mut self) -> Result<()> {
        (**self).begin_episode()
    }

    fn next_action(&mut self, state: &EpisodeState) -> Result<Option<Action>> {
        (**self).next_action(state)
    }
}
