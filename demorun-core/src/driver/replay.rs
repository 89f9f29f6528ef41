use super::TrajectoryDriver;
use crate::{dataset::Demonstration, episode::EpisodeState, Action};
use anyhow::Result;

/// Replays a fixed sequence of actions.
///
/// Running past the last action is not an error: [`TrajectoryDriver::next_action`]
/// returns `Ok(None)`.
pub struct ReplayDriver {
    actions: Vec<Action>,
    cursor: usize,
    action_dim: usize,
}

impl ReplayDriver {
    /// Constructs a driver replaying `actions` on an environment with
    /// `action_dim`-dimensional actions.
    pub fn new(actions: Vec<Action>, action_dim: usize) -> Self {
        Self {
            actions,
            cursor: 0,
            action_dim,
        }
    }

    /// Constructs a driver replaying the actions of a demonstration.
    pub fn from_demo(demo: &Demonstration, action_dim: usize) -> Self {
        Self::new(demo.actions(), action_dim)
    }

    /// The number of actions left.
    pub fn remaining(&self) -> usize {
        self.actions.len() - self.cursor
    }
}

impl TrajectoryDriver for ReplayDriver {
    /// Rewinds to the first action.
    fn begin_episode(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn next_action(&mut self, _state: &EpisodeState) -> Result<Option<Action>> {
        let act = match self.actions.get(self.cursor) {
            Some(act) => act,
            None => return Ok(None),
        };
        act.check_dim(self.action_dim, Some(self.cursor))?;
        self.cursor += 1;
        Ok(Some(act.clone()))
    }
}
