use crate::Observation;
use serde::Serialize;
use std::fmt;

/// Reason of the end of an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// The environment reported `done`.
    Done,

    /// The environment reported success of the task.
    Success,

    /// The number of steps reached the horizon.
    Horizon,

    /// The replayed trajectory has no more actions.
    Exhausted,

    /// The episode was aborted by an error.
    Failed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Done => "done",
            Self::Success => "success",
            Self::Horizon => "horizon",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Phase of an episode.
///
/// `NotStarted -> Running -> Terminated`. There is no transition out of
/// `Terminated`; a new episode starts from `NotStarted` again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodePhase {
    /// The environment has not been reset yet.
    NotStarted,

    /// The environment has been reset and steps are being taken.
    Running,

    /// The episode ended.
    Terminated(Termination),
}

/// Transient state of one episode.
#[derive(Clone, Debug)]
pub struct EpisodeState {
    /// Phase of the episode.
    pub phase: EpisodePhase,

    /// Current observation.
    pub obs: Observation,

    /// Cumulative reward.
    pub total_reward: f32,

    /// The number of steps taken.
    pub steps: usize,

    /// `true` if success has been observed at any step.
    pub success: bool,

    /// `true` if the environment reported `done` at the last step.
    pub done: bool,
}

impl EpisodeState {
    /// State right after a reset which returned `obs`.
    pub fn new(obs: Observation) -> Self {
        Self {
            phase: EpisodePhase::Running,
            obs,
            total_reward: 0.0,
            steps: 0,
            success: false,
            done: false,
        }
    }

    /// Returns `true` if the episode has ended.
    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, EpisodePhase::Terminated(_))
    }

    pub(crate) fn terminate(&mut self, reason: Termination) -> Termination {
        self.phase = EpisodePhase::Terminated(reason);
        reason
    }
}
