use super::EpisodeState;
use crate::record::{Record, RecordValue};
use serde::{Deserialize, Serialize};

/// Statistics of one episode.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct RolloutStats {
    /// Undiscounted sum of rewards.
    #[serde(rename = "Return")]
    pub ret: f32,

    /// The number of steps executed.
    #[serde(rename = "Horizon")]
    pub horizon: usize,

    /// `1.0` if success was observed at any step, otherwise `0.0`.
    #[serde(rename = "SuccessRate")]
    pub success_rate: f32,
}

impl From<&EpisodeState> for RolloutStats {
    fn from(state: &EpisodeState) -> Self {
        Self {
            ret: state.total_reward,
            horizon: state.steps,
            success_rate: if state.success { 1.0 } else { 0.0 },
        }
    }
}

impl RolloutStats {
    /// Converts the statistics into a [`Record`].
    pub fn to_record(&self) -> Record {
        Record::from_slice(&[
            ("Return", RecordValue::Scalar(self.ret)),
            ("Horizon", RecordValue::Scalar(self.horizon as f32)),
            ("SuccessRate", RecordValue::Scalar(self.success_rate)),
        ])
    }
}
