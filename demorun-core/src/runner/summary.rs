//! Summary of a run.
use crate::{
    episode::{RolloutStats, Termination},
    frame::FrameStats,
    record::{AggregateRecorder, Record, RecordStorage, RecordValue},
};
use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;

/// Status of an episode in a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EpisodeStatus {
    /// The episode ran until termination.
    Completed,

    /// The demonstration was not played back.
    Skipped,

    /// The episode was aborted by an error.
    Failed,
}

/// Outcome of one episode of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EpisodeSummary {
    /// Demonstration id, or `rollout_{i}` for policy rollouts.
    pub id: String,

    /// Status.
    pub status: EpisodeStatus,

    /// Reason of termination of a completed episode.
    pub termination: Option<Termination>,

    /// Statistics of a completed episode.
    pub stats: Option<RolloutStats>,

    /// Reason of skipping or failure.
    pub reason: Option<String>,
}

/// Summary of a run.
///
/// Means are taken over completed episodes and are `0.0` if there is none.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    /// Start time of the run.
    pub started_at: DateTime<Local>,

    /// The number of completed episodes.
    pub completed: usize,

    /// The number of skipped demonstrations.
    pub skipped: usize,

    /// The number of failed episodes.
    pub failed: usize,

    /// Outcomes in the order of execution.
    pub episodes: Vec<EpisodeSummary>,

    /// Mean of returns.
    pub mean_return: f32,

    /// Mean of horizons.
    pub mean_horizon: f32,

    /// Fraction of completed episodes with success.
    pub success_rate: f32,

    /// The number of frames written to the video.
    pub frames: usize,

    /// The number of steps where rendering failed.
    pub render_errors: usize,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    /// An empty summary starting now.
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            completed: 0,
            skipped: 0,
            failed: 0,
            episodes: vec![],
            mean_return: 0.0,
            mean_horizon: 0.0,
            success_rate: 0.0,
            frames: 0,
            render_errors: 0,
        }
    }

    /// Adds a completed episode.
    pub fn push_completed(&mut self, id: &str, stats: RolloutStats, termination: Termination) {
        self.completed += 1;
        self.episodes.push(EpisodeSummary {
            id: id.to_string(),
            status: EpisodeStatus::Completed,
            termination: Some(termination),
            stats: Some(stats),
            reason: None,
        });
        self.update_means();
    }

    /// Adds a skipped demonstration.
    pub fn push_skipped(&mut self, id: &str, reason: String) {
        self.skipped += 1;
        self.push_incomplete(id, EpisodeStatus::Skipped, reason);
    }

    /// Adds a failed episode.
    pub fn push_failed(&mut self, id: &str, reason: String) {
        self.failed += 1;
        self.push_incomplete(id, EpisodeStatus::Failed, reason);
    }

    /// Sets the frame statistics.
    pub fn set_frame_stats(&mut self, stats: FrameStats) {
        self.frames = stats.frames;
        self.render_errors = stats.render_errors;
    }

    /// Statistics of the completed episodes.
    pub fn completed_stats(&self) -> impl Iterator<Item = &RolloutStats> {
        self.episodes.iter().filter_map(|e| e.stats.as_ref())
    }

    /// Aggregated statistics as a [`Record`].
    ///
    /// Per-episode statistics are aggregated into `Return_mean`,
    /// `Horizon_max` and so on, plus the episode counts.
    pub fn to_record(&self) -> Record {
        let mut storage = RecordStorage::new();
        for stats in self.completed_stats() {
            storage.store(stats.to_record());
        }
        storage.flush().merge(Record::from_slice(&[
            ("completed", RecordValue::Scalar(self.completed as f32)),
            ("skipped", RecordValue::Scalar(self.skipped as f32)),
            ("failed", RecordValue::Scalar(self.failed as f32)),
            ("frames", RecordValue::Scalar(self.frames as f32)),
            ("render_errors", RecordValue::Scalar(self.render_errors as f32)),
            ("started_at", RecordValue::DateTime(self.started_at)),
        ]))
    }

    /// Serializes the summary into indented JSON text.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn push_incomplete(&mut self, id: &str, status: EpisodeStatus, reason: String) {
        self.episodes.push(EpisodeSummary {
            id: id.to_string(),
            status,
            termination: None,
            stats: None,
            reason: Some(reason),
        });
    }

    fn update_means(&mut self) {
        let n = self.completed as f32;
        let (ret, horizon, success) = self
            .completed_stats()
            .fold((0f32, 0f32, 0f32), |(r, h, s), st| {
                (r + st.ret, h + st.horizon as f32, s + st.success_rate)
            });
        self.mean_return = ret / n;
        self.mean_horizon = horizon / n;
        self.success_rate = success / n;
    }
}
