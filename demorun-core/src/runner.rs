//! Playback of datasets and rollout of policies.
//!
//! Episodes of a run are executed strictly one after another on a single
//! [`EpisodeController`]. All episodes share one video. An episode aborted by
//! an action shape or environment error is counted as failed and the run
//! continues with the next one; other errors abort the run. The video is
//! closed in either case.
mod config;
mod summary;
use crate::{
    dataset::{DatasetStore, Demonstration},
    driver::{PolicyDriver, ReplayDriver, TrajectoryDriver},
    episode::{EpisodeController, ResetMode},
    error::DemorunError,
    frame::{FrameCapture, FrameMultiplexer},
    record::{Record, RecordValue, Recorder},
    validator::Validator,
    video::VideoSink,
    Env, Policy,
};
use anyhow::Result;
pub use config::RunConfig;
use log::{info, warn};
pub use summary::{EpisodeStatus, EpisodeSummary, RunSummary};

/// Frame multiplexer writing to any kind of sink.
pub type Frames = FrameMultiplexer<Box<dyn VideoSink>>;

/// Runs one episode and adds its outcome to `summary`.
fn run_one<E, D, R>(
    id: &str,
    ctrl: &mut EpisodeController<E>,
    reset: &ResetMode,
    driver: &mut D,
    frames: Option<&mut Frames>,
    recorder: &mut R,
    summary: &mut RunSummary,
) -> Result<()>
where
    E: Env,
    D: TrajectoryDriver + ?Sized,
    R: Recorder + ?Sized,
{
    let frames = frames.map(|f| f as &mut dyn FrameCapture<E>);
    match ctrl.run_episode(reset, driver, frames, recorder) {
        Ok((stats, termination)) => {
            info!(
                "{}: {} (Return = {}, Horizon = {}, SuccessRate = {})",
                id, termination, stats.ret, stats.horizon, stats.success_rate
            );
            let record = stats.to_record().merge(Record::from_slice(&[
                ("episode", RecordValue::String(id.to_string())),
                ("termination", RecordValue::String(termination.to_string())),
            ]));
            recorder.write(record);
            summary.push_completed(id, stats, termination);
            Ok(())
        }
        Err(e) => match e.downcast_ref::<DemorunError>() {
            Some(err) if err.is_episode_fatal() => {
                warn!("{}: episode failed: {}", id, err);
                summary.push_failed(id, err.to_string());
                Ok(())
            }
            _ => Err(e),
        },
    }
}

fn finish(mut summary: RunSummary, frames: Option<Frames>) -> Result<RunSummary> {
    if let Some(frames) = frames {
        summary.set_frame_stats(frames.finish()?);
    }
    info!(
        "Completed {}, skipped {}, failed {}",
        summary.completed, summary.skipped, summary.failed
    );
    Ok(summary)
}

/// Plays back the demonstrations of a dataset.
///
/// Demonstrations are processed in the order of their numeric suffix. Each
/// one is validated first; the environment is reset to the first recorded
/// snapshot when the demonstration has one, and the recorded actions are
/// replayed.
pub struct Playback<'a, S: DatasetStore + ?Sized> {
    store: &'a S,
    config: RunConfig,
}

impl<'a, S: DatasetStore + ?Sized> Playback<'a, S> {
    /// Constructs a playback of the demonstrations in `store`.
    pub fn new(store: &'a S, config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Ids of the demonstrations to play back.
    pub fn demo_ids(&self) -> Result<Vec<String>> {
        let mut ids = self.store.demo_ids()?;
        if let Some(n) = self.config.max_demos {
            ids.truncate(n);
        }
        Ok(ids)
    }

    /// Runs the playback.
    pub fn run<E, R>(
        &self,
        ctrl: &mut EpisodeController<E>,
        mut frames: Option<Frames>,
        recorder: &mut R,
    ) -> Result<RunSummary>
    where
        E: Env,
        R: Recorder + ?Sized,
    {
        let mut summary = RunSummary::new();
        let action_dim = ctrl.action_dim();
        let validator = Validator::new()
            .tolerance(self.config.tolerance)
            .action_dim(action_dim);

        for id in self.demo_ids()? {
            let demo = match Demonstration::load(self.store, &id) {
                Ok(demo) => demo,
                Err(e) => {
                    warn!("Skipping {}: {:#}", id, e);
                    summary.push_skipped(&id, format!("{:#}", e));
                    continue;
                }
            };

            let report = validator.validate(&demo);
            report.log();
            if !report.is_ok() && self.config.skip_invalid {
                let reason = report
                    .failures()
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                summary.push_skipped(&id, reason);
                continue;
            }

            let reset = match demo.initial_state() {
                Some(state) => ResetMode::Snapshot(state),
                None => ResetMode::Default,
            };
            let mut driver = ReplayDriver::from_demo(&demo, action_dim);
            info!("Playback {} ({} steps)", id, demo.len());
            run_one(
                &id,
                ctrl,
                &reset,
                &mut driver,
                frames.as_mut(),
                recorder,
                &mut summary,
            )?;
        }

        finish(summary, frames)
    }
}

/// Runs a policy for a number of episodes from the default initial state.
pub struct PolicyRollout {
    config: RunConfig,
}

impl PolicyRollout {
    /// Constructs a rollout.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs the rollout and returns the summary with the policy.
    pub fn run<E, P, R>(
        &self,
        ctrl: &mut EpisodeController<E>,
        policy: P,
        mut frames: Option<Frames>,
        recorder: &mut R,
    ) -> Result<(RunSummary, P)>
    where
        E: Env,
        P: Policy,
        R: Recorder + ?Sized,
    {
        let mut summary = RunSummary::new();
        let mut driver = PolicyDriver::new(policy, ctrl.action_dim());

        for ix in 0..self.config.n_episodes {
            let id = format!("rollout_{}", ix);
            run_one(
                &id,
                ctrl,
                &ResetMode::Default,
                &mut driver,
                frames.as_mut(),
                recorder,
                &mut summary,
            )?;
        }

        Ok((finish(summary, frames)?, driver.into_inner()))
    }
}
