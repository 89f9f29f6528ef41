//! Episode Controller.
//!
//! [`EpisodeController`] runs one episode at a time against the environment it
//! owns: reset, then step with actions from a [`TrajectoryDriver`] until one of
//! the termination conditions is reached.
//!
//! Termination conditions are checked after every step. When several fire on
//! the same step, the reason is chosen in the order `Done`, `Success`,
//! `Horizon`. Exhaustion of the driver is detected before stepping, so it
//! never consumes a step.
mod state;
mod stats;
use crate::{
    driver::TrajectoryDriver,
    error::DemorunError,
    frame::FrameCapture,
    record::{Record, RecordValue, Recorder},
    Env, SimState,
};
use anyhow::Result;
use log::{debug, trace};
pub use state::{EpisodePhase, EpisodeState, Termination};
pub use stats::RolloutStats;

/// How the environment is reset at the beginning of an episode.
#[derive(Clone, Debug, PartialEq)]
pub enum ResetMode {
    /// Reset to the default initial distribution of the environment.
    Default,

    /// Reset to a recorded simulator snapshot, for exact replay.
    Snapshot(SimState),
}

/// Outcome of one step of an episode.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// 0-based index of the executed step.
    pub step_ix: usize,

    /// Values of the step: reward, flags, action and environment info.
    pub record: Record,

    /// Set if the episode ended with this step.
    pub termination: Option<Termination>,
}

/// Converts an error of the environment into [`DemorunError::Environment`].
///
/// Errors which are already a [`DemorunError`] are kept as is.
fn env_error(e: anyhow::Error) -> anyhow::Error {
    if e.downcast_ref::<DemorunError>().is_some() {
        e
    } else {
        DemorunError::Environment(format!("{:#}", e)).into()
    }
}

/// Runs episodes on an environment.
pub struct EpisodeController<E: Env> {
    env: E,
    horizon: usize,
    phase: EpisodePhase,
}

impl<E: Env> EpisodeController<E> {
    /// Constructs a controller. `horizon` is the maximum number of steps of an episode.
    pub fn new(env: E, horizon: usize) -> Self {
        Self {
            env,
            horizon,
            phase: EpisodePhase::NotStarted,
        }
    }

    /// The maximum number of steps of an episode.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Phase of the current or the last episode.
    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Dimensionality of the action space of the environment.
    pub fn action_dim(&self) -> usize {
        self.env.action_dim()
    }

    /// Returns a reference to the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns a mutable reference to the environment.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Returns the environment.
    pub fn into_env(self) -> E {
        self.env
    }

    /// Resets the environment and starts an episode.
    pub fn start(&mut self, reset: &ResetMode) -> Result<EpisodeState> {
        let obs = match reset {
            ResetMode::Default => self.env.reset(),
            ResetMode::Snapshot(state) => self.env.reset_to(state),
        };
        let obs = match obs {
            Ok(obs) => obs,
            Err(e) => {
                self.phase = EpisodePhase::Terminated(Termination::Failed);
                return Err(env_error(e));
            }
        };
        let state = EpisodeState::new(obs);
        self.phase = state.phase;
        Ok(state)
    }

    /// Takes one step of a running episode.
    ///
    /// Returns `Ok(None)` if the driver has no more actions; the episode is
    /// then terminated with [`Termination::Exhausted`] and the environment is
    /// not stepped.
    pub fn step<D: TrajectoryDriver + ?Sized>(
        &mut self,
        state: &mut EpisodeState,
        driver: &mut D,
    ) -> Result<Option<StepOutcome>> {
        if state.steps >= self.horizon {
            self.phase = EpisodePhase::Terminated(state.terminate(Termination::Horizon));
            return Ok(None);
        }

        let act = match driver.next_action(state) {
            Ok(Some(act)) => act,
            Ok(None) => {
                self.phase = EpisodePhase::Terminated(state.terminate(Termination::Exhausted));
                return Ok(None);
            }
            Err(e) => return Err(self.fail(state, e)),
        };

        let (step, info) = match self.env.step(&act) {
            Ok(v) => v,
            Err(e) => return Err(self.fail(state, env_error(e))),
        };
        let success = match self.env.is_success() {
            Ok(s) => s.get("task").cloned().unwrap_or(false),
            Err(e) => return Err(self.fail(state, env_error(e))),
        };

        let step_ix = state.steps;
        state.steps += 1;
        state.total_reward += step.reward;
        state.done = step.is_done;
        state.success |= success;
        state.obs = step.obs;
        trace!(
            "step {}: reward = {}, done = {}, success = {}",
            step_ix,
            step.reward,
            step.is_done,
            success
        );

        let record = Record::from_slice(&[
            ("step", RecordValue::Scalar(step_ix as f32)),
            ("reward", RecordValue::Scalar(step.reward)),
            ("done", RecordValue::Bool(step.is_done)),
            ("success", RecordValue::Bool(success)),
            ("action", RecordValue::Array1(act.to_vec())),
        ])
        .merge(info);

        let termination = if step.is_done {
            Some(Termination::Done)
        } else if success {
            Some(Termination::Success)
        } else if state.steps >= self.horizon {
            Some(Termination::Horizon)
        } else {
            None
        };
        if let Some(reason) = termination {
            self.phase = EpisodePhase::Terminated(state.terminate(reason));
        }

        Ok(Some(StepOutcome {
            step_ix,
            record,
            termination,
        }))
    }

    /// Runs an episode until termination.
    ///
    /// `frames` is given the environment after every step. Per-step records are
    /// written to `recorder`. Errors of the driver and the environment abort
    /// the episode and are returned; the phase becomes
    /// `Terminated(Failed)`.
    pub fn run_episode<D, R>(
        &mut self,
        reset: &ResetMode,
        driver: &mut D,
        mut frames: Option<&mut dyn FrameCapture<E>>,
        recorder: &mut R,
    ) -> Result<(RolloutStats, Termination)>
    where
        D: TrajectoryDriver + ?Sized,
        R: Recorder + ?Sized,
    {
        self.phase = EpisodePhase::NotStarted;
        if let Err(e) = driver.begin_episode() {
            self.phase = EpisodePhase::Terminated(Termination::Failed);
            return Err(e);
        }
        let mut state = self.start(reset)?;

        let termination = loop {
            let outcome = match self.step(&mut state, driver)? {
                Some(outcome) => outcome,
                None => match state.phase {
                    EpisodePhase::Terminated(reason) => break reason,
                    _ => break Termination::Exhausted,
                },
            };

            if let Some(frames) = frames.as_mut() {
                frames.capture(&mut self.env, outcome.step_ix)?;
            }
            recorder.write(outcome.record);

            if let Some(reason) = outcome.termination {
                break reason;
            }
        };

        let stats = RolloutStats::from(&state);
        debug!(
            "Episode terminated ({}): return = {}, horizon = {}, success = {}",
            termination, stats.ret, stats.horizon, state.success
        );
        Ok((stats, termination))
    }

    fn fail(&mut self, state: &mut EpisodeState, e: anyhow::Error) -> anyhow::Error {
        self.phase = EpisodePhase::Terminated(state.terminate(Termination::Failed));
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        driver::{PolicyDriver, ReplayDriver},
        dummy::{DummyEnv, DummyEnvConfig, DummyPolicy},
        record::{BufferedRecorder, NullRecorder},
        Action,
    };

    fn controller(config: DummyEnvConfig, horizon: usize) -> EpisodeController<DummyEnv> {
        EpisodeController::new(DummyEnv::new(config), horizon)
    }

    #[test]
    fn test_horizon() -> Result<()> {
        let mut ctrl = controller(DummyEnvConfig::default().action_dim(2), 10);
        let mut driver = PolicyDriver::new(DummyPolicy::constant(vec![0.0, 0.0]), 2);
        let (stats, termination) =
            ctrl.run_episode(&ResetMode::Default, &mut driver, None, &mut NullRecorder::new())?;
        assert_eq!(termination, Termination::Horizon);
        assert_eq!(stats.horizon, 10);
        assert_eq!(ctrl.env().n_steps(), 10);
        assert_eq!(ctrl.phase(), EpisodePhase::Terminated(Termination::Horizon));
        Ok(())
    }

    #[test]
    fn test_done_wins_over_success_and_horizon() -> Result<()> {
        let config = DummyEnvConfig::default()
            .action_dim(2)
            .done_at(3)
            .success_at(3);
        let mut ctrl = controller(config, 3);
        let mut driver = PolicyDriver::new(DummyPolicy::constant(vec![0.0, 0.0]), 2);
        let (stats, termination) =
            ctrl.run_episode(&ResetMode::Default, &mut driver, None, &mut NullRecorder::new())?;
        assert_eq!(termination, Termination::Done);
        assert_eq!(stats.horizon, 3);
        assert_eq!(stats.success_rate, 1.0);
        Ok(())
    }

    #[test]
    fn test_success_terminates() -> Result<()> {
        let config = DummyEnvConfig::default().action_dim(2).success_at(4);
        let mut ctrl = controller(config, 100);
        let mut driver = PolicyDriver::new(DummyPolicy::constant(vec![0.0, 0.0]), 2);
        let (stats, termination) =
            ctrl.run_episode(&ResetMode::Default, &mut driver, None, &mut NullRecorder::new())?;
        assert_eq!(termination, Termination::Success);
        assert_eq!(stats.horizon, 4);
        assert_eq!(stats.success_rate, 1.0);
        Ok(())
    }

    #[test]
    fn test_exhausted_before_step() -> Result<()> {
        let mut ctrl = controller(DummyEnvConfig::default().action_dim(2), 100);
        let mut driver = ReplayDriver::new(vec![Action::from_vec(vec![1.0, 0.0]); 5], 2);
        let mut recorder = BufferedRecorder::new();
        let (stats, termination) =
            ctrl.run_episode(&ResetMode::Default, &mut driver, None, &mut recorder)?;
        assert_eq!(termination, Termination::Exhausted);
        assert_eq!(stats.horizon, 5);
        assert_eq!(ctrl.env().n_steps(), 5);
        assert_eq!(recorder.len(), 5);
        Ok(())
    }

    #[test]
    fn test_env_error_fails_episode() {
        let config = DummyEnvConfig::default().action_dim(2).fail_step_at(2);
        let mut ctrl = controller(config, 100);
        let mut driver = PolicyDriver::new(DummyPolicy::constant(vec![0.0, 0.0]), 2);
        let err = ctrl
            .run_episode(&ResetMode::Default, &mut driver, None, &mut NullRecorder::new())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DemorunError>(),
            Some(DemorunError::Environment(_))
        ));
        assert_eq!(ctrl.phase(), EpisodePhase::Terminated(Termination::Failed));
    }
}
