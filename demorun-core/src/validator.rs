//! Consistency checks of recorded demonstrations.
//!
//! [`Validator`] never aborts on the first violation; it runs every check and
//! collects the violations in a [`ValidationReport`]. It is up to the caller
//! to treat a failed report as fatal, e.g. to skip the demonstration.
mod report;
use crate::{
    dataset::{DatasetStore, Demonstration},
    error::DemorunError,
    Action,
};
use anyhow::Result;
use log::warn;
use ndarray::{ArrayD, Axis};
pub use report::{CheckKind, CheckOutcome, DatasetValidation, ValidationReport};
use serde::{Deserialize, Serialize};

/// Tolerance of the comparison of recorded values.
///
/// Values `a` and `b` are considered equal if `|a - b| <= atol + rtol * |b|`.
/// Exact equality is not used since datasets may be stored in reduced precision.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct Tolerance {
    /// Absolute tolerance.
    pub atol: f32,

    /// Relative tolerance.
    pub rtol: f32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            atol: 1e-6,
            rtol: 1e-5,
        }
    }
}

impl Tolerance {
    /// Returns `true` if `a` and `b` are equal within the tolerance.
    pub fn is_close(&self, a: f32, b: f32) -> bool {
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }
}

/// Checks shape and alignment invariants of a [`Demonstration`].
#[derive(Clone, Debug, Default)]
pub struct Validator {
    tolerance: Tolerance,
    action_dim: Option<usize>,
}

fn timesteps(array: &ArrayD<f32>) -> usize {
    array.shape().first().cloned().unwrap_or(0)
}

impl Validator {
    /// Constructs a validator with the default tolerance.
    ///
    /// The action shape check is skipped unless [`Validator::action_dim`] is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tolerance of the alignment check.
    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the dimensionality of the action space of the target environment.
    pub fn action_dim(mut self, action_dim: usize) -> Self {
        self.action_dim = Some(action_dim);
        self
    }

    /// Runs all checks on the demonstration.
    pub fn validate(&self, demo: &Demonstration) -> ValidationReport {
        ValidationReport {
            demo: demo.id.clone(),
            checks: vec![
                self.check_shape(demo),
                self.check_length(demo),
                self.check_alignment(demo),
                self.check_action_shape(demo),
            ],
        }
    }

    /// Validates all demonstrations of a dataset.
    ///
    /// A demonstration which cannot be loaded is logged and recorded in
    /// [`DatasetValidation::unreadable`]; the others are still validated.
    /// Reports are written to the log.
    pub fn validate_dataset<S: DatasetStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<DatasetValidation> {
        let mut validation = DatasetValidation::default();
        for id in store.demo_ids()? {
            match Demonstration::load(store, &id) {
                Ok(demo) => {
                    let report = self.validate(&demo);
                    report.log();
                    validation.reports.push(report);
                }
                Err(e) => {
                    warn!("{}: failed to load: {:#}", id, e);
                    validation.unreadable.push((id, format!("{:#}", e)));
                }
            }
        }
        Ok(validation)
    }

    fn integrity(
        demo: &Demonstration,
        channel: Option<&str>,
        timestep: Option<usize>,
        msg: String,
    ) -> DemorunError {
        DemorunError::DataIntegrity {
            demo: demo.id.clone(),
            channel: channel.map(|c| c.to_string()),
            timestep,
            msg,
        }
    }

    fn check_shape(&self, demo: &Demonstration) -> CheckOutcome {
        let n = demo.len();
        let mut issues = vec![];
        let next_obs = demo.next_observations.iter().flat_map(|m| m.iter());
        let channels = demo
            .observations
            .iter()
            .map(|(k, v)| (format!("obs/{}", k), v))
            .chain(next_obs.map(|(k, v)| (format!("next_obs/{}", k), v)));

        for (channel, array) in channels {
            let len = timesteps(array);
            if len != n {
                issues.push(Self::integrity(
                    demo,
                    Some(&channel),
                    None,
                    format!("{} has {} timesteps, actions have {}", channel, len, n),
                ));
            }
        }

        CheckOutcome {
            kind: CheckKind::Shape,
            performed: true,
            issues,
        }
    }

    fn check_length(&self, demo: &Demonstration) -> CheckOutcome {
        let n = demo.len();
        let mut lengths = vec![("rewards", demo.rewards.len()), ("dones", demo.dones.len())];
        if let Some(states) = demo.states.as_ref() {
            lengths.push(("states", states.nrows()));
        }

        let issues = lengths
            .into_iter()
            .filter(|(_, len)| *len != n)
            .map(|(name, len)| {
                Self::integrity(
                    demo,
                    Some(name),
                    None,
                    format!("{} has {} entries, actions have {}", name, len, n),
                )
            })
            .collect();

        CheckOutcome {
            kind: CheckKind::Length,
            performed: true,
            issues,
        }
    }

    fn check_alignment(&self, demo: &Demonstration) -> CheckOutcome {
        let next_observations = match demo.next_observations.as_ref() {
            Some(v) => v,
            None => {
                return CheckOutcome {
                    kind: CheckKind::Alignment,
                    performed: false,
                    issues: vec![],
                }
            }
        };

        let mut issues = vec![];
        for (channel, obs) in demo.observations.iter() {
            let next_obs = match next_observations.get(channel) {
                Some(v) => v,
                None => {
                    issues.push(Self::integrity(
                        demo,
                        Some(channel),
                        None,
                        "channel is missing in next_obs".to_string(),
                    ));
                    continue;
                }
            };

            if obs.shape().get(1..) != next_obs.shape().get(1..) {
                issues.push(Self::integrity(
                    demo,
                    Some(channel),
                    None,
                    format!(
                        "obs has shape {:?}, next_obs has shape {:?}",
                        obs.shape(),
                        next_obs.shape()
                    ),
                ));
                continue;
            }

            // obs[t + 1] is compared with next_obs[t]
            let n = timesteps(obs).min(timesteps(next_obs));
            let offending = (0..n.saturating_sub(1)).find(|&t| {
                let o = obs.index_axis(Axis(0), t + 1);
                let no = next_obs.index_axis(Axis(0), t);
                !o.iter()
                    .zip(no.iter())
                    .all(|(a, b)| self.tolerance.is_close(*a, *b))
            });

            if let Some(t) = offending {
                issues.push(Self::integrity(
                    demo,
                    Some(channel),
                    Some(t),
                    format!("obs[{}] differs from next_obs[{}]", t + 1, t),
                ));
            }
        }

        CheckOutcome {
            kind: CheckKind::Alignment,
            performed: true,
            issues,
        }
    }

    fn check_action_shape(&self, demo: &Demonstration) -> CheckOutcome {
        let action_dim = match self.action_dim {
            Some(d) => d,
            None => {
                return CheckOutcome {
                    kind: CheckKind::ActionShape,
                    performed: false,
                    issues: vec![],
                }
            }
        };

        let issues = if demo.actions.ndim() == 0 {
            Action::new(demo.actions.clone())
                .check_dim(action_dim, None)
                .err()
                .into_iter()
                .collect()
        } else {
            demo.actions()
                .iter()
                .enumerate()
                .find_map(|(t, act)| act.check_dim(action_dim, Some(t)).err())
                .into_iter()
                .collect()
        };

        CheckOutcome {
            kind: CheckKind::ActionShape,
            performed: true,
            issues,
        }
    }
}
