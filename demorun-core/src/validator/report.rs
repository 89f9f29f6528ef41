use crate::error::DemorunError;
use log::{info, warn};
use serde::Serialize;
use std::fmt;

/// Kind of a check performed by the [`Validator`](super::Validator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CheckKind {
    /// Observation channels have as many timesteps as actions.
    Shape,

    /// Rewards, dones and states have as many timesteps as actions.
    Length,

    /// `obs[t + 1]` equals `next_obs[t]` within tolerance.
    Alignment,

    /// Every action has the dimensionality of the action space.
    ActionShape,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Shape => "shape",
            Self::Length => "length",
            Self::Alignment => "alignment",
            Self::ActionShape => "action shape",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one check.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckOutcome {
    /// Kind of the check.
    pub kind: CheckKind,

    /// `false` if the check was not applicable, e.g. alignment without `next_obs`.
    pub performed: bool,

    /// Violations found by the check.
    pub issues: Vec<DemorunError>,
}

impl CheckOutcome {
    /// Returns `true` if no violation was found.
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Diagnostic report of a demonstration.
///
/// Every check is reported independently; a failing check does not prevent
/// the others from running.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationReport {
    /// Id of the demonstration.
    pub demo: String,

    /// Outcomes of the checks.
    pub checks: Vec<CheckOutcome>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_ok(&self) -> bool {
        self.checks.iter().all(|c| c.passed())
    }

    /// Outcome of the check of the given kind.
    pub fn check(&self, kind: CheckKind) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.kind == kind)
    }

    /// All violations.
    pub fn failures(&self) -> Vec<&DemorunError> {
        self.checks.iter().flat_map(|c| c.issues.iter()).collect()
    }

    /// Writes the report to the log.
    pub fn log(&self) {
        for check in self.checks.iter() {
            if !check.performed {
                info!("{}: {} check skipped", self.demo, check.kind);
            } else if check.passed() {
                info!("{}: {} check passed", self.demo, check.kind);
            } else {
                for issue in check.issues.iter() {
                    warn!("{}: {} check failed: {}", self.demo, check.kind, issue);
                }
            }
        }
    }
}

/// Reports of all demonstrations of a dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatasetValidation {
    /// Reports of the demonstrations which could be loaded.
    pub reports: Vec<ValidationReport>,

    /// Demonstrations which could not be loaded, with the reason.
    pub unreadable: Vec<(String, String)>,
}

impl DatasetValidation {
    /// The number of demonstrations.
    pub fn n_demos(&self) -> usize {
        self.reports.len() + self.unreadable.len()
    }

    /// The number of demonstrations which failed a check or could not be loaded.
    pub fn n_invalid(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_ok()).count() + self.unreadable.len()
    }

    /// Returns `true` if every demonstration was loaded and passed all checks.
    pub fn is_ok(&self) -> bool {
        self.n_invalid() == 0
    }
}
