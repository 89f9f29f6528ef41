//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Functions in this crate return [`anyhow::Result`]; use
/// [`anyhow::Error::downcast_ref`] to recover the variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DemorunError {
    /// Shape or alignment invariant of a demonstration is violated.
    #[error("Data integrity error in {demo} (channel {channel:?}, timestep {timestep:?}): {msg}")]
    DataIntegrity {
        /// Demonstration id.
        demo: String,
        /// Offending channel, if the check is channel-wise.
        channel: Option<String>,
        /// First offending timestep, if known.
        timestep: Option<usize>,
        /// Description of the violation.
        msg: String,
    },

    /// An action does not have the dimensionality expected by the environment.
    #[error("Action shape error at timestep {timestep:?}: expected [{expected}], got {actual:?}")]
    ActionShape {
        /// Expected action dimensionality.
        expected: usize,
        /// Actual shape of the action.
        actual: Vec<usize>,
        /// Timestep of the action, if known.
        timestep: Option<usize>,
    },

    /// Failure reported by the environment in reset/step/render.
    #[error("Environment error: {0}")]
    Environment(String),

    /// Rendering of a camera failed at a step.
    #[error("Render error (camera {camera}, step {step}): {msg}")]
    Render {
        /// Camera name.
        camera: String,
        /// Step index.
        step: usize,
        /// Description of the failure.
        msg: String,
    },

    /// [`Policy::sample`](crate::Policy::sample) was requested before the episode was started.
    #[error("Policy episode has not been started")]
    PolicyNotStarted,

    /// Key path not found in the dataset store.
    #[error("Key not found in dataset: {0}")]
    MissingKey(String),

    /// Attribute not found in the dataset store.
    #[error("Attribute {name} not found at {path}")]
    MissingAttr {
        /// Key path of the group.
        path: String,
        /// Attribute name.
        name: String,
    },

    /// Invalid run configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl DemorunError {
    /// Returns `true` for errors which abort the current episode.
    ///
    /// Integrity and render errors are collected and logged instead.
    pub fn is_episode_fatal(&self) -> bool {
        matches!(
            self,
            Self::ActionShape { .. } | Self::Environment(_) | Self::PolicyNotStarted
        )
    }
}
