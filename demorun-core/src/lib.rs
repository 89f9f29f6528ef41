#![warn(missing_docs)]
//! Replay and rollout engine for robot-manipulation demonstrations.
//!
//! The engine reads recorded demonstrations from a [`DatasetStore`](dataset::DatasetStore),
//! checks their consistency with a [`Validator`](validator::Validator), and
//! replays them, or runs a [`Policy`], inside an [`Env`]. Episodes are run by
//! an [`EpisodeController`](episode::EpisodeController) which takes actions
//! from a [`TrajectoryDriver`](driver::TrajectoryDriver); rendered frames go
//! to a [`VideoSink`](video::VideoSink) through a
//! [`FrameMultiplexer`](frame::FrameMultiplexer).
//!
//! The simulator, the dataset file format and the policy are external; this
//! crate only defines the traits. Bindings to the Python stack are in
//! `demorun-robomimic`, and [`dummy`] has deterministic doubles for tests.
pub mod dataset;
pub mod driver;
pub mod dummy;
pub mod episode;
pub mod error;
pub mod frame;
pub mod record;
pub mod runner;
pub mod validator;
pub mod video;

mod base;
pub use base::{Action, Env, Observation, Policy, RenderRequest, SimState, Step, Success};
