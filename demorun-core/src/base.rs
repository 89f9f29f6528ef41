//! Core functionalities.
mod env;
mod policy;
mod step;
mod types;
pub use env::{Env, RenderRequest, Success};
pub use policy::Policy;
pub use step::Step;
pub use types::{Action, Observation, SimState};
