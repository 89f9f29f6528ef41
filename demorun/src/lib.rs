//! Command-line front-end of demorun.
//!
//! The binary is in `src/main.rs`; this library holds utilities shared with
//! scripts, e.g. downloading datasets and checkpoints.
pub mod util;
