//! Types and traits for recording telemetry of replays and rollouts.
//!
//! The episode controller does not print anything by itself. Instead, it emits
//! a [`Record`] at every step, the runner emits one at the end of every
//! episode, and a
//! [`Recorder`] given by the caller decides what to do with it: keep it in
//! memory ([`BufferedRecorder`]), forward it to the `log` facade
//! ([`LogRecorder`]) or discard it ([`NullRecorder`]).
//!
//! [`RecordStorage`] aggregates scalar values over many records, which is used
//! to summarize statistics over episodes.
//!
//! ```rust
//! use demorun_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("step", RecordValue::Scalar(1.0));
//! record.insert("reward", RecordValue::Scalar(-1.0));
//! record.insert("action", RecordValue::Array1(vec![0.0; 7]));
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
