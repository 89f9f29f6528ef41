//! Read access to recorded demonstrations.
//!
//! A dataset is a hierarchical container laid out as follows:
//!
//! ```text
//! data                      attrs: env_args (JSON of the environment metadata)
//! data/demo_0               attrs: model_file (MJCF XML)
//! data/demo_0/actions       [T, A]
//! data/demo_0/obs/<ch>      [T, ...]
//! data/demo_0/next_obs/<ch> [T, ...]   (optional)
//! data/demo_0/rewards       [T]
//! data/demo_0/dones         [T]
//! data/demo_0/states        [T, S]     (optional)
//! ```
mod demo;
mod inspect;
mod memory;
mod meta;
mod store;
pub use demo::Demonstration;
pub use inspect::{DatasetInfo, DemoPreview, DemoSamples, TimestepPreview};
pub use memory::MemoryStore;
pub use meta::EnvMeta;
pub use store::{demo_path, sort_demo_ids, DatasetStore};
