//! Bindings of demorun to the Python robot-learning stack.
//!
//! * [`Hdf5Dataset`] reads robomimic datasets through [h5py](https://www.h5py.org).
//! * [`RobomimicEnv`] wraps environments created by
//!   [robomimic](https://robomimic.github.io) from the metadata of a dataset
//!   or from a checkpoint.
//! * [`RobomimicPolicy`] wraps a policy restored from a checkpoint.
//! * [`ImageioSink`] writes videos with [imageio](https://imageio.readthedocs.io).
//!
//! The Python interpreter is embedded with [pyo3]; the packages above have to
//! be importable from it.
mod dataset;
mod env;
mod policy;
pub mod util;
mod video;
pub use dataset::Hdf5Dataset;
pub use env::{RobomimicEnv, RobomimicEnvConfig};
pub use policy::RobomimicPolicy;
pub use video::ImageioSink;
