use crate::util::ndarray::{arrayd_to_pyobj, rgb_to_arrayd};
use anyhow::Result;
use demorun_core::video::VideoSink;
use image::RgbImage;
use log::{debug, warn};
use pyo3::{types::IntoPyDict, PyObject, Python, ToPyObject};
use std::path::{Path, PathBuf};

/// Writes frames with `imageio.get_writer()`, e.g. into an mp4 file.
///
/// The writer is closed on drop if [`VideoSink::close`] has not been called.
pub struct ImageioSink {
    path: PathBuf,
    writer: Option<PyObject>,
}

impl ImageioSink {
    /// Opens a writer. The format is chosen by imageio from the extension.
    pub fn create(path: impl AsRef<Path>, fps: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let path_str = path.to_string_lossy().to_string();
        Python::with_gil(|py| {
            let imageio = py.import("imageio")?;
            let writer = imageio
                .call_method(
                    "get_writer",
                    (path_str,),
                    Some(vec![("fps", fps)].into_py_dict(py)),
                )?
                .to_object(py);
            Ok(Self {
                path,
                writer: Some(writer),
            })
        })
    }
}

impl VideoSink for ImageioSink {
    fn append(&mut self, frame: &RgbImage) -> Result<()> {
        let writer = match self.writer.as_ref() {
            Some(writer) => writer,
            None => anyhow::bail!("{:?} is already closed", self.path),
        };
        let frame = rgb_to_arrayd(frame)?;
        Python::with_gil(|py| {
            writer.call_method1(py, "append_data", (arrayd_to_pyobj(py, &frame),))?;
            Ok(())
        })
    }

    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            Python::with_gil(|py| writer.call_method0(py, "close"))?;
            debug!("Closed {:?}", self.path);
        }
        Ok(())
    }
}

impl Drop for ImageioSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close {:?}: {:#}", self.path, e);
        }
    }
}
