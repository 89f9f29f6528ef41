use crate::util::ndarray::pyany_to_arrayd;
use anyhow::{Context, Result};
use demorun_core::{dataset::DatasetStore, error::DemorunError};
use log::info;
use ndarray::ArrayD;
use pyo3::{types::PyTuple, PyAny, PyObject, Python, ToPyObject};
use std::path::{Path, PathBuf};

/// A dataset in an HDF5 file, read with h5py.
///
/// The file is opened read-only and closed on drop.
pub struct Hdf5Dataset {
    path: PathBuf,
    file: PyObject,
}

impl Hdf5Dataset {
    /// Opens an HDF5 file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let path_str = path
            .to_str()
            .with_context(|| format!("Invalid path: {:?}", path))?
            .to_string();
        info!("Open dataset {:?}", path);

        Python::with_gil(|py| {
            let h5py = py.import("h5py")?;
            let file = h5py
                .getattr("File")?
                .call1((path_str, "r"))
                .with_context(|| format!("Failed to open {:?}", path))?
                .to_object(py);
            Ok(Self { path, file })
        })
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn node<'py>(&'py self, py: Python<'py>, path: &str) -> Result<&'py PyAny> {
        let file = self.file.as_ref(py);
        if !file.contains(path)? {
            return Err(DemorunError::MissingKey(path.to_string()).into());
        }
        Ok(file.get_item(path)?)
    }

    fn read<T: numpy::Element>(&self, path: &str, dtype: &str) -> Result<ArrayD<T>> {
        Python::with_gil(|py| {
            // ds[()] reads the whole dataset
            let value = self.node(py, path)?.get_item(PyTuple::empty(py))?;
            pyany_to_arrayd::<T>(py, value, dtype)
                .with_context(|| format!("Failed to read {} as {}", path, dtype))
        })
    }
}

impl DatasetStore for Hdf5Dataset {
    fn keys(&self, path: &str) -> Result<Vec<String>> {
        Python::with_gil(|py| {
            let keys = self.node(py, path)?.call_method0("keys")?;
            let mut out = vec![];
            for k in keys.iter()? {
                out.push(k?.extract::<String>()?);
            }
            Ok(out)
        })
    }

    fn contains(&self, path: &str) -> bool {
        Python::with_gil(|py| self.file.as_ref(py).contains(path).unwrap_or(false))
    }

    fn read_f32(&self, path: &str) -> Result<ArrayD<f32>> {
        self.read(path, "float32")
    }

    fn read_f64(&self, path: &str) -> Result<ArrayD<f64>> {
        self.read(path, "float64")
    }

    fn attr(&self, path: &str, name: &str) -> Result<String> {
        Python::with_gil(|py| {
            let attrs = self.node(py, path)?.getattr("attrs")?;
            if !attrs.contains(name)? {
                return Err(DemorunError::MissingAttr {
                    path: path.to_string(),
                    name: name.to_string(),
                }
                .into());
            }
            let value = attrs.get_item(name)?;
            // Attributes written by older h5py are bytes
            match value.extract::<String>() {
                Ok(s) => Ok(s),
                Err(_) => Ok(value.call_method1("decode", ("utf-8",))?.extract()?),
            }
        })
    }
}

impl Drop for Hdf5Dataset {
    fn drop(&mut self) {
        Python::with_gil(|py| {
            if let Err(e) = self.file.call_method0(py, "close") {
                log::warn!("Failed to close {:?}: {}", self.path, e);
            }
        })
    }
}
