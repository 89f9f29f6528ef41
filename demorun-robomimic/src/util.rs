//! Conversions between Python objects and the types of `demorun-core`.
pub mod ndarray {
    use anyhow::Result;
    use ndarray::{ArrayD, Ix3};
    use numpy::{Element, PyArrayDyn};
    use pyo3::{types::IntoPyDict, PyAny, PyObject, Python, ToPyObject};

    /// Converts an array-like object into an owned array of the given dtype.
    ///
    /// `dtype` is a numpy type name such as `float32`.
    pub fn pyany_to_arrayd<T: Element>(py: Python, obj: &PyAny, dtype: &str) -> Result<ArrayD<T>> {
        let np = py.import("numpy")?;
        let kwargs = vec![("dtype", dtype)].into_py_dict(py);
        let arr = np.getattr("asarray")?.call((obj,), Some(kwargs))?;
        let arr: &PyArrayDyn<T> = arr.extract()?;
        Ok(arr.to_owned_array())
    }

    /// Converts an array into a numpy array.
    pub fn arrayd_to_pyobj<T: Element>(py: Python, arr: &ArrayD<T>) -> PyObject {
        PyArrayDyn::<T>::from_array(py, arr).to_object(py)
    }

    /// Converts an `[H, W, 3]` array of `u8` into an image.
    pub fn arrayd_to_rgb(arr: ArrayD<u8>) -> Result<image::RgbImage> {
        let arr = arr.into_dimensionality::<Ix3>()?;
        let (h, w, c) = arr.dim();
        if c != 3 {
            anyhow::bail!("Expected 3 channels, got {}", c);
        }
        let img = image::RgbImage::from_fn(w as u32, h as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            image::Rgb([arr[[y, x, 0]], arr[[y, x, 1]], arr[[y, x, 2]]])
        });
        Ok(img)
    }

    /// Converts an image into an `[H, W, 3]` array of `u8`.
    pub fn rgb_to_arrayd(img: &image::RgbImage) -> Result<ArrayD<u8>> {
        let (w, h) = img.dimensions();
        let arr =
            ndarray::Array3::from_shape_vec((h as usize, w as usize, 3), img.as_raw().clone())?;
        Ok(arr.into_dyn())
    }
}

pub mod obs {
    use super::ndarray::{arrayd_to_pyobj, pyany_to_arrayd};
    use anyhow::Result;
    use demorun_core::Observation;
    use pyo3::{types::PyDict, PyAny, Python};

    /// Converts an observation dictionary into [`Observation`].
    pub fn pydict_to_obs(py: Python, obj: &PyAny) -> Result<Observation> {
        let dict: &PyDict = obj.downcast().map_err(pyo3::PyErr::from)?;
        let mut obs = Observation::empty();
        for (k, v) in dict.iter() {
            let k: String = k.extract()?;
            obs.insert(k, pyany_to_arrayd::<f32>(py, v, "float32")?);
        }
        Ok(obs)
    }

    /// Converts [`Observation`] into a dictionary of `float64` arrays.
    pub fn obs_to_pydict<'py>(py: Python<'py>, obs: &Observation) -> Result<&'py PyDict> {
        let dict = PyDict::new(py);
        for (k, v) in obs.iter() {
            dict.set_item(k, arrayd_to_pyobj(py, &v.mapv(f64::from)))?;
        }
        Ok(dict)
    }
}

pub mod state {
    use super::ndarray::{arrayd_to_pyobj, pyany_to_arrayd};
    use anyhow::Result;
    use demorun_core::SimState;
    use ndarray::Ix1;
    use pyo3::{types::PyDict, PyAny, Python};

    /// Converts [`SimState`] into the dictionary accepted by `reset_to()`.
    pub fn state_to_pydict<'py>(py: Python<'py>, state: &SimState) -> Result<&'py PyDict> {
        let dict = PyDict::new(py);
        dict.set_item("states", arrayd_to_pyobj(py, &state.states.clone().into_dyn()))?;
        if let Some(model) = state.model.as_ref() {
            dict.set_item("model", model)?;
        }
        Ok(dict)
    }

    /// Converts the dictionary returned by `get_state()` into [`SimState`].
    pub fn pydict_to_state(py: Python, obj: &PyAny) -> Result<SimState> {
        let states = pyany_to_arrayd::<f64>(py, obj.get_item("states")?, "float64")?
            .into_dimensionality::<Ix1>()?;
        let model = match obj.get_item("model") {
            Ok(m) if !m.is_none() => Some(m.extract::<String>()?),
            _ => None,
        };
        Ok(SimState::new(states, model))
    }
}

#[cfg(test)]
mod tests {
    use super::ndarray::{arrayd_to_rgb, rgb_to_arrayd};
    use anyhow::Result;
    use image::{Rgb, RgbImage};
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_rgb_layout() -> Result<()> {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([1, 2, 3]));
        let arr = rgb_to_arrayd(&img)?;
        assert_eq!(arr.shape(), &[2, 3, 3]);
        assert_eq!(arr[[1, 2, 2]], 3);
        assert_eq!(arrayd_to_rgb(arr)?, img);
        Ok(())
    }

    #[test]
    fn test_rgb_requires_3_channels() {
        let arr = ArrayD::<u8>::zeros(IxDyn(&[2, 2, 4]));
        assert!(arrayd_to_rgb(arr).is_err());
        let arr = ArrayD::<u8>::zeros(IxDyn(&[2, 2]));
        assert!(arrayd_to_rgb(arr).is_err());
    }
}
