//! Observation, action and simulator snapshot.
use crate::error::DemorunError;
use ndarray::{Array1, ArrayD, IxDyn};
use std::{
    collections::{btree_map::Iter, BTreeMap},
    iter::FromIterator,
};

/// Observation of an environment at one timestep.
///
/// A mapping from a channel name (e.g. `robot0_eef_pos`) to an array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observation(BTreeMap<String, ArrayD<f32>>);

impl Observation {
    /// Creates an observation without channels.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a channel.
    pub fn insert(&mut self, channel: impl Into<String>, value: ArrayD<f32>) {
        self.0.insert(channel.into(), value);
    }

    /// Returns the array of the given channel.
    pub fn get(&self, channel: &str) -> Option<&ArrayD<f32>> {
        self.0.get(channel)
    }

    /// Returns an iterator over the channels.
    pub fn iter(&self) -> Iter<'_, String, ArrayD<f32>> {
        self.0.iter()
    }

    /// Names of the channels in lexicographic order.
    pub fn channels(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }

    /// The number of channels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there is no channel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ArrayD<f32>)> for Observation {
    fn from_iter<T: IntoIterator<Item = (K, ArrayD<f32>)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Action applied to an environment.
///
/// The shape is kept as is: a scalar (0-d) or wrongly shaped action is
/// representable so that it can be rejected by [`Action::check_dim`] instead of
/// being broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct Action(ArrayD<f32>);

impl Action {
    /// Wraps an array.
    pub fn new(data: ArrayD<f32>) -> Self {
        Self(data)
    }

    /// A 1-dimensional action.
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self(Array1::from(data).into_dyn())
    }

    /// A 0-dimensional action.
    pub fn scalar(v: f32) -> Self {
        Self(ArrayD::from_elem(IxDyn(&[]), v))
    }

    /// Shape of the action.
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// The underlying array.
    pub fn array(&self) -> &ArrayD<f32> {
        &self.0
    }

    /// Elements in logical order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.0.iter().cloned().collect()
    }

    /// Checks that the shape of the action is exactly `[expected]`.
    pub fn check_dim(&self, expected: usize, timestep: Option<usize>) -> Result<(), DemorunError> {
        if self.0.shape() == [expected] {
            Ok(())
        } else {
            Err(DemorunError::ActionShape {
                expected,
                actual: self.0.shape().to_vec(),
                timestep,
            })
        }
    }
}

/// Snapshot of the simulator, used to reset an environment for exact replay.
#[derive(Clone, Debug, PartialEq)]
pub struct SimState {
    /// Flattened physics state.
    pub states: Array1<f64>,

    /// Model description (MJCF XML) the state refers to.
    pub model: Option<String>,
}

impl SimState {
    /// Constructs a snapshot.
    pub fn new(states: Array1<f64>, model: Option<String>) -> Self {
        Self { states, model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dim() {
        let act = Action::from_vec(vec![0.0; 7]);
        assert!(act.check_dim(7, None).is_ok());

        let err = Action::scalar(0.5).check_dim(7, Some(3)).unwrap_err();
        assert_eq!(
            err,
            DemorunError::ActionShape {
                expected: 7,
                actual: vec![],
                timestep: Some(3)
            }
        );

        let act = Action::new(ArrayD::zeros(IxDyn(&[1, 7])));
        assert!(act.check_dim(7, None).is_err());
    }
}
