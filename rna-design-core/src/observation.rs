//! Observation representations and observation spaces

use std::fmt::Debug;

/// Trait for observations from an environment
pub trait Observation: Clone + Debug + Send + Sync {
    /// Convert observation to a feature vector
    fn to_vec(&self) -> Vec<f64>;

    /// Get the shape of the observation
    fn shape(&self) -> Vec<usize>;

    /// Observation as an n-dimensional array of its own shape
    fn to_array(&self) -> crate::Result<ndarray::ArrayD<f64>> {
        let shape = self.shape();
        let data = self.to_vec();
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(crate::DesignError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(&shape), data)
            .map_err(|e| crate::DesignError::Other(e.into()))
    }
}

/// Trait for defining observation spaces
pub trait ObservationSpace: Send + Sync {
    /// The type of observations in this space
    type Observation: Observation;

    /// Check if an observation is valid within this space
    fn contains(&self, obs: &Self::Observation) -> bool;

    /// Get the shape of observations in this space
    fn shape(&self) -> Vec<usize>;
}
