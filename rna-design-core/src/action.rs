//! Action representations and action spaces

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for actions in an environment
pub trait Action: Clone + Debug + Send + Sync {
    /// Convert action to a vector representation
    fn to_vec(&self) -> Vec<f64>;
}

/// Trait for defining action spaces
pub trait ActionSpace: Send + Sync {
    /// The type of actions in this space
    type Action: Action;

    /// Sample an action uniformly from the space using `rng`
    fn sample_with(&self, rng: &mut dyn rand::RngCore) -> Self::Action;

    /// Sample an action using the thread-local generator
    fn sample(&self) -> Self::Action {
        self.sample_with(&mut rand::thread_rng())
    }

    /// Check if an action is valid within this space
    fn contains(&self, action: &Self::Action) -> bool;

    /// Number of distinct actions, if finite
    fn size(&self) -> Option<usize>;
}

/// Discrete action, an index into a fixed table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscreteAction(pub usize);

impl Action for DiscreteAction {
    #[allow(clippy::cast_precision_loss)]
    fn to_vec(&self) -> Vec<f64> {
        vec![self.0 as f64]
    }
}

impl From<usize> for DiscreteAction {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Discrete action space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteSpace {
    /// Number of discrete actions
    pub n: usize,
}

impl DiscreteSpace {
    /// Create a new discrete action space
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl ActionSpace for DiscreteSpace {
    type Action = DiscreteAction;

    fn sample_with(&self, rng: &mut dyn rand::RngCore) -> Self::Action {
        DiscreteAction(rng.gen_range(0..self.n))
    }

    fn contains(&self, action: &Self::Action) -> bool {
        action.0 < self.n
    }

    fn size(&self) -> Option<usize> {
        Some(self.n)
    }
}
