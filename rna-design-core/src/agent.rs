//! Decision-making agent contract

use crate::{Action, Observation, Step};

/// An agent receives observations and returns one action per call
pub trait Agent: Send {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;

    /// Select an action given an observation
    fn act(&mut self, observation: &Self::Observation) -> crate::Result<Self::Action>;

    /// Process a step from the environment (for learning)
    fn observe(&mut self, _step: &Step<Self::Observation>) -> crate::Result<()> {
        Ok(())
    }
}
