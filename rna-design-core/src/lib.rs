//! Core environment and agent types for sequential RNA design
//!
//! This crate provides the environment-agnostic abstractions shared by the
//! design environment and the agents that drive it: discrete actions,
//! observations, rewards, the step-wise `Environment` contract and the
//! error type used across the workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod agent;
pub mod environment;
pub mod error;
pub mod observation;
pub mod reward;

// Re-export core traits and types
pub use action::{Action, ActionSpace, DiscreteAction, DiscreteSpace};
pub use agent::Agent;
pub use environment::{Environment, Episode, Step, StepInfo, TrackedEnvironment};
pub use error::{DesignError, Result};
pub use observation::{Observation, ObservationSpace};
pub use reward::Reward;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, Agent, DesignError, DiscreteAction, DiscreteSpace, Environment,
        Observation, ObservationSpace, Result, Reward, Step,
    };
}
