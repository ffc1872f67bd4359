//! Agents and run drivers for sequential RNA design
//!
//! This crate provides:
//! - A seeded random baseline agent
//! - An episode runner with timeout and stop-once-solved policies
//! - A multi-worker driver on the tokio blocking pool
//! - Per-target statistics over episode records

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod random;
pub mod runner;
pub mod stats;
pub mod workers;

pub use random::RandomAgent;
pub use runner::{run_design, RunSummary, RunnerConfig, StopReason};
pub use stats::{EpisodeStatistics, TargetStatistics};
pub use workers::{run_workers, WorkerConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        run_design, run_workers, EpisodeStatistics, RandomAgent, RunnerConfig, WorkerConfig,
    };
    pub use rna_design_core::prelude::*;
}
