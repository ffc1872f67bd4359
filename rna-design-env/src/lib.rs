//! Sequential RNA design environment
//!
//! This crate turns a set of target secondary structures into an episodic
//! decision process:
//! - Dot-bracket parsing, pairing maps and padded windowed encodings
//! - Candidate sequences built one site (or one base pair) per step
//! - Folding oracles and the Hamming-distance reward with local repair
//! - Target cycling, episode records and their JSON-lines persistence

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod candidate;
pub mod config;
pub mod episode;
pub mod oracle;
pub mod records;
pub mod reward;
pub mod search;
pub mod structure;
pub mod targets;

pub use candidate::{CandidateSequence, Nucleotide, ACTION_TO_BASE, ACTION_TO_PAIR, NUM_ACTIONS};
pub use config::EnvironmentConfig;
pub use episode::{DesignEpisode, EpisodeRecord, EpisodeState};
pub use oracle::{from_fn, validate_fold, Fold, FoldingOracle, FnOracle, NussinovOracle, RnaFoldOracle};
pub use records::{read_jsonl, write_jsonl};
pub use reward::{hamming_distance, shaped_reward, Repair, RewardEngine, Scoring, SearchOutcome};
pub use search::{MutationTuples, REPAIR_ALPHABET};
pub use structure::{
    compute_pairing, EncodingMode, EncodingSpec, Layout, PaddedEncoding, TargetId,
    TargetStructure, WindowSpace, WindowedObservation,
};
pub use targets::{TargetCycle, TargetSet};

// Re-export core types
pub use rna_design_core::{
    DesignError, DiscreteAction, Environment, Observation, ObservationSpace, Result, Reward, Step,
    StepInfo,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CandidateSequence, DesignEpisode, EnvironmentConfig, EpisodeRecord, FoldingOracle,
        NussinovOracle, RewardEngine, TargetSet, TargetStructure, WindowedObservation,
    };
    pub use rna_design_core::prelude::*;
}
