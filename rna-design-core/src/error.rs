//! Error types shared by the RNA design crates

use thiserror::Error;

/// Core error type for design operations
#[derive(Error, Debug)]
pub enum DesignError {
    /// Dot-bracket string with unbalanced brackets or foreign symbols
    #[error("Malformed structure at position {position}: {reason}")]
    MalformedStructure {
        /// Index of the offending symbol
        position: usize,
        /// What is wrong at that position
        reason: String,
    },

    /// Action outside the 4-entry assignment tables
    #[error("Invalid action: {0}")]
    InvalidAction(usize),

    /// Site index outside `[0, len)`
    #[error("Site {site} out of range for sequence of length {len}")]
    SiteOutOfRange {
        /// Requested site
        site: usize,
        /// Sequence length
        len: usize,
    },

    /// Site written twice
    #[error("Site {0} is already assigned")]
    SiteAlreadyAssigned(usize),

    /// Two sequences that must be the same length are not
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Operation called in the wrong episode state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Candidate materialized before every site was assigned
    #[error("Incomplete sequence: {unassigned} site(s) unassigned")]
    IncompleteSequence {
        /// Number of unassigned sites
        unassigned: usize,
    },

    /// Sequence text with a symbol outside the nucleotide alphabet
    #[error("Invalid nucleotide {symbol:?} at position {position}")]
    InvalidSequence {
        /// Index of the offending symbol
        position: usize,
        /// The offending symbol
        symbol: char,
    },

    /// Folding oracle failed or returned malformed output
    #[error("Folding oracle error: {0}")]
    Oracle(String),

    /// Configuration value out of its domain
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Target cycle built over no targets
    #[error("Target set is empty")]
    EmptyTargetSet,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for design operations
pub type Result<T> = std::result::Result<T, DesignError>;
