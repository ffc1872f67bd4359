//! Terminal scoring with bounded local improvement

use serde::{Deserialize, Serialize};

use rna_design_core::{DesignError, Result};

use crate::candidate::CandidateSequence;
use crate::config::EnvironmentConfig;
use crate::oracle::{validate_fold, Fold, FoldingOracle};
use crate::search::MutationTuples;
use crate::structure::TargetStructure;

/// Count of positions where two equal-length structures differ
///
/// # Errors
/// `LengthMismatch` if the strings differ in length.
pub fn hamming_distance(a: &str, b: &str) -> Result<usize> {
    let (la, lb) = (a.chars().count(), b.chars().count());
    if la != lb {
        return Err(DesignError::LengthMismatch {
            expected: la,
            actual: lb,
        });
    }
    Ok(a.chars().zip(b.chars()).filter(|(x, y)| x != y).count())
}

/// Indices where two equal-length structures differ
#[must_use]
pub fn differing_sites(a: &str, b: &str) -> Vec<usize> {
    a.chars()
        .zip(b.chars())
        .enumerate()
        .filter_map(|(i, (x, y))| (x != y).then_some(i))
        .collect()
}

/// `(1 - fractional_distance) ^ exponent`, clamped into `[0, 1]`
#[must_use]
pub fn shaped_reward(fractional_distance: f64, exponent: f64) -> f64 {
    (1.0 - fractional_distance).clamp(0.0, 1.0).powf(exponent)
}

/// An exact correction found by the repair search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    /// The corrected sequence, folding exactly into the target
    pub sequence: String,
    /// Sites that were rewritten
    pub sites: Vec<usize>,
    /// Oracle calls spent by the search
    pub oracle_calls: usize,
}

/// Outcome of the repair search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// A combination folding exactly into the target
    Exact(Repair),
    /// Every combination tried; the best distance seen is reported
    Exhausted {
        /// Smallest distance among the trial folds
        best_distance: usize,
        /// Oracle calls spent by the search
        oracle_calls: usize,
    },
}

/// Everything computed for one finished candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    /// The materialized candidate
    pub sequence: String,
    /// Oracle prediction for the candidate
    pub fold: Fold,
    /// Distance of the unrepaired candidate
    pub original_distance: usize,
    /// Distance used for the reward
    pub structural_distance: usize,
    /// `structural_distance / L`
    pub fractional_distance: f64,
    /// Shaped reward in `[0, 1]`
    pub reward: f64,
    /// Exact correction, when the search found one
    pub repair: Option<Repair>,
}

impl Scoring {
    /// Whether the scored distance is zero
    #[must_use]
    pub fn solved(&self) -> bool {
        self.structural_distance == 0
    }
}

/// Scores finished candidates against their target
#[derive(Debug, Clone)]
pub struct RewardEngine<O> {
    oracle: O,
    mutation_threshold: Option<usize>,
    reward_exponent: f64,
}

impl<O: FoldingOracle> RewardEngine<O> {
    /// Engine with explicit parameters; a threshold of 0 disables repair
    pub fn new(oracle: O, mutation_threshold: Option<usize>, reward_exponent: f64) -> Self {
        Self {
            oracle,
            mutation_threshold: mutation_threshold.filter(|&t| t > 0),
            reward_exponent,
        }
    }

    /// Engine parameterised by an environment configuration
    pub fn from_config(oracle: O, config: &EnvironmentConfig) -> Self {
        Self::new(
            oracle,
            config.effective_mutation_threshold(),
            config.reward_exponent,
        )
    }

    /// The wrapped oracle
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    fn fold_checked(&self, sequence: &str) -> Result<Fold> {
        let fold = self.oracle.fold(sequence)?;
        validate_fold(sequence.chars().count(), &fold)?;
        Ok(fold)
    }

    /// Whether a candidate at `distance` qualifies for the repair search
    #[must_use]
    pub fn should_repair(&self, distance: usize) -> bool {
        matches!(self.mutation_threshold, Some(t) if distance > 0 && distance < t)
    }

    /// Fold, measure and, when close enough, try to repair `candidate`
    ///
    /// # Errors
    /// `IncompleteSequence` for an unfinished candidate, `LengthMismatch` if
    /// the candidate or the prediction does not match the target length, and
    /// any oracle failure.
    pub fn score(
        &self,
        target: &TargetStructure,
        candidate: &CandidateSequence,
    ) -> Result<Scoring> {
        if candidate.len() != target.len() {
            return Err(DesignError::LengthMismatch {
                expected: target.len(),
                actual: candidate.len(),
            });
        }

        let sequence = candidate.materialize()?;
        let fold = self.fold_checked(&sequence)?;
        let original_distance = hamming_distance(target.dot_bracket(), &fold.dot_bracket)?;

        let mut structural_distance = original_distance;
        let mut repair = None;
        if self.should_repair(original_distance) {
            match self.local_improvement(target, candidate, &fold.dot_bracket)? {
                SearchOutcome::Exact(found) => {
                    tracing::debug!(
                        target_id = target.id(),
                        original_distance,
                        oracle_calls = found.oracle_calls,
                        "repair search found an exact match"
                    );
                    structural_distance = 0;
                    repair = Some(found);
                }
                SearchOutcome::Exhausted {
                    best_distance,
                    oracle_calls,
                } => {
                    tracing::debug!(
                        target_id = target.id(),
                        original_distance,
                        best_distance,
                        oracle_calls,
                        "repair search exhausted without an exact match"
                    );
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let fractional_distance = structural_distance as f64 / target.len() as f64;
        let reward = shaped_reward(fractional_distance, self.reward_exponent);

        Ok(Scoring {
            sequence,
            fold,
            original_distance,
            structural_distance,
            fractional_distance,
            reward,
            repair,
        })
    }

    /// Brute-force every symbol combination over the sites where `predicted`
    /// differs from the target, stopping at the first exact match
    ///
    /// # Errors
    /// `LengthMismatch` if `predicted` has the wrong length, and any oracle
    /// failure.
    pub fn local_improvement(
        &self,
        target: &TargetStructure,
        candidate: &CandidateSequence,
        predicted: &str,
    ) -> Result<SearchOutcome> {
        let original = hamming_distance(target.dot_bracket(), predicted)?;
        let sites = differing_sites(target.dot_bracket(), predicted);
        tracing::trace!(target_id = target.id(), sites = sites.len(), "starting repair search");

        let mut best_distance = original;
        let mut oracle_calls = 0;
        for values in MutationTuples::new(sites.len()) {
            let trial = candidate.get_mutated(&values, &sites)?;
            let sequence = trial.materialize()?;
            let fold = self.fold_checked(&sequence)?;
            oracle_calls += 1;

            let distance = hamming_distance(target.dot_bracket(), &fold.dot_bracket)?;
            if distance == 0 {
                return Ok(SearchOutcome::Exact(Repair {
                    sequence,
                    sites,
                    oracle_calls,
                }));
            }
            best_distance = best_distance.min(distance);
        }

        Ok(SearchOutcome::Exhausted {
            best_distance,
            oracle_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{from_fn, Fold};
    use crate::structure::EncodingSpec;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn target(dot_bracket: &str) -> TargetStructure {
        TargetStructure::new(1, dot_bracket, EncodingSpec::new(0, false, false)).unwrap()
    }

    fn candidate(sequence: &str) -> CandidateSequence {
        sequence.parse().unwrap()
    }

    /// Folds to `"(...)"` only when site 1 holds a U, otherwise one site off
    fn picky_oracle(calls: &AtomicUsize) -> impl FoldingOracle + '_ {
        from_fn(move |seq: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            if seq.as_bytes()[1] == b'U' {
                Ok(Fold::new("(...)"))
            } else {
                Ok(Fold::new("(.(.)"))
            }
        })
    }

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance("...((...))", "...((...))").unwrap(), 0);
        assert_eq!(hamming_distance("...((.......))..", "...(((.....)))..").unwrap(), 2);
        assert!(matches!(
            hamming_distance("...", "...."),
            Err(DesignError::LengthMismatch { expected: 3, actual: 4 })
        ));
    }

    #[test]
    fn test_differing_sites() {
        assert_eq!(differing_sites("AAAbAAA", "AAAAAAA"), vec![3]);
        assert_eq!(differing_sites("...((.......))..", "...(((.....))).."), vec![5, 11]);
    }

    #[test]
    fn test_reward_shape() {
        assert_relative_eq!(shaped_reward(0.0, 3.0), 1.0);
        assert_relative_eq!(shaped_reward(0.5, 1.0), 0.5);
        assert_relative_eq!(shaped_reward(0.5, 2.0), 0.25);
        assert_relative_eq!(shaped_reward(1.0, 1.0), 0.0);
    }

    #[test]
    fn test_exact_fold_skips_search() {
        let calls = AtomicUsize::new(0);
        let engine = RewardEngine::new(picky_oracle(&calls), Some(5), 1.0);
        let scoring = engine.score(&target("(...)"), &candidate("GUAAC")).unwrap();

        assert!(scoring.solved());
        assert_eq!(scoring.original_distance, 0);
        assert!(scoring.repair.is_none());
        assert_relative_eq!(scoring.reward, 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exhausted_search_keeps_original_distance() {
        let calls = AtomicUsize::new(0);
        let engine = RewardEngine::new(picky_oracle(&calls), Some(5), 1.0);
        // Prediction "(.(.)" differs from "(...)" only at site 2, but the
        // oracle only cares about site 1, so the search cannot fix it
        let scoring = engine.score(&target("(...)"), &candidate("GAAAC")).unwrap();
        assert_eq!(scoring.original_distance, 1);
        assert_eq!(scoring.structural_distance, 1);
        assert!(scoring.repair.is_none());
        // one fold for the candidate, four trial folds
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_relative_eq!(scoring.fractional_distance, 0.2);
        assert_relative_eq!(scoring.reward, 0.8);
    }

    #[test]
    fn test_repair_stops_at_first_exact_match() {
        let calls = AtomicUsize::new(0);
        // Differences land on site 1; U is the last symbol tried
        let oracle = from_fn(|seq: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            match seq.as_bytes()[1] {
                b'U' => Ok(Fold::new("(...)")),
                _ => Ok(Fold::new("((..)")),
            }
        });
        let engine = RewardEngine::new(oracle, Some(3), 2.0);
        let scoring = engine.score(&target("(...)"), &candidate("GGAAC")).unwrap();

        assert_eq!(scoring.original_distance, 1);
        assert!(scoring.solved());
        let repair = scoring.repair.unwrap();
        assert_eq!(repair.sequence, "GUAAC");
        assert_eq!(repair.sites, vec![1]);
        assert_eq!(repair.oracle_calls, 4);
        assert_relative_eq!(scoring.reward, 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_repair_skipped_at_or_above_threshold() {
        let calls = AtomicUsize::new(0);
        let oracle = from_fn(|seq: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Fold::new(".".repeat(seq.len())))
        });
        let engine = RewardEngine::new(oracle, Some(2), 1.0);
        let scoring = engine.score(&target("(...)"), &candidate("GAAAC")).unwrap();

        assert_eq!(scoring.structural_distance, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!engine.should_repair(0));
        assert!(engine.should_repair(1));
        assert!(!engine.should_repair(2));
    }

    #[test]
    fn test_disabled_threshold() {
        let oracle = from_fn(|seq: &str| Ok(Fold::new(".".repeat(seq.len()))));
        let engine = RewardEngine::new(oracle, Some(0), 1.0);
        assert!(!engine.should_repair(1));
    }

    #[test]
    fn test_bad_oracle_output_propagates() {
        let oracle = from_fn(|_: &str| Ok(Fold::new("((")));
        let engine = RewardEngine::new(oracle, Some(5), 1.0);
        assert!(matches!(
            engine.score(&target("(...)"), &candidate("GAAAC")),
            Err(DesignError::LengthMismatch { expected: 5, actual: 2 })
        ));

        let oracle = from_fn(|_: &str| Err(DesignError::Oracle("offline".into())));
        let engine = RewardEngine::new(oracle, None, 1.0);
        assert!(matches!(
            engine.score(&target("(...)"), &candidate("GAAAC")),
            Err(DesignError::Oracle(_))
        ));
    }

    #[test]
    fn test_incomplete_candidate_rejected() {
        let oracle = from_fn(|seq: &str| Ok(Fold::new(".".repeat(seq.len()))));
        let engine = RewardEngine::new(oracle, None, 1.0);
        assert!(matches!(
            engine.score(&target("(...)"), &CandidateSequence::new(5)),
            Err(DesignError::IncompleteSequence { unassigned: 5 })
        ));
        assert!(matches!(
            engine.score(&target("(...)"), &CandidateSequence::new(4)),
            Err(DesignError::LengthMismatch { expected: 5, actual: 4 })
        ));
    }
}
