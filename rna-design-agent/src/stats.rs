//! Aggregate figures over episode records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use rna_design_env::{EpisodeRecord, TargetId};

/// Figures for the episodes of a single target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetStatistics {
    /// Target the figures belong to
    pub target_id: TargetId,
    /// Number of finished episodes
    pub num_episodes: usize,
    /// Best fractional distance reached
    pub min_distance: f64,
    /// Fractional distance of the most recent episode
    pub last_distance: f64,
    /// Mean fractional distance
    pub mean_distance: f64,
}

impl TargetStatistics {
    /// Whether some episode designed the target exactly
    #[must_use]
    pub fn solved(&self) -> bool {
        self.min_distance <= 0.0
    }
}

/// Per-target and overall figures, the quantities an optimizer minimises
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStatistics {
    /// Per-target figures, ordered by target id
    pub targets: Vec<TargetStatistics>,
    /// Targets whose best distance is zero
    pub num_solved: usize,
    /// Sum of the per-target best distances
    pub sum_of_min_distances: f64,
    /// Sum of the per-target most recent distances
    pub sum_of_last_distances: f64,
}

impl EpisodeStatistics {
    /// Group `records` by target, each group ordered by time
    #[must_use]
    pub fn from_records(records: &[EpisodeRecord]) -> Self {
        let mut groups: BTreeMap<TargetId, Vec<&EpisodeRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.target_id).or_default().push(record);
        }

        let mut stats = Self::default();
        for (target_id, mut group) in groups {
            group.sort_by_key(|r| r.wall_clock_time);
            let distances: Vec<f64> = group.iter().map(|r| r.fractional_structural_distance).collect();
            let Some(&last_distance) = distances.last() else {
                continue;
            };

            let target = TargetStatistics {
                target_id,
                num_episodes: distances.len(),
                min_distance: Statistics::min(&distances),
                last_distance,
                mean_distance: Statistics::mean(&distances),
            };
            if target.solved() {
                stats.num_solved += 1;
            }
            stats.sum_of_min_distances += target.min_distance;
            stats.sum_of_last_distances += target.last_distance;
            stats.targets.push(target);
        }
        stats
    }

    /// Aggregate the record lists of several workers as one run
    #[must_use]
    pub fn merge_workers(workers: Vec<Vec<EpisodeRecord>>) -> Self {
        let records: Vec<EpisodeRecord> = workers.into_iter().flatten().collect();
        Self::from_records(&records)
    }

    /// Figures for one target
    #[must_use]
    pub fn target(&self, target_id: TargetId) -> Option<&TargetStatistics> {
        self.targets.iter().find(|t| t.target_id == target_id)
    }
}
