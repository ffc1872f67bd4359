//! The design episode state machine

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use rna_design_core::{
    ActionSpace, DesignError, DiscreteAction, DiscreteSpace, Environment, ObservationSpace, Result,
    Reward, Step, StepInfo,
};

use crate::candidate::{check_action, CandidateSequence, NUM_ACTIONS};
use crate::config::EnvironmentConfig;
use crate::oracle::FoldingOracle;
use crate::reward::{RewardEngine, Scoring};
use crate::structure::{TargetId, TargetStructure, WindowSpace, WindowedObservation};
use crate::targets::{TargetCycle, TargetSet};

/// Outcome of one completed episode, for optimizers and logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Target the episode designed for
    pub target_id: TargetId,
    /// Wall-clock time at scoring
    pub wall_clock_time: DateTime<Utc>,
    /// Scored distance divided by the target length
    pub fractional_structural_distance: f64,
}

/// Coarse lifecycle state of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeState {
    /// No target bound yet
    Idle,
    /// Sites are being assigned
    Running,
    /// Every site assigned and scored
    Terminal,
}

enum Phase {
    Idle,
    Running {
        target: Arc<TargetStructure>,
        candidate: CandidateSequence,
        cursor: usize,
    },
    Terminal {
        target: Arc<TargetStructure>,
        candidate: CandidateSequence,
        scoring: Scoring,
    },
}

/// Binds one target to one candidate and assigns a site per step
pub struct DesignEpisode<O, R = ChaCha8Rng> {
    config: EnvironmentConfig,
    targets: TargetCycle<R>,
    engine: RewardEngine<O>,
    phase: Phase,
    records: Vec<EpisodeRecord>,
}

impl<O: FoldingOracle> DesignEpisode<O, ChaCha8Rng> {
    /// Episode over `set`, seeded from `config.seed` or entropy
    ///
    /// # Errors
    /// `InvalidConfig` for a bad configuration or mismatched target encodings,
    /// `EmptyTargetSet` for an empty set.
    pub fn new(set: &TargetSet, config: EnvironmentConfig, oracle: O) -> Result<Self> {
        let targets = match config.seed {
            Some(seed) => TargetCycle::seeded(set, seed)?,
            None => TargetCycle::from_entropy(set)?,
        };
        Self::with_cycle(targets, config, oracle)
    }
}

impl<O: FoldingOracle, R: Rng> DesignEpisode<O, R> {
    /// Episode drawing targets from an injected cycle
    ///
    /// # Errors
    /// `InvalidConfig` for a bad configuration or for targets encoded with
    /// other parameters than the configuration's.
    pub fn with_cycle(targets: TargetCycle<R>, config: EnvironmentConfig, oracle: O) -> Result<Self> {
        config.validate()?;
        let expected = config.encoding_spec();
        if let Some(target) = targets
            .targets()
            .iter()
            .find(|t| t.encoding_spec() != expected)
        {
            return Err(DesignError::InvalidConfig(format!(
                "target {} is encoded with {:?}, configuration expects {:?}",
                target.id(),
                target.encoding_spec(),
                expected
            )));
        }
        let engine = RewardEngine::from_config(oracle, &config);
        Ok(Self {
            config,
            targets,
            engine,
            phase: Phase::Idle,
            records: Vec::new(),
        })
    }

    /// Configuration in effect
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Lifecycle state
    pub fn state(&self) -> EpisodeState {
        match self.phase {
            Phase::Idle => EpisodeState::Idle,
            Phase::Running { .. } => EpisodeState::Running,
            Phase::Terminal { .. } => EpisodeState::Terminal,
        }
    }

    /// Bound target, if any
    pub fn target(&self) -> Option<&Arc<TargetStructure>> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Running { target, .. } | Phase::Terminal { target, .. } => Some(target),
        }
    }

    /// Candidate under construction, if any
    pub fn candidate(&self) -> Option<&CandidateSequence> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Running { candidate, .. } | Phase::Terminal { candidate, .. } => Some(candidate),
        }
    }

    /// Site the next action applies to, `None` outside `Running`
    pub fn cursor(&self) -> Option<usize> {
        match self.phase {
            Phase::Running { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    /// Scoring of the finished candidate, set once at the terminal step
    pub fn last_scoring(&self) -> Option<&Scoring> {
        match &self.phase {
            Phase::Terminal { scoring, .. } => Some(scoring),
            _ => None,
        }
    }

    /// Records of every completed episode, oldest first
    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    /// Drain the accumulated records
    pub fn take_records(&mut self) -> Vec<EpisodeRecord> {
        std::mem::take(&mut self.records)
    }

    /// Reward engine used at terminal steps
    pub fn engine(&self) -> &RewardEngine<O> {
        &self.engine
    }

    /// Space every window returned by `reset` and `step` belongs to
    pub fn observation_space(&self) -> WindowSpace {
        self.config.observation_space()
    }

    fn observation(&self, target: &TargetStructure, cursor: usize) -> Result<WindowedObservation> {
        target.window(cursor, self.config.window_width())
    }

    /// Draw the next target, bind an empty candidate and return the first window
    ///
    /// # Errors
    /// Only if the bound target cannot produce a window, which well-formed
    /// targets always can.
    pub fn reset(&mut self) -> Result<WindowedObservation> {
        let target = self.targets.next_target();
        let observation = self.observation(&target, 0)?;
        tracing::debug!(target_id = target.id(), len = target.len(), "episode reset");

        self.phase = Phase::Running {
            candidate: CandidateSequence::new(target.len()),
            target,
            cursor: 0,
        };
        Ok(observation)
    }

    /// Assign the site under the cursor and advance
    ///
    /// A closing bracket's site was already written by the paired assignment
    /// at its opening bracket; the action is still validated but nothing is
    /// written. The step that assigns the last site scores the candidate.
    ///
    /// # Errors
    /// `InvalidState` outside `Running`, `InvalidAction` for an action outside
    /// the tables, and any error from scoring. A rejected action changes
    /// nothing; after a scoring error the episode stays at the last site.
    pub fn step(&mut self, action: DiscreteAction) -> Result<Step<WindowedObservation>> {
        let state = self.state();
        let Phase::Running {
            target,
            candidate,
            cursor,
        } = &mut self.phase
        else {
            return Err(DesignError::InvalidState(format!(
                "step called in {state:?} state"
            )));
        };

        let site = *cursor;
        if candidate.is_assigned(site) {
            check_action(action)?;
        } else {
            candidate.assign(action, site, target.paired_site(site))?;
        }
        let next = site + 1;

        if next < target.len() {
            *cursor = next;
            let target = Arc::clone(target);
            return Ok(Step::running(self.observation(&target, next)?));
        }

        let scoring = self.engine.score(target, candidate)?;
        let record = EpisodeRecord {
            target_id: target.id(),
            wall_clock_time: Utc::now(),
            fractional_structural_distance: scoring.fractional_distance,
        };

        let mut info = StepInfo::default();
        info.insert("target_id", record.target_id);
        info.insert("sequence", scoring.sequence.clone());
        info.insert("folded_structure", scoring.fold.dot_bracket.clone());
        info.insert("fractional_distance", scoring.fractional_distance);
        if let Some(repair) = &scoring.repair {
            info.insert("repaired_sequence", repair.sequence.clone());
        }
        let reward = Reward::new(scoring.reward);

        if let Phase::Running {
            target, candidate, ..
        } = std::mem::replace(&mut self.phase, Phase::Idle)
        {
            self.phase = Phase::Terminal {
                target,
                candidate,
                scoring,
            };
        }
        tracing::debug!(
            target_id = record.target_id,
            fractional_distance = record.fractional_structural_distance,
            "episode scored"
        );
        self.records.push(record);

        Ok(Step::terminal(reward, info))
    }
}

impl<O, R> Environment for DesignEpisode<O, R>
where
    O: FoldingOracle,
    R: Rng + Send,
{
    type Observation = WindowedObservation;
    type Action = DiscreteAction;

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        Box::new(DiscreteSpace::new(NUM_ACTIONS))
    }

    fn observation_shape(&self) -> Vec<usize> {
        self.observation_space().shape()
    }

    fn reset(&mut self) -> Result<Self::Observation> {
        DesignEpisode::reset(self)
    }

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>> {
        DesignEpisode::step(self, action)
    }
}
