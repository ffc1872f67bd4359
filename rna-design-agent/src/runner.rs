//! Episode loop driving one agent against one environment

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use rna_design_core::{Agent, DesignError, Environment, Episode, Result, TrackedEnvironment};
use rna_design_env::TargetSet;

/// When to stop running episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Wall-clock budget, checked between episodes
    pub timeout: Option<Duration>,
    /// Stop after the first episode with reward 1.0
    pub stop_once_solved: bool,
    /// Upper bound on finished episodes
    pub max_episodes: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            stop_once_solved: false,
            max_episodes: Some(1000),
        }
    }
}

impl RunnerConfig {
    /// Defaults for a run over `targets`: a single target stops once solved
    #[must_use]
    pub fn for_targets(targets: &TargetSet) -> Self {
        Self {
            stop_once_solved: targets.len() == 1,
            ..Self::default()
        }
    }

    /// Check that the run is bounded
    ///
    /// # Errors
    /// `InvalidConfig` when neither a timeout nor an episode limit is set.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_none() && self.max_episodes.is_none() {
            return Err(DesignError::InvalidConfig(
                "runner needs a timeout or an episode limit".into(),
            ));
        }
        Ok(())
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The wall-clock budget ran out
    Timeout,
    /// An episode reached reward 1.0 with `stop_once_solved` set
    Solved,
    /// `max_episodes` episodes finished
    EpisodeLimit,
}

/// Result of [`run_design`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Finished episodes, oldest first
    pub episodes: Vec<Episode>,
    /// Whether any episode reached reward 1.0
    pub solved: bool,
    /// Why the run ended
    pub stop_reason: StopReason,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

fn is_solved(reward: f64) -> bool {
    (reward - 1.0).abs() < f64::EPSILON
}

/// Run whole episodes of `agent` in `env` until `config` says stop
///
/// # Errors
/// `InvalidConfig` for an unbounded run, and any environment or agent error,
/// which aborts the run.
pub fn run_design<E, A>(env: E, agent: &mut A, config: &RunnerConfig) -> Result<RunSummary>
where
    E: Environment,
    A: Agent<Observation = E::Observation, Action = E::Action>,
{
    config.validate()?;
    let start = Instant::now();
    let mut env = TrackedEnvironment::new(env);
    let mut solved = false;

    let stop_reason = loop {
        if config
            .max_episodes
            .is_some_and(|limit| env.history.len() >= limit)
        {
            break StopReason::EpisodeLimit;
        }
        if config.timeout.is_some_and(|timeout| start.elapsed() >= timeout) {
            break StopReason::Timeout;
        }

        let mut observation = env.reset()?;
        let reward = loop {
            let action = agent.act(&observation)?;
            let step = env.step(action)?;
            agent.observe(&step)?;
            if step.done {
                break step.reward;
            }
            observation = step.observation.ok_or_else(|| {
                DesignError::InvalidState("running step without an observation".into())
            })?;
        };

        if let Some(episode) = env.last_finished() {
            let info = episode.final_info.as_ref();
            tracing::info!(
                episode = env.history.len(),
                elapsed_secs = start.elapsed().as_secs_f64(),
                reward = reward.value(),
                fractional_distance = ?info.and_then(|i| i.get("fractional_distance")),
                sequence = ?info.and_then(|i| i.get("sequence")),
                "episode finished"
            );
        }

        if is_solved(reward.value()) {
            solved = true;
            if config.stop_once_solved {
                break StopReason::Solved;
            }
        }
    };

    env.close()?;
    tracing::info!(
        episodes = env.history.len(),
        solved,
        ?stop_reason,
        "run finished"
    );

    Ok(RunSummary {
        episodes: env.history,
        solved,
        stop_reason,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RandomAgent;
    use rna_design_env::oracle::{from_fn, Fold};
    use rna_design_env::{DesignEpisode, EnvironmentConfig, FoldingOracle};

    fn config() -> EnvironmentConfig {
        EnvironmentConfig {
            state_radius: 1,
            seed: Some(5),
            ..Default::default()
        }
    }

    fn oracle(answer: &'static str) -> impl FoldingOracle {
        from_fn(move |_: &str| Ok(Fold::new(answer)))
    }

    #[test]
    fn test_stops_at_episode_limit() {
        let config = config();
        let set = TargetSet::from_dot_brackets(["((...))"], config.encoding_spec()).unwrap();
        let mut env = DesignEpisode::new(&set, config, oracle(".......")).unwrap();
        let mut agent: RandomAgent = RandomAgent::seeded(1);
        let runner = RunnerConfig {
            max_episodes: Some(3),
            ..RunnerConfig::for_targets(&set)
        };

        let summary = run_design(&mut env, &mut agent, &runner).unwrap();

        assert_eq!(summary.stop_reason, StopReason::EpisodeLimit);
        assert!(!summary.solved);
        assert_eq!(summary.episodes.len(), 3);
        assert!(summary.episodes.iter().all(|e| e.steps == 7));
        assert_eq!(env.records().len(), 3);
    }

    #[test]
    fn test_single_target_stops_once_solved() {
        let config = config();
        let set = TargetSet::from_dot_brackets(["((...))"], config.encoding_spec()).unwrap();
        let mut env = DesignEpisode::new(&set, config, oracle("((...))")).unwrap();
        let mut agent: RandomAgent = RandomAgent::seeded(1);

        let runner = RunnerConfig::for_targets(&set);
        assert!(runner.stop_once_solved);
        let summary = run_design(&mut env, &mut agent, &runner).unwrap();

        assert_eq!(summary.stop_reason, StopReason::Solved);
        assert!(summary.solved);
        assert_eq!(summary.episodes.len(), 1);
        let info = summary.episodes[0].final_info.as_ref().unwrap();
        assert_eq!(info.get("fractional_distance"), Some(&serde_json::json!(0.0)));
    }

    #[test]
    fn test_zero_timeout_runs_nothing() {
        let config = config();
        let set = TargetSet::from_dot_brackets(["(...)", "....."], config.encoding_spec()).unwrap();
        let mut env = DesignEpisode::new(&set, config, oracle(".....")).unwrap();
        let mut agent: RandomAgent = RandomAgent::seeded(1);
        let runner = RunnerConfig {
            timeout: Some(Duration::ZERO),
            max_episodes: None,
            ..RunnerConfig::for_targets(&set)
        };

        let summary = run_design(&mut env, &mut agent, &runner).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Timeout);
        assert!(summary.episodes.is_empty());
    }

    #[test]
    fn test_unbounded_run_is_rejected() {
        let runner = RunnerConfig {
            timeout: None,
            max_episodes: None,
            stop_once_solved: true,
        };
        assert!(matches!(
            runner.validate(),
            Err(DesignError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_runner_config_from_json() {
        let runner: RunnerConfig =
            serde_json::from_str(r#"{"timeout": {"secs": 60, "nanos": 0}}"#).unwrap();
        assert_eq!(runner.timeout, Some(Duration::from_secs(60)));
        assert_eq!(runner.max_episodes, Some(1000));
        assert!(!runner.stop_once_solved);
    }
}
