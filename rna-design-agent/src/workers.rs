//! Independent design workers on the tokio blocking pool

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use rna_design_core::{Agent, DesignError, DiscreteAction, Result};
use rna_design_env::{
    DesignEpisode, EnvironmentConfig, EpisodeRecord, FoldingOracle, TargetSet,
    WindowedObservation,
};

use crate::runner::{run_design, RunnerConfig};

/// How many workers to run and how each one runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of independent workers
    pub worker_count: usize,
    /// Stop policy applied by every worker
    pub runner: RunnerConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            runner: RunnerConfig::default(),
        }
    }
}

/// Run `worker_count` independent episodes loops and collect their records
///
/// Worker `i` owns its own environment, seeded with `env_config.seed + i`,
/// and the agent built by `agent_factory(i)`. Only the target set and the
/// oracle are shared. Records come back in worker order.
///
/// # Errors
/// `InvalidConfig` for zero workers or an invalid configuration, the first
/// error returned by a worker in worker order, and `Other` for a worker that
/// panicked.
pub async fn run_workers<O, A, F>(
    targets: TargetSet,
    env_config: EnvironmentConfig,
    oracle: O,
    agent_factory: F,
    config: &WorkerConfig,
) -> Result<Vec<Vec<EpisodeRecord>>>
where
    O: FoldingOracle + 'static,
    A: Agent<Observation = WindowedObservation, Action = DiscreteAction> + 'static,
    F: Fn(usize) -> A + Send + Sync + 'static,
{
    if config.worker_count == 0 {
        return Err(DesignError::InvalidConfig(
            "worker_count must be at least 1".into(),
        ));
    }
    env_config.validate()?;
    config.runner.validate()?;

    let oracle = Arc::new(oracle);
    let agent_factory = Arc::new(agent_factory);
    let mut handles = Vec::with_capacity(config.worker_count);

    for index in 0..config.worker_count {
        let targets = targets.clone();
        let oracle = Arc::clone(&oracle);
        let agent_factory = Arc::clone(&agent_factory);
        let runner = config.runner.clone();
        let env_config = EnvironmentConfig {
            seed: env_config.seed.map(|seed| seed.wrapping_add(index as u64)),
            ..env_config.clone()
        };

        handles.push(tokio::task::spawn_blocking(move || {
            let span = tracing::info_span!("worker", index);
            let _guard = span.enter();

            let mut env = DesignEpisode::new(&targets, env_config, oracle)?;
            let mut agent = agent_factory(index);
            let summary = run_design(&mut env, &mut agent, &runner)?;
            tracing::info!(
                episodes = summary.episodes.len(),
                solved = summary.solved,
                stop_reason = ?summary.stop_reason,
                "worker finished"
            );
            Ok::<_, DesignError>(env.take_records())
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let records = handle
            .await
            .map_err(|e| anyhow::anyhow!("worker {index} did not finish: {e}"))??;
        results.push(records);
    }
    Ok(results)
}
