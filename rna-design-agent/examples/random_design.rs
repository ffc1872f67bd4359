//! Example: random agents designing a few hairpins with the bundled folder

use std::time::Duration;

use rna_design_agent::{run_workers, EpisodeStatistics, RandomAgent, RunnerConfig, WorkerConfig};
use rna_design_env::{EnvironmentConfig, NussinovOracle, TargetSet};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let env_config = EnvironmentConfig {
        state_radius: 4,
        seed: Some(2024),
        ..Default::default()
    };
    let targets = TargetSet::from_dot_brackets(
        ["((((....))))", "..((((...))))..", "(((...)))..(((...)))"],
        env_config.encoding_spec(),
    )?;

    let config = WorkerConfig {
        worker_count: 4,
        runner: RunnerConfig {
            timeout: Some(Duration::from_secs(10)),
            max_episodes: Some(50),
            ..RunnerConfig::for_targets(&targets)
        },
    };

    let records = run_workers(
        targets,
        env_config,
        NussinovOracle::default(),
        |worker| -> RandomAgent { RandomAgent::seeded(worker as u64) },
        &config,
    )
    .await?;

    let stats = EpisodeStatistics::merge_workers(records);
    for target in &stats.targets {
        println!(
            "Target {}: {} episodes, best {:.3}, last {:.3}, mean {:.3}",
            target.target_id,
            target.num_episodes,
            target.min_distance,
            target.last_distance,
            target.mean_distance
        );
    }
    println!(
        "\nSolved {} of {} targets, sum of best distances {:.3}",
        stats.num_solved,
        stats.targets.len(),
        stats.sum_of_min_distances
    );

    Ok(())
}
