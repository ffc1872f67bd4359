//! Targets on disk through workers, records on disk and statistics

use std::fs;
use std::time::Duration;

use rna_design_agent::{run_workers, EpisodeStatistics, RandomAgent, RunnerConfig, WorkerConfig};
use rna_design_env::{
    read_jsonl, write_jsonl, EnvironmentConfig, NussinovOracle, TargetSet,
};

fn agent(worker: usize) -> RandomAgent {
    RandomAgent::seeded(worker as u64 + 11)
}

#[test]
fn test_design_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("1.rna"), "((((....))))\n").unwrap();
    fs::write(dir.path().join("2.rna"), "...((((...))))\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a target").unwrap();

    let env_config = EnvironmentConfig {
        mutation_threshold: Some(3),
        seed: Some(31),
        ..Default::default()
    };
    let targets = TargetSet::load_dir(dir.path(), None, env_config.encoding_spec()).unwrap();
    assert_eq!(targets.len(), 2);

    let config = WorkerConfig {
        worker_count: 2,
        runner: RunnerConfig {
            timeout: Some(Duration::from_secs(120)),
            stop_once_solved: false,
            max_episodes: Some(4),
        },
    };

    let records = tokio_test::block_on(run_workers(
        targets,
        env_config,
        NussinovOracle::default(),
        agent,
        &config,
    ))
    .unwrap();
    assert_eq!(records.iter().map(Vec::len).collect::<Vec<_>>(), vec![4, 4]);

    let path = dir.path().join("worker0.jsonl");
    write_jsonl(&path, &records[0]).unwrap();
    assert_eq!(read_jsonl(&path).unwrap(), records[0]);

    let stats = EpisodeStatistics::merge_workers(records);
    assert_eq!(stats.targets.len(), 2);
    assert_eq!(
        stats.targets.iter().map(|t| t.num_episodes).sum::<usize>(),
        8
    );
    for target in &stats.targets {
        assert!(target.min_distance <= target.mean_distance);
        assert!((0.0..=1.0).contains(&target.last_distance));
    }
}
