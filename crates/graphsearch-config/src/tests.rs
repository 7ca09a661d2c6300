//! Tests for search configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        random_seed = 42
        timeout_ms = 30000
        node_evaluation_timeout_ms = 250
        timeout_policy = "fail"
        max_expansions = 10000
        thread_count = { count = 4 }

        [algorithm]
        type = "depth_first"
        randomized = true
        depth_limit = 12
    "#;

    let config = SearchConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    assert_eq!(
        config.node_evaluation_timeout(),
        Some(Duration::from_millis(250))
    );
    assert_eq!(config.timeout_policy, TimeoutPolicyConfig::Fail);
    assert_eq!(config.max_expansions, Some(10000));
    assert_eq!(config.thread_count, ThreadCount::Count(4));
    match &config.algorithm {
        AlgorithmConfig::DepthFirst(dfs) => {
            assert!(dfs.randomized);
            assert_eq!(dfs.depth_limit, Some(12));
        }
        other => panic!("expected depth-first config, got {:?}", other),
    }
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        random_seed: 42
        timeout_policy: propagate
        algorithm:
          type: mcts
          policy: epsilon_greedy
          epsilon: 0.25
          objective: maximize
          rollout_depth_limit: 40
    "#;

    let config = SearchConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.timeout_policy, TimeoutPolicyConfig::Propagate);
    match &config.algorithm {
        AlgorithmConfig::Mcts(mcts) => {
            assert_eq!(mcts.policy, PolicyConfig::EpsilonGreedy);
            assert_eq!(mcts.epsilon, 0.25);
            assert_eq!(mcts.objective, Objective::Maximize);
            assert_eq!(mcts.rollout_depth_limit, Some(40));
            assert_eq!(mcts.exploration_constant, std::f64::consts::SQRT_2);
        }
        other => panic!("expected mcts config, got {:?}", other),
    }
}

#[test]
fn test_defaults() {
    let config = SearchConfig::from_toml_str("").unwrap();

    assert_eq!(config.seed(), 0);
    assert_eq!(config.timeout(), None);
    assert_eq!(config.timeout_policy, TimeoutPolicyConfig::Prune);
    assert_eq!(config.thread_count, ThreadCount::Auto);
    match &config.algorithm {
        AlgorithmConfig::BestFirst(bfs) => assert_eq!(bfs.tie_break, TieBreak::Fifo),
        other => panic!("expected best-first config, got {:?}", other),
    }
    assert!(config.validate().is_ok());
}

#[test]
fn test_unit_algorithm_variant() {
    let config = SearchConfig::from_toml_str(
        r#"
        [algorithm]
        type = "awa_star"
    "#,
    )
    .unwrap();

    assert!(matches!(config.algorithm, AlgorithmConfig::AwaStar));
    assert_eq!(config.algorithm.name(), "awa_star");
}

#[test]
fn test_unknown_algorithm_is_rejected() {
    let result = SearchConfig::from_toml_str(
        r#"
        [algorithm]
        type = "beam"
    "#,
    );

    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn test_builder() {
    let config = SearchConfig::new()
        .with_random_seed(123)
        .with_timeout(Duration::from_secs(60))
        .with_node_evaluation_timeout(Duration::from_millis(20))
        .with_max_expansions(500)
        .with_thread_count(ThreadCount::Count(2))
        .with_algorithm(AlgorithmConfig::Mcts(MctsConfig::default()));

    assert_eq!(config.seed(), 123);
    assert_eq!(config.timeout_ms, Some(60_000));
    assert_eq!(config.node_evaluation_timeout_ms, Some(20));
    assert_eq!(config.max_expansions, Some(500));
    assert_eq!(config.algorithm.name(), "mcts");
}

#[test]
fn test_validate_rejects_bad_values() {
    let zero_timeout = SearchConfig::new().with_timeout(Duration::ZERO);
    assert!(matches!(zero_timeout.validate(), Err(ConfigError::Invalid(_))));

    let zero_threads = SearchConfig::new().with_thread_count(ThreadCount::Count(0));
    assert!(zero_threads.validate().is_err());

    let bad_epsilon = SearchConfig::new().with_algorithm(AlgorithmConfig::Mcts(MctsConfig {
        epsilon: 1.5,
        ..MctsConfig::default()
    }));
    assert!(bad_epsilon.validate().is_err());

    let bad_exploration = SearchConfig::new().with_algorithm(AlgorithmConfig::Mcts(MctsConfig {
        exploration_constant: f64::NAN,
        ..MctsConfig::default()
    }));
    assert!(bad_exploration.validate().is_err());

    let zero_depth = SearchConfig::new().with_algorithm(AlgorithmConfig::DepthFirst(
        DepthFirstConfig {
            randomized: false,
            depth_limit: Some(0),
        },
    ));
    assert!(zero_depth.validate().is_err());
}

#[test]
fn test_load_missing_file() {
    let result = SearchConfig::load("does/not/exist.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_load_yaml_by_extension() {
    let path = std::env::temp_dir().join(format!(
        "graphsearch-config-{}.yaml",
        std::process::id()
    ));
    std::fs::write(&path, "random_seed: 9\nalgorithm:\n  type: awa_star\n").unwrap();

    let config = SearchConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.seed(), 9);
    assert!(matches!(config.algorithm, AlgorithmConfig::AwaStar));
}

#[test]
fn test_thread_count_resolve() {
    assert_eq!(ThreadCount::Count(8).resolve(3), 3);
    assert_eq!(ThreadCount::Count(2).resolve(10), 2);
    assert_eq!(ThreadCount::Count(4).resolve(0), 1);
    assert!(ThreadCount::Auto.resolve(usize::MAX) >= 1);
}
