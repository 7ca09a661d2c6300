//! Tests for tree policies.

use super::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

#[test]
fn test_ucb1_prefers_unvisited() {
    let mut policy = Ucb1Policy::default();
    let children = [
        ChildStats::new(5, 0.9),
        ChildStats::new(0, 0.0),
        ChildStats::new(0, 0.0),
    ];

    assert_eq!(policy.select(5, &children, &mut rng()), 1);
}

#[test]
fn test_ucb1_explores_rarely_visited() {
    let mut policy = Ucb1Policy::new(2.0);
    let children = [ChildStats::new(100, 0.6), ChildStats::new(1, 0.4)];

    assert_eq!(policy.select(101, &children, &mut rng()), 1);
}

#[test]
fn test_ucb1_without_exploration_is_greedy() {
    let mut policy = Ucb1Policy::new(0.0);
    let children = [
        ChildStats::new(100, 0.6),
        ChildStats::new(1, 0.4),
        ChildStats::new(3, 0.7),
    ];

    assert_eq!(policy.select(104, &children, &mut rng()), 2);
    assert!(policy.bound(104, &children[0]) < policy.bound(104, &children[2]));
}

#[test]
fn test_random_stays_in_range() {
    let mut policy = UniformRandomPolicy::new();
    let children = [ChildStats::new(1, 0.0); 4];
    let mut rng = rng();
    let mut seen = [false; 4];

    for _ in 0..200 {
        let index = policy.select(4, &children, &mut rng);
        seen[index] = true;
    }

    assert!(seen.iter().all(|s| *s));
}

#[test]
fn test_epsilon_zero_is_greedy() {
    let mut policy = EpsilonGreedyPolicy::new(0.0);
    let children = [
        ChildStats::new(1, 0.1),
        ChildStats::new(1, 0.5),
        ChildStats::new(1, 0.3),
    ];
    let mut rng = rng();

    for _ in 0..50 {
        assert_eq!(policy.select(3, &children, &mut rng), 1);
    }
}

#[test]
fn test_epsilon_one_explores() {
    let mut policy = EpsilonGreedyPolicy::new(1.5);
    assert_eq!(policy.epsilon(), 1.0);

    let children = [ChildStats::new(1, 0.9), ChildStats::new(1, 0.1)];
    let mut rng = rng();
    let picks: Vec<usize> = (0..100).map(|_| policy.select(2, &children, &mut rng)).collect();

    assert!(picks.contains(&0));
    assert!(picks.contains(&1));
}

#[test]
fn test_ensemble_tries_every_candidate_first() {
    let mut policy = EnsemblePolicy::standard(1.0, 0.1);
    let mut rng = rng();
    let mut order = Vec::new();

    for _ in 0..3 {
        policy.begin_playout(&mut rng);
        order.push(policy.current());
        policy.end_playout(0.5);
    }

    assert_eq!(order, vec!["ucb1", "random", "epsilon_greedy"]);
    assert!(policy.arm_statistics().iter().all(|arm| arm.visits == 1));
}

#[test]
fn test_ensemble_favors_rewarding_candidate() {
    let mut policy = EnsemblePolicy::standard(0.1, 0.1);
    let mut rng = rng();

    for _ in 0..300 {
        policy.begin_playout(&mut rng);
        let reward = if policy.current() == "epsilon_greedy" { 1.0 } else { 0.0 };
        policy.end_playout(reward);
    }

    let arms = policy.arm_statistics();
    assert_eq!(arms.iter().map(|arm| arm.visits).sum::<u64>(), 300);
    let greedy = arms.iter().find(|arm| arm.name == "epsilon_greedy").unwrap();
    assert!(greedy.visits > 200, "{arms:?}");
    assert_eq!(greedy.mean_reward, 1.0);
}

#[test]
fn test_ensemble_delegates_selection() {
    let mut policy = EnsemblePolicy::new(vec![Box::new(Ucb1Policy::new(0.0))], 1.0);
    let mut rng = rng();
    let children = [ChildStats::new(2, 0.1), ChildStats::new(2, 0.8)];

    policy.begin_playout(&mut rng);
    assert_eq!(policy.name(), "ensemble");
    assert_eq!(policy.current(), "ucb1");
    assert_eq!(policy.select(4, &children, &mut rng), 1);
}

#[test]
fn test_policy_from_config() {
    let mut config = MctsConfig::default();
    assert_eq!(policy_from_config(&config).name(), "ucb1");

    config.policy = PolicyConfig::Ensemble;
    assert_eq!(policy_from_config(&config).name(), "ensemble");

    config.policy = PolicyConfig::EpsilonGreedy;
    assert_eq!(policy_from_config(&config).name(), "epsilon_greedy");

    config.policy = PolicyConfig::Random;
    assert_eq!(policy_from_config(&config).name(), "random");
}
