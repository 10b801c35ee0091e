//! End-to-end REINFORCE training against deterministic environments

mod common;

use common::FixedEpisodeEnv;
use reinforce_rl::{
    agent::Agent,
    env::simple_bandit::SimpleBandit,
    policy::PgPolicy,
    train::{DeviceConfig, PgTrainer, RewardLogFormat, TrainerConfig},
    utils::RewardHistory,
};
use tch::{Device, Kind};
use tempfile::tempdir;

fn config(dir: &std::path::Path) -> TrainerConfig {
    TrainerConfig::new()
        .env_name("FixedEpisode-v0")
        .hidden_dim(8)
        .lr(1e-2)
        .n_rollout(1)
        .n_trajectory_per_rollout(3)
        .rng_seed(42)
        .exp_name("fixed")
        .device(DeviceConfig::Cpu)
        .torch_seed(Some(1))
        .output_dir(dir)
        .record_video(false)
}

#[test]
fn test_constant_reward_rollout_averages_episode_length() {
    let dir = tempdir().unwrap();
    let mut trainer = PgTrainer::with_env(config(dir.path()), FixedEpisodeEnv::new()).unwrap();

    let history = trainer.run_training_loop().unwrap();
    assert_eq!(history.as_slice(), &[5.0]);

    // Constant rewards normalize to zero, so the update must not blow up
    for param in trainer.policy().var_store().trainable_variables() {
        let total = param.sum(Kind::Double).double_value(&[]);
        assert!(total.is_finite(), "policy parameters should stay finite");
    }

    let env = trainer.agent().env();
    assert_eq!(env.total_steps, 15);
    assert_eq!(env.seeded_resets, 1);
    // Initial seeded reset plus one reset after each of the 3 episodes
    assert_eq!(env.resets, 4);

    let saved = RewardHistory::load(dir.path().join("fixed.json")).unwrap();
    assert_eq!(saved.as_slice(), &[5.0]);
}

#[test]
fn test_constant_reward_loss_is_zero() {
    let dir = tempdir().unwrap();
    let mut trainer = PgTrainer::with_env(config(dir.path()), FixedEpisodeEnv::new()).unwrap();

    let stats = trainer.train_rollout(0).unwrap();
    assert!(stats.loss.abs() < 1e-6, "loss should be ~0, got {}", stats.loss);
    assert_eq!(stats.average_reward, 5.0);
    assert_eq!(stats.min_episode_len, 5);
    assert_eq!(stats.max_episode_len, 5);
}

#[test]
fn test_zero_rollouts_writes_empty_list() {
    let dir = tempdir().unwrap();
    let mut trainer =
        PgTrainer::with_env(config(dir.path()).n_rollout(0), FixedEpisodeEnv::new()).unwrap();

    let history = trainer.run_training_loop().unwrap();
    assert!(history.is_empty());

    let contents = std::fs::read_to_string(dir.path().join("fixed.json")).unwrap();
    assert_eq!(contents, "[]");
    assert_eq!(trainer.agent().env().total_steps, 0);
}

#[test]
fn test_bincode_reward_log() {
    let dir = tempdir().unwrap();
    let config = config(dir.path()).n_rollout(2).reward_log_format(RewardLogFormat::Bincode);
    let mut trainer = PgTrainer::with_env(config, FixedEpisodeEnv::new()).unwrap();

    trainer.run_training_loop().unwrap();

    let saved = RewardHistory::load(dir.path().join("fixed.bin")).unwrap();
    assert_eq!(saved.as_slice(), &[5.0, 5.0]);
}

#[test]
fn test_collect_trajectory_returns_k_entries() {
    let policy = PgPolicy::new(2, 2, 8, Device::Cpu);

    for k in [1, 4, 7] {
        let mut agent = Agent::new(FixedEpisodeEnv::new(), k, 0).unwrap();
        let batch = agent.collect_trajectory(&policy).unwrap();

        assert_eq!(batch.rewards.len(), k);
        assert_eq!(batch.log_probs.len(), k);
        for log_probs in &batch.log_probs {
            assert_eq!(log_probs.size(), vec![FixedEpisodeEnv::EPISODE_LEN as i64]);
        }
    }
}

#[test]
fn test_rollout_shares_one_policy_snapshot() {
    let dir = tempdir().unwrap();
    let config = config(dir.path()).env_name("SimpleBandit-v0").n_trajectory_per_rollout(4);
    let mut trainer =
        PgTrainer::with_env(config, SimpleBandit::with_episode_length(10)).unwrap();

    let before: Vec<f64> = trainer
        .policy()
        .var_store()
        .trainable_variables()
        .iter()
        .map(|t| t.abs().sum(Kind::Double).double_value(&[]))
        .collect();

    // Collecting alone never touches the parameters
    let policy = trainer.policy();
    let mut agent = Agent::new(SimpleBandit::with_episode_length(10), 4, 0).unwrap();
    agent.collect_trajectory(policy).unwrap();

    let after: Vec<f64> = trainer
        .policy()
        .var_store()
        .trainable_variables()
        .iter()
        .map(|t| t.abs().sum(Kind::Double).double_value(&[]))
        .collect();
    assert_eq!(before, after);

    // A full cycle does
    trainer.train_rollout(0).unwrap();
    let updated: Vec<f64> = trainer
        .policy()
        .var_store()
        .trainable_variables()
        .iter()
        .map(|t| t.abs().sum(Kind::Double).double_value(&[]))
        .collect();
    assert_ne!(before, updated);
}
