//! Training algorithms
//!
//! This module implements policy-gradient training.

pub mod reinforce;

pub use reinforce::{
    estimate_loss, normalize_rewards, trajectory_loss, DeviceConfig, PgTrainer, RewardLogFormat,
    RolloutStats, TrainerConfig,
};
