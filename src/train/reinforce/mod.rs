//! REINFORCE (vanilla policy gradient)
//!
//! Each rollout collects whole episodes with the current policy, scores them
//! with per-trajectory normalized rewards, and applies a single Adam step.

pub mod config;
pub mod loss;
pub mod stats;
pub mod trainer;

pub use config::{DeviceConfig, RewardLogFormat, TrainerConfig};
pub use loss::{average_trajectory_reward, estimate_loss, normalize_rewards, trajectory_loss};
pub use stats::RolloutStats;
pub use trainer::PgTrainer;
