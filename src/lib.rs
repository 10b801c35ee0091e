//! # reinforce-rl
//!
//! REINFORCE policy-gradient training in Rust, with neural networks from
//! PyTorch via tch-rs.
//!
//! An [`agent::Agent`] plays whole episodes in an [`env::Environment`] with a
//! categorical [`policy::PgPolicy`]; the [`train::PgTrainer`] turns each batch
//! of episodes into a loss with per-trajectory reward normalization and takes
//! one Adam step per rollout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reinforce_rl::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = TrainerConfig::new()
//!     .env_name("CartPole-v1")
//!     .n_rollout(10)
//!     .n_trajectory_per_rollout(8)
//!     .exp_name("cartpole_demo");
//!
//! let mut trainer = PgTrainer::new(config)?;
//! let rewards = trainer.run_training_loop()?;
//! println!("final average reward: {:?}", rewards.as_slice().last());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Episode collection
pub mod agent;

/// Trajectory and rollout storage
pub mod buffer;

/// Environment traits and implementations
pub mod env;

/// Policy networks
pub mod policy;

/// Training algorithms
pub mod train;

/// Utility functions and helpers
pub mod utils;

/// Prelude module for convenient imports
///
/// This module re-exports commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::{
        agent::Agent,
        buffer::{RolloutBatch, Trajectory},
        env::{make, Environment, RenderMode, StepResult},
        policy::{PgPolicy, StochasticPolicy},
        train::{DeviceConfig, PgTrainer, RewardLogFormat, TrainerConfig},
        utils::RewardHistory,
    };
}

/// Current version of reinforce-rl
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
