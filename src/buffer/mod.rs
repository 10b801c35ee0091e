//! Experience storage
//!
//! REINFORCE is on-policy and trains on whole episodes, so the only buffer
//! needed is a per-rollout list of trajectories.

pub mod trajectory;

pub use trajectory::{serialize_trajectories, RolloutBatch, Trajectory};
