//! Trajectory storage for REINFORCE rollouts
//!
//! Episodes are recorded step by step into a [`Trajectory`]. Once a rollout
//! is complete the list of trajectories is regrouped by field into a
//! [`RolloutBatch`] with [`serialize_trajectories`], so the loss can work on
//! one log-probability tensor and one reward vector per episode.

use anyhow::{anyhow, Result};
use tch::Tensor;

/// Step-by-step record of one episode
///
/// Each step contributes the log-probability of the action taken (still
/// attached to the policy's autograd graph) and the reward that followed.
#[derive(Debug, Default)]
pub struct Trajectory {
    log_probs: Vec<Tensor>,
    rewards: Vec<f32>,
}

impl Trajectory {
    /// Create an empty trajectory
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one time step
    pub fn push(&mut self, log_prob: Tensor, reward: f32) {
        self.log_probs.push(log_prob);
        self.rewards.push(reward);
    }

    /// Number of recorded steps
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Whether no step has been recorded
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Per-step rewards
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Per-step log-probabilities
    pub fn log_probs(&self) -> &[Tensor] {
        &self.log_probs
    }

    /// Undiscounted episode return
    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().map(|&r| r as f64).sum()
    }
}

/// A rollout grouped by field
///
/// `log_probs[i]` is a 1-D tensor with one entry per step of trajectory `i`,
/// and `rewards[i]` holds that trajectory's rewards in the same order.
#[derive(Debug, Default)]
pub struct RolloutBatch {
    /// Stacked log-probabilities, one tensor per trajectory
    pub log_probs: Vec<Tensor>,

    /// Raw rewards, one vector per trajectory
    pub rewards: Vec<Vec<f32>>,
}

impl RolloutBatch {
    /// Number of trajectories in the batch
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Whether the batch holds no trajectory
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Total number of environment steps across all trajectories
    pub fn total_steps(&self) -> usize {
        self.rewards.iter().map(Vec::len).sum()
    }

    /// Undiscounted return of each trajectory
    pub fn trajectory_returns(&self) -> Vec<f64> {
        self.rewards.iter().map(|r| r.iter().map(|&x| x as f64).sum()).collect()
    }

    /// Length of each trajectory
    pub fn episode_lengths(&self) -> Vec<usize> {
        self.rewards.iter().map(Vec::len).collect()
    }
}

/// Convert a list of trajectories into a field-grouped batch
///
/// Each trajectory's per-step log-probabilities are stacked into a single
/// 1-D tensor. Empty trajectories cannot be stacked and are rejected.
pub fn serialize_trajectories(trajectories: Vec<Trajectory>) -> Result<RolloutBatch> {
    let mut batch = RolloutBatch {
        log_probs: Vec::with_capacity(trajectories.len()),
        rewards: Vec::with_capacity(trajectories.len()),
    };

    for (idx, trajectory) in trajectories.into_iter().enumerate() {
        if trajectory.is_empty() {
            return Err(anyhow!("trajectory {} has no steps", idx));
        }
        batch.log_probs.push(Tensor::stack(&trajectory.log_probs, 0));
        batch.rewards.push(trajectory.rewards);
    }

    Ok(batch)
}
