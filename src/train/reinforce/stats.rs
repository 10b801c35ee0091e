//! Per-rollout training statistics

use crate::buffer::RolloutBatch;

/// Diagnostics for one rollout/update cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RolloutStats {
    /// Index of the rollout, starting at 0
    pub rollout_idx: usize,

    /// REINFORCE loss the update was computed from
    pub loss: f64,

    /// Average undiscounted return per trajectory
    pub average_reward: f64,

    /// Mean episode length
    pub mean_episode_len: f64,

    /// Shortest episode in the rollout
    pub min_episode_len: usize,

    /// Longest episode in the rollout
    pub max_episode_len: usize,

    /// Environment steps taken during the rollout
    pub total_steps: usize,
}

impl RolloutStats {
    /// Collect statistics from a batch and its loss
    pub fn from_batch(
        rollout_idx: usize,
        batch: &RolloutBatch,
        loss: f64,
        average_reward: f64,
    ) -> Self {
        let lengths = batch.episode_lengths();
        let total_steps: usize = lengths.iter().sum();
        let mean_episode_len = if lengths.is_empty() {
            0.0
        } else {
            total_steps as f64 / lengths.len() as f64
        };

        Self {
            rollout_idx,
            loss,
            average_reward,
            mean_episode_len,
            min_episode_len: lengths.iter().copied().min().unwrap_or(0),
            max_episode_len: lengths.iter().copied().max().unwrap_or(0),
            total_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use tch::{kind::FLOAT_CPU, Tensor};

    use super::*;

    #[test]
    fn test_from_batch() {
        let batch = RolloutBatch {
            log_probs: vec![Tensor::zeros([2], FLOAT_CPU), Tensor::zeros([4], FLOAT_CPU)],
            rewards: vec![vec![1.0; 2], vec![1.0; 4]],
        };

        let stats = RolloutStats::from_batch(3, &batch, 0.25, 3.0);
        assert_eq!(stats.rollout_idx, 3);
        assert_eq!(stats.loss, 0.25);
        assert_eq!(stats.average_reward, 3.0);
        assert_eq!(stats.mean_episode_len, 3.0);
        assert_eq!(stats.min_episode_len, 2);
        assert_eq!(stats.max_episode_len, 4);
        assert_eq!(stats.total_steps, 6);
    }

    #[test]
    fn test_empty_batch() {
        let stats = RolloutStats::from_batch(0, &RolloutBatch::default(), 0.0, 0.0);
        assert_eq!(stats.mean_episode_len, 0.0);
        assert_eq!(stats.total_steps, 0);
    }
}
