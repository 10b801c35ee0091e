//! REINFORCE loss
//!
//! For every trajectory the rewards are standardized,
//! `R' = (R - mean(R)) / (std(R) + 1e-8)`, and weighted against the
//! log-probabilities of the actions taken: `loss_t = -Σ log π(a|s) · R'`.
//! The batch loss is the mean of `loss_t` over trajectories.

use anyhow::{anyhow, Result};
use tch::{Device, Kind, Tensor};

use crate::buffer::RolloutBatch;

/// Guard added to the standard deviation
pub const NORMALIZATION_EPS: f64 = 1e-8;

/// Standardize a 1-D reward tensor
///
/// Uses the unbiased standard deviation, so a tensor with fewer than two
/// rewards has no defined spread. Such a tensor normalizes to zeros instead
/// of the NaN torch's `std()` would give, and a one-step trajectory then
/// adds nothing to the loss rather than turning the whole batch loss NaN.
pub fn normalize_rewards(rewards: &Tensor) -> Tensor {
    if rewards.numel() < 2 {
        return rewards.zeros_like();
    }
    let centered = rewards - rewards.mean(Kind::Float);
    centered / (rewards.std(true) + NORMALIZATION_EPS)
}

/// Loss contribution of one trajectory
///
/// # Arguments
/// * `log_probs` - Log-probabilities of the actions taken `[T]`
/// * `rewards` - Raw rewards `[T]`
pub fn trajectory_loss(log_probs: &Tensor, rewards: &Tensor) -> Tensor {
    let normalized = normalize_rewards(rewards);
    -(log_probs * normalized).sum(Kind::Float)
}

/// Mean REINFORCE loss over a rollout batch
pub fn estimate_loss(batch: &RolloutBatch, device: Device) -> Result<Tensor> {
    if batch.is_empty() {
        return Err(anyhow!("cannot compute a loss from an empty rollout"));
    }

    let mut losses = Vec::with_capacity(batch.len());
    for (log_probs, rewards) in batch.log_probs.iter().zip(&batch.rewards) {
        if log_probs.size() != [rewards.len() as i64] {
            return Err(anyhow!(
                "log-prob shape {:?} does not match {} rewards",
                log_probs.size(),
                rewards.len()
            ));
        }
        let rewards = Tensor::from_slice(rewards).to_device(device);
        losses.push(trajectory_loss(log_probs, &rewards));
    }

    Ok(Tensor::stack(&losses, 0).mean(Kind::Float))
}

/// Average undiscounted return per trajectory
///
/// The sum of all rewards in the batch divided by `n_trajectory`, the
/// number of episodes the rollout was configured to hold.
pub fn average_trajectory_reward(batch: &RolloutBatch, n_trajectory: usize) -> f64 {
    if n_trajectory == 0 {
        return 0.0;
    }
    batch.trajectory_returns().iter().sum::<f64>() / n_trajectory as f64
}
