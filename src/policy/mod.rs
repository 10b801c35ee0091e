//! Policy networks
//!
//! This module provides the categorical policy used by the REINFORCE trainer,
//! built on tch-rs.

use anyhow::Result;
use tch::Tensor;

pub mod mlp;

pub use mlp::PgPolicy;

/// A sampled action together with its log-probability
///
/// `log_prob` is a scalar tensor that still carries the autograd graph back
/// to the policy parameters.
#[derive(Debug)]
pub struct ActionSample {
    /// Index of the sampled discrete action
    pub action: i64,

    /// log π(action | observation) under the current parameters
    pub log_prob: Tensor,
}

/// Anything the agent can sample actions from
pub trait StochasticPolicy {
    /// Draw an action for a single observation
    fn sample_action(&self, observation: &[f32]) -> Result<ActionSample>;
}

impl<P: StochasticPolicy + ?Sized> StochasticPolicy for &P {
    fn sample_action(&self, observation: &[f32]) -> Result<ActionSample> {
        (**self).sample_action(observation)
    }
}
