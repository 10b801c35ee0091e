//! Two-layer perceptron policy for discrete actions
//!
//! ```text
//! Input (observations)
//!         |
//!  [Dense(hidden_dim)]
//!         |
//!       ReLU
//!         |
//!  [Dense(n_actions)]
//!         |
//!      Softmax
//!         |
//!  Categorical(probs)
//! ```
//!
//! Log-probabilities are computed with `log_softmax` on the logits, which is
//! the same distribution as taking the log of the softmax output but stays
//! finite for very unlikely actions.

use std::path::Path;

use anyhow::{anyhow, Result};
use tch::{
    nn::{self, Module, OptimizerConfig},
    Device, Kind, Tensor,
};

use super::{ActionSample, StochasticPolicy};

/// Categorical policy network for REINFORCE
///
/// Holds its own `VarStore`; the trainer builds the Adam optimizer over it
/// through [`PgPolicy::optimizer`].
pub struct PgPolicy {
    vs: nn::VarStore,
    net: nn::Sequential,
    device: Device,
    obs_dim: i64,
    action_dim: i64,
}

impl std::fmt::Debug for PgPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPolicy")
            .field("device", &self.device)
            .field("obs_dim", &self.obs_dim)
            .field("action_dim", &self.action_dim)
            .finish()
    }
}

impl PgPolicy {
    /// Create a new policy
    ///
    /// # Arguments
    ///
    /// * `obs_dim` - Observation space dimensionality
    /// * `action_dim` - Number of discrete actions
    /// * `hidden_dim` - Width of the hidden layer
    /// * `device` - Where the parameters live
    pub fn new(obs_dim: i64, action_dim: i64, hidden_dim: i64, device: Device) -> Self {
        tracing::info!("PgPolicy using device: {:?}", device);
        let vs = nn::VarStore::new(device);
        let root = vs.root();

        let net = nn::seq()
            .add(nn::linear(&root / "fc1", obs_dim, hidden_dim, Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(&root / "fc2", hidden_dim, action_dim, Default::default()));

        Self { vs, net, device, obs_dim, action_dim }
    }

    /// Forward pass: action logits for one or more observations
    pub fn forward(&self, obs: &Tensor) -> Tensor {
        self.net.forward(obs)
    }

    /// Action probabilities (softmax over the last dimension)
    pub fn action_probs(&self, obs: &Tensor) -> Tensor {
        self.forward(obs).softmax(-1, Kind::Float)
    }

    /// Sample actions and their log-probabilities for a batch of observations
    ///
    /// `obs` is `[batch, obs_dim]` or `[obs_dim]`; the outputs drop the last
    /// dimension accordingly.
    pub fn get_action(&self, obs: &Tensor) -> (Tensor, Tensor) {
        let logits = self.forward(obs);
        let log_probs_all = logits.log_softmax(-1, Kind::Float);
        let probs = logits.softmax(-1, Kind::Float);

        let actions = probs.multinomial(1, true);
        let log_probs = log_probs_all.gather(-1, &actions, false).squeeze_dim(-1);
        (actions.squeeze_dim(-1), log_probs)
    }

    /// Most likely action for a single observation
    pub fn greedy_action(&self, observation: &[f32]) -> Result<i64> {
        let obs = self.observation_tensor(observation)?;
        let action = tch::no_grad(|| self.forward(&obs).argmax(-1, false));
        Ok(action.int64_value(&[]))
    }

    fn observation_tensor(&self, observation: &[f32]) -> Result<Tensor> {
        if observation.len() as i64 != self.obs_dim {
            return Err(anyhow!(
                "observation has {} values, policy expects {}",
                observation.len(),
                self.obs_dim
            ));
        }
        Ok(Tensor::from_slice(observation).to_device(self.device))
    }

    /// Get the device this policy is on
    pub fn device(&self) -> Device {
        self.device
    }

    /// Number of discrete actions
    pub fn action_dim(&self) -> i64 {
        self.action_dim
    }

    /// Observation dimensionality
    pub fn obs_dim(&self) -> i64 {
        self.obs_dim
    }

    /// Get reference to variable store
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    /// Create an Adam optimizer over this policy's parameters
    pub fn optimizer(&self, learning_rate: f64) -> Result<nn::Optimizer> {
        Ok(nn::Adam::default().build(&self.vs, learning_rate)?)
    }

    /// Save model parameters to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.vs.save(path)?;
        Ok(())
    }

    /// Load model parameters from a file
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.vs.load(path)?;
        Ok(())
    }
}

impl StochasticPolicy for PgPolicy {
    fn sample_action(&self, observation: &[f32]) -> Result<ActionSample> {
        let obs = self.observation_tensor(observation)?;
        let (action, log_prob) = self.get_action(&obs);
        Ok(ActionSample { action: action.int64_value(&[]), log_prob })
    }
}
