//! REINFORCE trainer
//!
//! Owns the policy, its Adam optimizer and the agent, and runs the
//! collect → loss → update cycle.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tch::{nn, Device, Tensor};

use super::{
    config::TrainerConfig,
    loss::{average_trajectory_reward, estimate_loss},
    stats::RolloutStats,
};
use crate::{
    agent::Agent,
    buffer::RolloutBatch,
    env::{self, save_video, DiscreteEnv, Environment, RenderMode},
    policy::{PgPolicy, StochasticPolicy},
    utils::RewardHistory,
};

/// Policy-gradient trainer
///
/// Every rollout is collected with the policy borrowed immutably, and the
/// optimizer only steps once the whole batch is in, so each update is
/// computed from on-policy data.
pub struct PgTrainer<E = DiscreteEnv> {
    config: TrainerConfig,
    agent: Agent<E>,
    policy: PgPolicy,
    optimizer: nn::Optimizer,
    device: Device,
    reward_history: RewardHistory,
}

impl PgTrainer<DiscreteEnv> {
    /// Create a trainer for the environment named in the config
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let env = env::make(&config.env_name, None)?;
        Self::with_env(config, env)
    }
}

impl<E> PgTrainer<E>
where
    E: Environment<Observation = Vec<f32>, Action = i64>,
{
    /// Create a trainer around an existing environment
    ///
    /// `config.env_name` is still used for the recorded video and its folder.
    pub fn with_env(config: TrainerConfig, env: E) -> Result<Self> {
        config.validate()?;

        if let Some(seed) = config.torch_seed {
            tch::manual_seed(seed);
        }

        let obs_dim = env.observation_space().flat_dim() as i64;
        let action_dim = env
            .action_space()
            .discrete_n()
            .ok_or_else(|| anyhow!("{} does not have a discrete action space", config.env_name))?
            as i64;

        let device = config.device.to_device();
        let policy = PgPolicy::new(obs_dim, action_dim, config.hidden_dim, device);
        let optimizer = policy.optimizer(config.lr)?;
        let agent = Agent::new(env, config.n_trajectory_per_rollout, config.rng_seed)?
            .with_max_episode_steps(config.max_episode_steps);

        tracing::info!(
            "Trainer ready: env={} obs_dim={} actions={} hidden_dim={} lr={}",
            config.env_name,
            obs_dim,
            action_dim,
            config.hidden_dim,
            config.lr
        );

        Ok(Self { config, agent, policy, optimizer, device, reward_history: RewardHistory::new() })
    }

    /// Get the configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Get reference to the policy
    pub fn policy(&self) -> &PgPolicy {
        &self.policy
    }

    /// Get reference to the agent
    pub fn agent(&self) -> &Agent<E> {
        &self.agent
    }

    /// Average trajectory reward of every rollout trained so far
    pub fn reward_history(&self) -> &RewardHistory {
        &self.reward_history
    }

    /// Run `n_rollout` cycles, then save the reward history and the video
    ///
    /// Returns the reward history. The training environment is closed once
    /// the last rollout is collected; the video uses a fresh environment.
    pub fn run_training_loop(&mut self) -> Result<RewardHistory> {
        for ro_idx in 0..self.config.n_rollout {
            let stats = self.train_rollout(ro_idx)?;
            tracing::debug!(
                "Rollout {} | mean episode length {:.1} | steps {}",
                stats.rollout_idx,
                stats.mean_episode_len,
                stats.total_steps
            );
        }

        self.agent.env_mut().close();
        self.save_reward_history()?;

        if self.config.record_video {
            self.generate_video(self.config.max_video_frames)?;
        }

        Ok(self.reward_history.clone())
    }

    /// Collect one rollout, update the policy once and record the reward
    pub fn train_rollout(&mut self, ro_idx: usize) -> Result<RolloutStats> {
        let batch = self.agent.collect_trajectory(&self.policy)?;
        let loss = self.estimate_loss_function(&batch)?;
        let loss_value = loss.double_value(&[]);
        tracing::debug!("Rollout {} loss: {:.6}", ro_idx, loss_value);
        self.update_policy(&loss);

        let avg_ro_reward =
            average_trajectory_reward(&batch, self.config.n_trajectory_per_rollout);
        tracing::info!(
            "End of rollout {}: Average trajectory reward is {:.2}",
            ro_idx,
            avg_ro_reward
        );
        self.reward_history.push(avg_ro_reward);

        Ok(RolloutStats::from_batch(ro_idx, &batch, loss_value, avg_ro_reward))
    }

    /// REINFORCE loss of a batch, on the policy's device
    pub fn estimate_loss_function(&self, batch: &RolloutBatch) -> Result<Tensor> {
        estimate_loss(batch, self.device)
    }

    /// One Adam step on the policy parameters, then clear the gradients
    pub fn update_policy(&mut self, loss: &Tensor) {
        loss.backward();
        self.optimizer.step();
        self.optimizer.zero_grad();
    }

    /// Write the reward history to `<output_dir>/<exp_name>.<ext>`
    pub fn save_reward_history(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!("failed to create output directory {}", self.config.output_dir.display())
        })?;
        let path = self.config.reward_log_path();
        self.reward_history.save(&path, self.config.reward_log_format)?;
        tracing::info!("Saved {} rollout rewards to {}", self.reward_history.len(), path.display());
        Ok(path)
    }

    /// Record one episode of the current policy in a fresh environment
    ///
    /// The environment is built from `config.env_name` with frame recording
    /// enabled; the episode stops after `max_frame` steps or when it ends.
    pub fn generate_video(&self, max_frame: usize) -> Result<PathBuf> {
        let mut env = env::make(&self.config.env_name, Some(RenderMode::RgbArrayList))?;
        let path = self.record_episode(&mut env, max_frame);
        env.close();
        path
    }

    /// Play one episode in `env` and save its frames as a video
    pub fn record_episode<V>(&self, env: &mut V, max_frame: usize) -> Result<PathBuf>
    where
        V: Environment<Observation = Vec<f32>, Action = i64> + ?Sized,
    {
        let mut obs = env.reset(None)?;
        let mut episode_return = 0.0;
        let mut steps = 0;

        for _ in 0..max_frame {
            let action = if self.config.video_greedy {
                self.policy.greedy_action(&obs)?
            } else {
                tch::no_grad(|| self.policy.sample_action(&obs))?.action
            };

            let result = env.step(action)?;
            episode_return += result.reward as f64;
            steps += 1;
            obs = result.observation;
            if result.terminated || result.truncated {
                break;
            }
        }

        tracing::info!("Evaluation episode: {} steps, return {:.2}", steps, episode_return);

        let frames = env.render()?;
        save_video(&frames, self.config.video_folder(), env.metadata().render_fps, 0, 0)
    }

    /// Save the policy parameters
    pub fn save_policy<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        self.policy.save(path)
    }
}
