//! Rollout collection
//!
//! The [`Agent`] owns the training environment and plays whole episodes with
//! whatever policy it is handed. It never touches policy parameters, so every
//! trajectory of a rollout comes from the same parameter snapshot.

use anyhow::{anyhow, Result};

use crate::{
    buffer::{serialize_trajectories, RolloutBatch, Trajectory},
    env::Environment,
    policy::StochasticPolicy,
};

/// Plays episodes in an environment and groups them into rollouts
#[derive(Debug)]
pub struct Agent<E> {
    env: E,
    action_space: Vec<i64>,
    n_trajectory_per_rollout: usize,
    rng_seed: u64,
    max_episode_steps: Option<usize>,
}

impl<E> Agent<E>
where
    E: Environment<Observation = Vec<f32>, Action = i64>,
{
    /// Create a new agent
    ///
    /// # Arguments
    ///
    /// * `env` - Environment with a discrete action space
    /// * `n_trajectory_per_rollout` - Episodes collected per call to
    ///   [`Agent::collect_trajectory`]
    /// * `rng_seed` - Seed used for the first reset of every rollout
    pub fn new(env: E, n_trajectory_per_rollout: usize, rng_seed: u64) -> Result<Self> {
        let n_actions = env
            .action_space()
            .discrete_n()
            .ok_or_else(|| anyhow!("agent requires a discrete action space"))?;

        Ok(Self {
            env,
            action_space: (0..n_actions as i64).collect(),
            n_trajectory_per_rollout,
            rng_seed,
            max_episode_steps: None,
        })
    }

    /// Close episodes as truncated once they reach `max_steps`
    pub fn with_max_episode_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_episode_steps = max_steps;
        self
    }

    /// Valid action indices
    pub fn action_space(&self) -> &[i64] {
        &self.action_space
    }

    /// Episodes collected per rollout
    pub fn n_trajectory_per_rollout(&self) -> usize {
        self.n_trajectory_per_rollout
    }

    /// Shared access to the environment
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Mutable access to the environment
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Run `n_trajectory_per_rollout` episodes under `policy`
    ///
    /// The environment is reset with the configured seed at the start of the
    /// call only; the episodes that follow start from unseeded resets.
    pub fn collect_trajectory<P>(&mut self, policy: &P) -> Result<RolloutBatch>
    where
        P: StochasticPolicy + ?Sized,
    {
        let mut obs = self.env.reset(Some(self.rng_seed))?;
        let mut rollout_buffer = Vec::with_capacity(self.n_trajectory_per_rollout);

        for episode in 0..self.n_trajectory_per_rollout {
            let mut trajectory = Trajectory::new();
            loop {
                let sample = policy.sample_action(&obs)?;
                if !self.action_space.contains(&sample.action) {
                    return Err(anyhow!("policy produced invalid action {}", sample.action));
                }

                let result = self.env.step(sample.action)?;
                trajectory.push(sample.log_prob, result.reward);
                obs = result.observation;

                let hit_step_limit =
                    self.max_episode_steps.is_some_and(|limit| trajectory.len() >= limit);
                if result.terminated || result.truncated || hit_step_limit {
                    tracing::debug!(
                        "Episode {} finished: {} steps, return {:.2}",
                        episode,
                        trajectory.len(),
                        trajectory.total_reward()
                    );
                    obs = self.env.reset(None)?;
                    rollout_buffer.push(trajectory);
                    break;
                }
            }
        }

        serialize_trajectories(rollout_buffer)
    }
}

#[cfg(test)]
mod tests {
    use tch::Tensor;

    use super::*;
    use crate::{
        env::{SpaceInfo, SpaceType, StepInfo, StepResult},
        policy::ActionSample,
    };

    /// Counts steps, ends episodes after `len` steps, reward equals step index
    struct Counter {
        len: usize,
        step: usize,
        resets: Vec<Option<u64>>,
    }

    impl Environment for Counter {
        type Observation = Vec<f32>;
        type Action = i64;

        fn reset(&mut self, seed: Option<u64>) -> Result<Vec<f32>> {
            self.resets.push(seed);
            self.step = 0;
            Ok(vec![0.0])
        }

        fn step(&mut self, _action: i64) -> Result<StepResult<Vec<f32>>> {
            self.step += 1;
            Ok(StepResult {
                observation: vec![self.step as f32],
                reward: self.step as f32,
                terminated: self.step >= self.len,
                truncated: false,
                info: StepInfo { episode_step: self.step },
            })
        }

        fn observation_space(&self) -> SpaceInfo {
            SpaceInfo { shape: vec![1], dtype: SpaceType::Continuous }
        }

        fn action_space(&self) -> SpaceInfo {
            SpaceInfo { shape: vec![], dtype: SpaceType::Discrete(3) }
        }
    }

    struct Fixed(i64);

    impl StochasticPolicy for Fixed {
        fn sample_action(&self, _observation: &[f32]) -> Result<ActionSample> {
            Ok(ActionSample { action: self.0, log_prob: Tensor::from_slice(&[-1.0_f32]).squeeze() })
        }
    }

    fn counter(len: usize) -> Counter {
        Counter { len, step: 0, resets: Vec::new() }
    }

    #[test]
    fn test_action_space_from_env() {
        let agent = Agent::new(counter(2), 1, 0).unwrap();
        assert_eq!(agent.action_space(), &[0, 1, 2]);
    }

    #[test]
    fn test_collect_returns_k_trajectories() {
        let mut agent = Agent::new(counter(4), 3, 0).unwrap();
        let batch = agent.collect_trajectory(&Fixed(1)).unwrap();

        assert_eq!(batch.rewards.len(), 3);
        assert_eq!(batch.log_probs.len(), 3);
        for rewards in &batch.rewards {
            assert_eq!(rewards, &vec![1.0, 2.0, 3.0, 4.0]);
        }
        for log_probs in &batch.log_probs {
            assert_eq!(log_probs.size(), vec![4]);
        }
    }

    #[test]
    fn test_only_first_reset_is_seeded() {
        let mut agent = Agent::new(counter(2), 3, 17).unwrap();
        agent.collect_trajectory(&Fixed(0)).unwrap();
        agent.collect_trajectory(&Fixed(0)).unwrap();

        // Seeded reset, then one unseeded reset after each episode, per call
        let expected = vec![Some(17), None, None, None, Some(17), None, None, None];
        assert_eq!(agent.env().resets, expected);
    }

    #[test]
    fn test_max_episode_steps_truncates() {
        let mut agent = Agent::new(counter(100), 2, 0).unwrap().with_max_episode_steps(Some(5));
        let batch = agent.collect_trajectory(&Fixed(0)).unwrap();
        assert_eq!(batch.episode_lengths(), vec![5, 5]);
    }

    #[test]
    fn test_invalid_action_is_an_error() {
        let mut agent = Agent::new(counter(3), 1, 0).unwrap();
        assert!(agent.collect_trajectory(&Fixed(7)).is_err());
    }

    #[test]
    fn test_zero_trajectories() {
        let mut agent = Agent::new(counter(3), 0, 0).unwrap();
        let batch = agent.collect_trajectory(&Fixed(0)).unwrap();
        assert!(batch.is_empty());
    }
}
