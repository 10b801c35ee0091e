//! Deterministic environments shared by the integration tests

use anyhow::{anyhow, Result};
use reinforce_rl::env::{Environment, SpaceInfo, SpaceType, StepInfo, StepResult};

/// Observation emitted after each step, indexed by step number
const TRANSITIONS: [[f32; 2]; 6] =
    [[0.0, 0.0], [0.1, -0.1], [0.2, -0.2], [0.3, -0.3], [0.4, -0.4], [0.5, -0.5]];

/// Two actions, reward 1 per step, every episode exactly 5 steps long
#[derive(Debug, Default)]
pub struct FixedEpisodeEnv {
    step: usize,
    pub resets: usize,
    pub seeded_resets: usize,
    pub total_steps: usize,
}

impl FixedEpisodeEnv {
    pub const EPISODE_LEN: usize = 5;

    pub fn new() -> Self {
        Self::default()
    }
}

impl Environment for FixedEpisodeEnv {
    type Observation = Vec<f32>;
    type Action = i64;

    fn reset(&mut self, seed: Option<u64>) -> Result<Vec<f32>> {
        self.resets += 1;
        if seed.is_some() {
            self.seeded_resets += 1;
        }
        self.step = 0;
        Ok(TRANSITIONS[0].to_vec())
    }

    fn step(&mut self, action: i64) -> Result<StepResult<Vec<f32>>> {
        if !(0..2).contains(&action) {
            return Err(anyhow!("invalid action {}", action));
        }
        self.step += 1;
        self.total_steps += 1;
        Ok(StepResult {
            observation: TRANSITIONS[self.step].to_vec(),
            reward: 1.0,
            terminated: self.step >= Self::EPISODE_LEN,
            truncated: false,
            info: StepInfo { episode_step: self.step },
        })
    }

    fn observation_space(&self) -> SpaceInfo {
        SpaceInfo { shape: vec![2], dtype: SpaceType::Continuous }
    }

    fn action_space(&self) -> SpaceInfo {
        SpaceInfo { shape: vec![], dtype: SpaceType::Discrete(2) }
    }
}
