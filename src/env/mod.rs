//! Environment traits and implementations
//!
//! This module defines the core environment interface, a small registry
//! that builds environments by id (see [`make`]), and the built-in
//! environments used for policy-gradient training.

use anyhow::{anyhow, Result};

pub mod cartpole;
pub mod render;
pub mod simple_bandit;

pub use render::{save_video, RenderMode, RgbFrame};

/// Core trait for RL environments
pub trait Environment {
    /// Observation type
    type Observation;

    /// Action type
    type Action;

    /// Reset the environment and return the initial observation
    ///
    /// When `seed` is given the environment's random generator is re-seeded
    /// before the new episode starts; otherwise it keeps its current state.
    fn reset(&mut self, seed: Option<u64>) -> Result<Self::Observation>;

    /// Step the environment with an action
    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::Observation>>;

    /// Get the observation space dimensions
    fn observation_space(&self) -> SpaceInfo;

    /// Get the action space dimensions
    fn action_space(&self) -> SpaceInfo;

    /// Drain the frames recorded since the last reset
    ///
    /// Environments created without a render mode return no frames.
    fn render(&mut self) -> Result<Vec<RgbFrame>> {
        Ok(Vec::new())
    }

    /// Static rendering metadata
    fn metadata(&self) -> EnvMetadata {
        EnvMetadata::default()
    }

    /// Release any resources held by the environment
    fn close(&mut self) {}
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    type Observation = E::Observation;
    type Action = E::Action;

    fn reset(&mut self, seed: Option<u64>) -> Result<Self::Observation> {
        (**self).reset(seed)
    }

    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::Observation>> {
        (**self).step(action)
    }

    fn observation_space(&self) -> SpaceInfo {
        (**self).observation_space()
    }

    fn action_space(&self) -> SpaceInfo {
        (**self).action_space()
    }

    fn render(&mut self) -> Result<Vec<RgbFrame>> {
        (**self).render()
    }

    fn metadata(&self) -> EnvMetadata {
        (**self).metadata()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Environment with vector observations and discrete actions
///
/// This is the shape of every environment the trainer can drive.
pub type DiscreteEnv = Box<dyn Environment<Observation = Vec<f32>, Action = i64>>;

/// Result of an environment step
#[derive(Debug, Clone)]
pub struct StepResult<O> {
    /// Next observation
    pub observation: O,

    /// Reward received
    pub reward: f32,

    /// Whether the episode terminated
    pub terminated: bool,

    /// Whether the episode was truncated
    pub truncated: bool,

    /// Additional info
    pub info: StepInfo,
}

impl<O> StepResult<O> {
    /// Whether the episode ended, either by termination or truncation
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Space information for observations and actions
#[derive(Debug, Clone)]
pub struct SpaceInfo {
    /// Shape of the space
    pub shape: Vec<usize>,

    /// Data type
    pub dtype: SpaceType,
}

impl SpaceInfo {
    /// Number of discrete choices, if this is a discrete space
    pub fn discrete_n(&self) -> Option<usize> {
        match self.dtype {
            SpaceType::Discrete(n) => Some(n),
            _ => None,
        }
    }

    /// Flattened number of elements described by the shape
    pub fn flat_dim(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Space data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceType {
    /// Discrete space with n options
    Discrete(usize),

    /// Continuous space (Box)
    Continuous,
}

/// Additional step information
#[derive(Debug, Clone, Default)]
pub struct StepInfo {
    /// Number of steps taken in the current episode
    pub episode_step: usize,
}

/// Rendering metadata exposed by an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvMetadata {
    /// Frames per second used when saving recorded episodes
    pub render_fps: u32,
}

impl Default for EnvMetadata {
    fn default() -> Self {
        Self { render_fps: 30 }
    }
}

/// Build an environment from its id
///
/// Known ids are `CartPole-v1` and `SimpleBandit-v0`. Passing a render mode
/// makes the environment record a frame on every reset and step, to be
/// collected with [`Environment::render`].
pub fn make(env_name: &str, render_mode: Option<RenderMode>) -> Result<DiscreteEnv> {
    let env: DiscreteEnv = match env_name {
        "CartPole-v1" => Box::new(cartpole::CartPole::with_render_mode(render_mode)),
        "SimpleBandit-v0" => Box::new(simple_bandit::SimpleBandit::with_render_mode(render_mode)),
        other => {
            return Err(anyhow!(
                "unknown environment id '{}' (available: {})",
                other,
                registered_envs().join(", ")
            ))
        }
    };
    tracing::debug!("Created environment {} (render mode: {:?})", env_name, render_mode);
    Ok(env)
}

/// Ids accepted by [`make`]
pub fn registered_envs() -> Vec<&'static str> {
    vec!["CartPole-v1", "SimpleBandit-v0"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_cartpole() {
        let env = make("CartPole-v1", None).unwrap();
        assert_eq!(env.observation_space().shape, vec![4]);
        assert_eq!(env.action_space().discrete_n(), Some(2));
        assert_eq!(env.metadata().render_fps, 50);
    }

    #[test]
    fn test_make_passes_render_mode() {
        for id in registered_envs() {
            let mut env = make(id, Some(RenderMode::RgbArrayList)).unwrap();
            env.reset(Some(0)).unwrap();
            env.step(0).unwrap();
            assert_eq!(env.render().unwrap().len(), 2, "{} should record frames", id);
        }
    }

    #[test]
    fn test_make_unknown_env() {
        let err = make("MountainCar-v0", None).err().expect("unknown id should fail");
        assert!(err.to_string().contains("MountainCar-v0"));
    }

    #[test]
    fn test_boxed_env_forwards_calls() {
        let mut env = make("SimpleBandit-v0", None).unwrap();
        let obs = env.reset(Some(3)).unwrap();
        assert_eq!(obs.len(), 1);

        let result = env.step(0).unwrap();
        assert!(!result.is_done());
        assert!(env.render().unwrap().is_empty());
    }

    #[test]
    fn test_space_info_helpers() {
        let space = SpaceInfo { shape: vec![2, 3], dtype: SpaceType::Continuous };
        assert_eq!(space.flat_dim(), 6);
        assert_eq!(space.discrete_n(), None);
    }
}
