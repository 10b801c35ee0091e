//! Simple Contextual Bandit Environment
//!
//! A trivial environment for checking that policy-gradient training learns:
//! - State: single binary value (0 or 1)
//! - Actions: two choices (0 or 1)
//! - Optimal policy: always choose action = state
//! - Reward: +1.0 if action == state, 0.0 otherwise
//! - Episodes: fixed length of 100 steps
//!
//! Rewards vary within an episode, so per-trajectory reward normalization
//! produces a useful learning signal here.
//!
//! With [`RenderMode::RgbArrayList`] each reset and step records a small
//! frame: two cells for the two states, the current one lit, and a bar
//! under the cell chosen by the last action (green if rewarded, red if not).

use anyhow::{anyhow, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{
    EnvMetadata, Environment, RenderMode, RgbFrame, SpaceInfo, SpaceType, StepInfo, StepResult,
};

const CELL: u16 = 80;
const SCREEN_WIDTH: u16 = CELL * 2;
const SCREEN_HEIGHT: u16 = CELL + 20;
const RENDER_FPS: u32 = 10;

/// Simple contextual bandit
#[derive(Debug)]
pub struct SimpleBandit {
    state: f32,
    steps: usize,
    max_steps: usize,
    rng: StdRng,
    /// Last action and whether it was rewarded
    last_choice: Option<(i64, bool)>,
    render_mode: Option<RenderMode>,
    frames: Vec<RgbFrame>,
}

impl SimpleBandit {
    /// Create a new simple bandit environment with 100-step episodes
    pub fn new() -> Self {
        Self::with_episode_length(100)
    }

    /// Create a bandit whose episodes last `max_steps` steps
    pub fn with_episode_length(max_steps: usize) -> Self {
        Self {
            state: 0.0,
            steps: 0,
            max_steps,
            rng: StdRng::from_entropy(),
            last_choice: None,
            render_mode: None,
            frames: Vec::new(),
        }
    }

    /// 100-step bandit recording frames when `render_mode` is set
    pub fn with_render_mode(render_mode: Option<RenderMode>) -> Self {
        Self { render_mode, ..Self::new() }
    }

    fn draw_frame(&self) -> RgbFrame {
        let mut frame = RgbFrame::filled(SCREEN_WIDTH, SCREEN_HEIGHT, [255, 255, 255]);
        let cell = CELL as i64;

        let lit = self.state as i64;
        frame.fill_rect(lit * cell + 4, 4, (lit + 1) * cell - 4, cell - 4, [66, 133, 244]);

        if let Some((action, rewarded)) = self.last_choice {
            let color = if rewarded { [52, 168, 83] } else { [234, 67, 53] };
            frame.fill_rect(action * cell + 4, cell + 4, (action + 1) * cell - 4, cell + 16, color);
        }

        frame
    }

    fn record_frame(&mut self) {
        if self.render_mode == Some(RenderMode::RgbArrayList) {
            let frame = self.draw_frame();
            self.frames.push(frame);
        }
    }
}

impl Default for SimpleBandit {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimpleBandit {
    type Observation = Vec<f32>;
    type Action = i64;

    fn reset(&mut self, seed: Option<u64>) -> Result<Self::Observation> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.state = self.rng.gen_range(0..2) as f32;
        self.steps = 0;
        self.last_choice = None;
        self.frames.clear();
        self.record_frame();
        Ok(vec![self.state])
    }

    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::Observation>> {
        if !(0..2).contains(&action) {
            return Err(anyhow!("invalid SimpleBandit action {} (expected 0 or 1)", action));
        }

        let rewarded = action == self.state as i64;
        let reward = if rewarded { 1.0 } else { 0.0 };

        self.steps += 1;
        self.state = self.rng.gen_range(0..2) as f32;
        self.last_choice = Some((action, rewarded));
        self.record_frame();

        Ok(StepResult {
            observation: vec![self.state],
            reward,
            terminated: self.steps >= self.max_steps,
            truncated: false,
            info: StepInfo { episode_step: self.steps },
        })
    }

    fn observation_space(&self) -> SpaceInfo {
        SpaceInfo { shape: vec![1], dtype: SpaceType::Continuous }
    }

    fn action_space(&self) -> SpaceInfo {
        SpaceInfo { shape: vec![], dtype: SpaceType::Discrete(2) }
    }

    fn render(&mut self) -> Result<Vec<RgbFrame>> {
        Ok(std::mem::take(&mut self.frames))
    }

    fn metadata(&self) -> EnvMetadata {
        EnvMetadata { render_fps: RENDER_FPS }
    }

    fn close(&mut self) {
        self.frames.clear();
    }
}
