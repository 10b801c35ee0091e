//! CartPole-v1
//!
//! Balance an inverted pendulum hinged on a cart by pushing the cart left or
//! right. Dynamics, constants and bounds follow Gymnasium's `CartPole-v1`:
//!
//! | | |
//! |---|---|
//! | observation | `[x, x_dot, theta, theta_dot]` |
//! | actions | `0` push left, `1` push right |
//! | reward | `1.0` per step, the terminating step included |
//! | terminated | pole beyond ±12° or cart beyond ±2.4 |
//! | truncated | after 500 steps |
//!
//! With [`RenderMode::RgbArrayList`] every reset and step appends a
//! 600x400 frame that `render()` hands back.

use anyhow::{anyhow, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::env::{
    EnvMetadata, Environment, RenderMode, RgbFrame, SpaceInfo, SpaceType, StepInfo, StepResult,
};

const SCREEN_WIDTH: u16 = 600;
const SCREEN_HEIGHT: u16 = 400;
const RENDER_FPS: u32 = 50;

/// Cart-pole balancing task
#[derive(Debug)]
pub struct CartPole {
    x: f32,
    x_dot: f32,
    /// radians, 0 is upright
    theta: f32,
    theta_dot: f32,

    steps: usize,
    max_steps: usize,

    gravity: f32,
    mass_pole: f32,
    total_mass: f32,
    /// half the pole length
    length: f32,
    pole_mass_length: f32,
    force_mag: f32,
    /// seconds per step
    tau: f32,

    theta_threshold: f32,
    x_threshold: f32,

    rng: StdRng,
    render_mode: Option<RenderMode>,
    frames: Vec<RgbFrame>,
}

impl CartPole {
    /// CartPole without frame recording
    pub fn new() -> Self {
        Self::with_render_mode(None)
    }

    /// CartPole recording frames when `render_mode` is set
    ///
    /// Gymnasium constants: g = 9.8, cart 1.0 kg, pole 0.1 kg with a 0.5 m
    /// half-length, 10 N pushes, 0.02 s steps.
    pub fn with_render_mode(render_mode: Option<RenderMode>) -> Self {
        let gravity = 9.8;
        let mass_cart = 1.0;
        let mass_pole = 0.1;
        let length = 0.5;

        Self {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
            max_steps: 500,
            gravity,
            mass_pole,
            total_mass: mass_cart + mass_pole,
            length,
            pole_mass_length: mass_pole * length,
            force_mag: 10.0,
            tau: 0.02,
            theta_threshold: 12f32.to_radians(),
            x_threshold: 2.4,
            rng: StdRng::from_entropy(),
            render_mode,
            frames: Vec::new(),
        }
    }

    /// Draw every state variable uniformly from [-0.05, 0.05)
    fn sample_initial_state(&mut self) {
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
    }

    /// Advance the dynamics by `tau` with explicit Euler
    ///
    /// Positions are updated from the old velocities, then velocities from
    /// the new accelerations.
    fn integrate(&mut self, action: i64) {
        let force = if action == 1 { self.force_mag } else { -self.force_mag };

        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        let temp = (force + self.pole_mass_length * self.theta_dot * self.theta_dot * sin_theta)
            / self.total_mass;
        let theta_acc = (self.gravity * sin_theta - cos_theta * temp)
            / (self.length
                * (4.0 / 3.0 - self.mass_pole * cos_theta * cos_theta / self.total_mass));
        let x_acc = temp - self.pole_mass_length * theta_acc * cos_theta / self.total_mass;

        self.x += self.tau * self.x_dot;
        self.x_dot += self.tau * x_acc;
        self.theta += self.tau * self.theta_dot;
        self.theta_dot += self.tau * theta_acc;
    }

    fn out_of_bounds(&self) -> bool {
        self.x.abs() > self.x_threshold || self.theta.abs() > self.theta_threshold
    }

    fn time_limit_reached(&self) -> bool {
        self.steps >= self.max_steps
    }

    fn state_vector(&self) -> Vec<f32> {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }

    /// Draw the current state: track, cart, pole and axle
    fn draw_frame(&self) -> RgbFrame {
        let mut frame = RgbFrame::filled(SCREEN_WIDTH, SCREEN_HEIGHT, [255, 255, 255]);

        let world_width = self.x_threshold * 2.0;
        let scale = SCREEN_WIDTH as f32 / world_width;
        let pole_width = 10.0;
        let pole_len = scale * (2.0 * self.length);
        let cart_width = 50.0;
        let cart_height = 30.0;

        // Screen y grows downwards; the track sits 100px above the bottom edge
        let track_y = SCREEN_HEIGHT as f32 - 100.0;
        let cart_x = self.x * scale + SCREEN_WIDTH as f32 / 2.0;

        frame.fill_rect(0, track_y as i64, SCREEN_WIDTH as i64, track_y as i64 + 1, [0, 0, 0]);

        let axle_y = track_y - cart_height / 2.0 - 4.0;
        frame.fill_rect(
            (cart_x - cart_width / 2.0) as i64,
            (axle_y - cart_height / 2.0) as i64,
            (cart_x + cart_width / 2.0) as i64,
            (axle_y + cart_height / 2.0) as i64,
            [0, 0, 0],
        );

        let tip = (
            cart_x + pole_len * self.theta.sin(),
            axle_y - pole_len * self.theta.cos(),
        );
        frame.draw_segment((cart_x, axle_y), tip, pole_width, [202, 152, 101]);
        frame.fill_circle((cart_x, axle_y), pole_width / 2.0, [129, 132, 203]);

        frame
    }

    fn record_frame(&mut self) {
        if self.render_mode == Some(RenderMode::RgbArrayList) {
            let frame = self.draw_frame();
            self.frames.push(frame);
        }
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for CartPole {
    type Observation = Vec<f32>;
    type Action = i64;

    fn reset(&mut self, seed: Option<u64>) -> Result<Self::Observation> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.sample_initial_state();
        self.steps = 0;
        self.frames.clear();
        self.record_frame();
        Ok(self.state_vector())
    }

    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::Observation>> {
        if !(0..2).contains(&action) {
            return Err(anyhow!("invalid CartPole action {} (expected 0 or 1)", action));
        }

        self.integrate(action);
        self.steps += 1;
        self.record_frame();

        Ok(StepResult {
            observation: self.state_vector(),
            reward: 1.0,
            terminated: self.out_of_bounds(),
            truncated: self.time_limit_reached(),
            info: StepInfo { episode_step: self.steps },
        })
    }

    fn observation_space(&self) -> SpaceInfo {
        SpaceInfo { shape: vec![4], dtype: SpaceType::Continuous }
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
