//! REINFORCE configuration
//!
//! This module defines the parameters of a training run and provides
//! validation, JSON loading and builder pattern methods.

use std::{fmt, path::Path, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tch::Device;

/// Where the policy parameters live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceConfig {
    /// Always use the CPU
    Cpu,

    /// Use the given CUDA device
    Cuda(usize),

    /// CUDA device 0 if available, otherwise CPU
    Auto,
}

impl DeviceConfig {
    /// Resolve to a tch device
    pub fn to_device(self) -> Device {
        match self {
            DeviceConfig::Cpu => Device::Cpu,
            DeviceConfig::Cuda(idx) => Device::Cuda(idx),
            DeviceConfig::Auto => Device::cuda_if_available(),
        }
    }
}

impl fmt::Display for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceConfig::Cpu => write!(f, "cpu"),
            DeviceConfig::Cuda(idx) => write!(f, "cuda:{}", idx),
            DeviceConfig::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for DeviceConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(DeviceConfig::Cpu),
            "auto" => Ok(DeviceConfig::Auto),
            "cuda" => Ok(DeviceConfig::Cuda(0)),
            other => match other.strip_prefix("cuda:") {
                Some(idx) => idx
                    .parse()
                    .map(DeviceConfig::Cuda)
                    .map_err(|_| anyhow!("invalid CUDA device index in '{}'", s)),
                None => Err(anyhow!("unknown device '{}' (expected cpu, cuda[:N] or auto)", s)),
            },
        }
    }
}

impl TryFrom<String> for DeviceConfig {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceConfig> for String {
    fn from(value: DeviceConfig) -> Self {
        value.to_string()
    }
}

/// File format of the saved reward history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardLogFormat {
    /// JSON array of floats
    #[default]
    Json,

    /// bincode-encoded `Vec<f64>`
    Bincode,
}

impl RewardLogFormat {
    /// File extension used for this format
    pub fn extension(self) -> &'static str {
        match self {
            RewardLogFormat::Json => "json",
            RewardLogFormat::Bincode => "bin",
        }
    }
}

impl FromStr for RewardLogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(RewardLogFormat::Json),
            "bincode" | "bin" => Ok(RewardLogFormat::Bincode),
            other => {
                Err(anyhow!("unknown reward log format '{}' (expected json or bincode)", other))
            }
        }
    }
}

/// Training run configuration
///
/// The first seven fields are the classic REINFORCE knobs; the rest control
/// where results go and how the final policy is evaluated. Missing fields
/// take their default values when loading from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Environment id passed to `env::make`
    pub env_name: String,

    /// Width of the policy's hidden layer
    pub hidden_dim: i64,

    /// Adam learning rate
    pub lr: f64,

    /// Number of rollout/update cycles
    pub n_rollout: usize,

    /// Episodes collected per rollout
    pub n_trajectory_per_rollout: usize,

    /// Seed for the first reset of every rollout
    pub rng_seed: u64,

    /// Prefix of the output files
    pub exp_name: String,

    /// Device for the policy parameters
    pub device: DeviceConfig,

    /// Seed for libtorch (parameter init and action sampling)
    pub torch_seed: Option<i64>,

    /// Directory receiving the reward history and the video folder
    pub output_dir: PathBuf,

    /// Format of the saved reward history
    pub reward_log_format: RewardLogFormat,

    /// Record one episode of the final policy after training
    pub record_video: bool,

    /// Frame cap for the recorded episode
    pub max_video_frames: usize,

    /// Pick the most likely action when recording instead of sampling
    pub video_greedy: bool,

    /// Optional cap on episode length during training
    pub max_episode_steps: Option<usize>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            env_name: "CartPole-v1".to_string(),
            hidden_dim: 128,
            lr: 1e-3,
            n_rollout: 100,
            n_trajectory_per_rollout: 60,
            rng_seed: 6369,
            exp_name: "CartPole_v1_t0".to_string(),
            device: DeviceConfig::Auto,
            torch_seed: None,
            output_dir: PathBuf::from("."),
            reward_log_format: RewardLogFormat::Json,
            record_video: true,
            max_video_frames: 1000,
            video_greedy: false,
            max_episode_steps: None,
        }
    }
}

impl TrainerConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.env_name.is_empty() {
            return Err(anyhow!("env_name must not be empty"));
        }
        if self.exp_name.is_empty() {
            return Err(anyhow!("exp_name must not be empty"));
        }
        if self.hidden_dim <= 0 {
            return Err(anyhow!("hidden_dim must be positive"));
        }
        if !(self.lr > 0.0 && self.lr.is_finite()) {
            return Err(anyhow!("lr must be positive"));
        }
        if self.n_trajectory_per_rollout == 0 {
            return Err(anyhow!("n_trajectory_per_rollout must be positive"));
        }
        if self.record_video && self.max_video_frames == 0 {
            return Err(anyhow!("max_video_frames must be positive when recording video"));
        }
        if self.max_episode_steps == Some(0) {
            return Err(anyhow!("max_episode_steps must be positive when set"));
        }
        Ok(())
    }

    /// Path of the reward history file: `<output_dir>/<exp_name>.<ext>`
    pub fn reward_log_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.exp_name, self.reward_log_format.extension()))
    }

    /// Folder receiving the recorded episode
    ///
    /// The environment id without its version suffix, so `CartPole-v1`
    /// records into `<output_dir>/CartPole`.
    pub fn video_folder(&self) -> PathBuf {
        let base = match self.env_name.rsplit_once('-') {
            Some((base, version))
                if version.len() > 1
                    && version.starts_with('v')
                    && version[1..].chars().all(|c| c.is_ascii_digit()) =>
            {
                base
            }
            _ => self.env_name.as_str(),
        };
        self.output_dir.join(base)
    }

    /// Set environment id
    pub fn env_name(mut self, env_name: impl Into<String>) -> Self {
        self.env_name = env_name.into();
        self
    }

    /// Set hidden layer width
    pub fn hidden_dim(mut self, hidden_dim: i64) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    /// Set learning rate
    pub fn lr(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    /// Set number of rollouts
    pub fn n_rollout(mut self, n_rollout: usize) -> Self {
        self.n_rollout = n_rollout;
        self
    }

    /// Set episodes per rollout
    pub fn n_trajectory_per_rollout(mut self, n: usize) -> Self {
        self.n_trajectory_per_rollout = n;
        self
    }

    /// Set environment seed
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Set experiment name
    pub fn exp_name(mut self, exp_name: impl Into<String>) -> Self {
        self.exp_name = exp_name.into();
        self
    }

    /// Set device
    pub fn device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set libtorch seed
    pub fn torch_seed(mut self, seed: Option<i64>) -> Self {
        self.torch_seed = seed;
        self
    }

    /// Set output directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set reward history format
    pub fn reward_log_format(mut self, format: RewardLogFormat) -> Self {
        self.reward_log_format = format;
        self
    }

    /// Enable or disable the final video
    pub fn record_video(mut self, record: bool) -> Self {
        self.record_video = record;
        self
    }

    /// Set the video frame cap
    pub fn max_video_frames(mut self, frames: usize) -> Self {
        self.max_video_frames = frames;
        self
    }

    /// Use greedy actions for the recorded episode
    pub fn video_greedy(mut self, greedy: bool) -> Self {
        self.video_greedy = greedy;
        self
    }

    /// Set the training episode length cap
    pub fn max_episode_steps(mut self, steps: Option<usize>) -> Self {
        self.max_episode_steps = steps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.env_name, "CartPole-v1");
        assert_eq!(config.lr, 1e-3);
        assert_eq!(config.max_video_frames, 1000);
    }

    #[test]
    fn test_config_validation() {
        assert!(TrainerConfig::new().lr(-1.0).validate().is_err());
        assert!(TrainerConfig::new().lr(f64::NAN).validate().is_err());
        assert!(TrainerConfig::new().hidden_dim(0).validate().is_err());
        assert!(TrainerConfig::new().n_trajectory_per_rollout(0).validate().is_err());
        assert!(TrainerConfig::new().exp_name("").validate().is_err());
        assert!(TrainerConfig::new().max_episode_steps(Some(0)).validate().is_err());

        // Zero rollouts is a valid (empty) run
        assert!(TrainerConfig::new().n_rollout(0).validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = TrainerConfig::new()
            .env_name("SimpleBandit-v0")
            .hidden_dim(32)
            .n_rollout(5)
            .rng_seed(1)
            .device(DeviceConfig::Cpu);

        assert_eq!(config.env_name, "SimpleBandit-v0");
        assert_eq!(config.hidden_dim, 32);
        assert_eq!(config.n_rollout, 5);
        assert_eq!(config.rng_seed, 1);
        assert_eq!(config.device, DeviceConfig::Cpu);

        // Other values should remain default
        assert_eq!(config.n_trajectory_per_rollout, 60);
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let json = r#"{
            "env_name": "CartPole-v1",
            "hidden_dim": 64,
            "lr": 0.01,
            "n_rollout": 3,
            "n_trajectory_per_rollout": 2,
            "rng_seed": 5,
            "exp_name": "run",
            "device": "cuda:1",
            "reward_log_format": "bincode"
        }"#;
        let config: TrainerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.hidden_dim, 64);
        assert_eq!(config.device, DeviceConfig::Cuda(1));
        assert_eq!(config.reward_log_format, RewardLogFormat::Bincode);
        assert!(config.record_video);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<DeviceConfig>().unwrap(), DeviceConfig::Cpu);
        assert_eq!("CUDA".parse::<DeviceConfig>().unwrap(), DeviceConfig::Cuda(0));
        assert_eq!("cuda:2".parse::<DeviceConfig>().unwrap(), DeviceConfig::Cuda(2));
        assert_eq!("auto".parse::<DeviceConfig>().unwrap(), DeviceConfig::Auto);
        assert!("tpu".parse::<DeviceConfig>().is_err());
        assert!("cuda:x".parse::<DeviceConfig>().is_err());
        assert_eq!(DeviceConfig::Cpu.to_device(), Device::Cpu);
    }

    #[test]
    fn test_output_paths() {
        let config = TrainerConfig::new().exp_name("exp").output_dir("/tmp/out");
        assert_eq!(config.reward_log_path(), PathBuf::from("/tmp/out/exp.json"));
        assert_eq!(config.video_folder(), PathBuf::from("/tmp/out/CartPole"));

        let config = config.reward_log_format(RewardLogFormat::Bincode).env_name("Custom-env");
        assert_eq!(config.reward_log_path(), PathBuf::from("/tmp/out/exp.bin"));
        assert_eq!(config.video_folder(), PathBuf::from("/tmp/out/Custom-env"));
    }
}
