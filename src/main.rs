//! reinforce-rl: REINFORCE policy-gradient training
//!
//! - `train`   -- Train a policy and save its reward history (and a video)
//! - `inspect` -- Summarize a saved reward history

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reinforce_rl::{
    train::{DeviceConfig, PgTrainer, RewardLogFormat, TrainerConfig},
    utils::RewardHistory,
};

/// REINFORCE policy-gradient trainer
#[derive(Parser)]
#[command(name = "reinforce-rl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a policy with REINFORCE.
    Train(TrainArgs),

    /// Print a summary of a saved reward history.
    Inspect {
        /// Reward history file (`.json` or `.bin`).
        path: PathBuf,
    },
}

/// Command line overrides; anything left unset comes from the config file
/// or the defaults.
#[derive(clap::Args)]
struct TrainArgs {
    /// Path to a JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Environment id (e.g. CartPole-v1).
    #[arg(long)]
    env_name: Option<String>,

    /// Hidden layer width.
    #[arg(long)]
    hidden_dim: Option<i64>,

    /// Learning rate.
    #[arg(long)]
    lr: Option<f64>,

    /// Number of rollouts.
    #[arg(long)]
    n_rollout: Option<usize>,

    /// Episodes per rollout.
    #[arg(long)]
    n_trajectory_per_rollout: Option<usize>,

    /// Seed for the first reset of each rollout.
    #[arg(long)]
    rng_seed: Option<u64>,

    /// Output file prefix.
    #[arg(long)]
    exp_name: Option<String>,

    /// Device: cpu, cuda[:N] or auto.
    #[arg(long)]
    device: Option<String>,

    /// Seed for libtorch.
    #[arg(long)]
    torch_seed: Option<i64>,

    /// Directory for outputs.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Reward history format: json or bincode.
    #[arg(long)]
    reward_log_format: Option<String>,

    /// Skip recording a video of the trained policy.
    #[arg(long)]
    no_video: bool,

    /// Save the trained policy parameters to this file.
    #[arg(long)]
    save_policy: Option<PathBuf>,
}

impl TrainArgs {
    fn into_config(self) -> Result<(TrainerConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::from_json_file(path)?,
            None => TrainerConfig::default(),
        };

        if let Some(v) = self.env_name {
            config.env_name = v;
        }
        if let Some(v) = self.hidden_dim {
            config.hidden_dim = v;
        }
        if let Some(v) = self.lr {
            config.lr = v;
        }
        if let Some(v) = self.n_rollout {
            config.n_rollout = v;
        }
        if let Some(v) = self.n_trajectory_per_rollout {
            config.n_trajectory_per_rollout = v;
        }
        if let Some(v) = self.rng_seed {
            config.rng_seed = v;
        }
        if let Some(v) = self.exp_name {
            config.exp_name = v;
        }
        if let Some(v) = self.device {
            config.device = v.parse::<DeviceConfig>()?;
        }
        if self.torch_seed.is_some() {
            config.torch_seed = self.torch_seed;
        }
        if let Some(v) = self.output_dir {
            config.output_dir = v;
        }
        if let Some(v) = self.reward_log_format {
            config.reward_log_format = v.parse::<RewardLogFormat>()?;
        }
        if self.no_video {
            config.record_video = false;
        }

        Ok((config, self.save_policy))
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Inspect { path } => run_inspect(&path),
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let (config, save_policy) = args.into_config()?;
    tracing::info!("Starting REINFORCE training on {}", config.env_name);
    tracing::info!(
        "  rollouts: {} | trajectories per rollout: {} | lr: {} | device: {}",
        config.n_rollout,
        config.n_trajectory_per_rollout,
        config.lr,
        config.device
    );

    let mut trainer = PgTrainer::new(config)?;
    let history = trainer.run_training_loop()?;

    if let Some((idx, best)) = history.best() {
        tracing::info!("Best average reward {:.2} at rollout {}", best, idx);
    }

    if let Some(path) = save_policy {
        trainer
            .save_policy(&path)
            .with_context(|| format!("failed to save policy to {}", path.display()))?;
        tracing::info!("Policy saved to {}", path.display());
    }

    Ok(())
}

fn run_inspect(path: &Path) -> Result<()> {
    let history = RewardHistory::load(path)?;
    println!("Reward history: {}", path.display());
    println!("  rollouts: {}", history.len());

    let values = history.as_slice();
    if let (Some(first), Some(last)) = (values.first(), values.last()) {
        println!("  first:    {:.2}", first);
        println!("  last:     {:.2}", last);
    }
    if let Some((idx, best)) = history.best() {
        println!("  best:     {:.2} (rollout {})", best, idx);
    }
    Ok(())
}
