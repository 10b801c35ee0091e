//! Saving and loading the per-rollout reward history

use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::train::reinforce::RewardLogFormat;

/// Average trajectory reward of every rollout, in rollout order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardHistory(pub Vec<f64>);

impl RewardHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the average reward of a finished rollout
    pub fn push(&mut self, average_reward: f64) {
        self.0.push(average_reward);
    }

    /// Number of recorded rollouts
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no rollout has been recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded values
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Highest average reward and the rollout it came from
    pub fn best(&self) -> Option<(usize, f64)> {
        self.0
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (idx, value)| match best {
                Some((_, b)) if b >= value => best,
                _ => Some((idx, value)),
            })
    }

    /// Save in the given format
    pub fn save<P: AsRef<Path>>(&self, path: P, format: RewardLogFormat) -> Result<()> {
        match format {
            RewardLogFormat::Json => self.save_json(path),
            RewardLogFormat::Bincode => self.save_bincode(path),
        }
    }

    /// Load, picking the format from the file extension (`.bin` is bincode)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => Self::load_bincode(path),
            _ => Self::load_json(path),
        }
    }

    /// Save as a JSON array
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;
        let mut file = File::create(path)
            .with_context(|| format!("failed to create reward log {}", path.display()))?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load from a JSON array
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .with_context(|| format!("failed to open reward log {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let history = serde_json::from_str(&contents)?;
        Ok(history)
    }

    /// Save as bincode
    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let encoded = bincode::serialize(self)?;
        let mut file = File::create(path)
            .with_context(|| format!("failed to create reward log {}", path.display()))?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load from bincode
    pub fn load_bincode<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .with_context(|| format!("failed to open reward log {}", path.display()))?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        let history = bincode::deserialize(&buffer)?;
        Ok(history)
    }
}

impl From<Vec<f64>> for RewardHistory {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_json_layout_is_a_plain_list() -> Result<()> {
        let history = RewardHistory::from(vec![9.5, 21.0]);
        let temp_file = NamedTempFile::new()?;

        history.save_json(temp_file.path())?;
        assert_eq!(std::fs::read_to_string(temp_file.path())?, "[9.5,21.0]");
        assert_eq!(RewardHistory::load_json(temp_file.path())?, history);
        Ok(())
    }

    #[test]
    fn test_empty_history_is_an_empty_list() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        RewardHistory::new().save_json(temp_file.path())?;
        assert_eq!(std::fs::read_to_string(temp_file.path())?, "[]");
        Ok(())
    }

    #[test]
    fn test_load_picks_format_from_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("run.bin");
        let history = RewardHistory::from(vec![1.0, 2.0, 3.0]);

        history.save(&path, RewardLogFormat::Bincode)?;
        assert_eq!(RewardHistory::load(&path)?, history);
        Ok(())
    }

    #[test]
    fn test_best() {
        assert_eq!(RewardHistory::new().best(), None);
        let history = RewardHistory::from(vec![3.0, 7.5, 7.5, 2.0]);
        assert_eq!(history.best(), Some((1, 7.5)));
    }
}
