//! Utility functions and helpers

pub mod reward_log;

pub use reward_log::RewardHistory;
