#![warn(missing_docs)]
//! Core components of synchronous on-policy reinforcement learning.
//!
//! The crate trains an actor-critic policy on a batch of parallel
//! environments: short trajectory windows are collected into a
//! [`RolloutBuffer`], bootstrapped returns are estimated with or without
//! generalized advantage estimation, and the window is consumed by one of
//! three update schemes (A2C, PPO or ACKTR). The policy itself and its
//! optimizer live behind the [`PolicyOracle`] trait; this crate owns the
//! data flow and the loss arithmetic, not the function approximation.
pub mod dummy;
pub mod error;
pub mod record;
pub mod util;

mod base;
pub use base::{
    BackwardMode, Checkpointer, EnvStep, Evaluation, NullCheckpointer, PolicyOracle, PolicyOutput,
    VecEnv,
};

mod buffer;
pub use buffer::{
    FeedForwardBatches, Minibatch, RecurrentBatches, ReturnEstimator, RolloutBuffer, RolloutConfig,
};

mod trainer;
pub use trainer::{Algorithm, EpisodeStats, Trainer, TrainerConfig};
