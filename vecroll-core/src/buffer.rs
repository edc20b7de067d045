//! Rollout buffer for one trajectory window.
//!
//! [`RolloutBuffer`] stores a fixed window of `num_steps` transitions for
//! `num_envs` parallel environments. [`ReturnEstimator`] fills in the
//! bootstrapped returns once a window is complete, and the samplers slice
//! the window into minibatches for repeated optimization passes.
mod base;
mod config;
mod returns;
mod sampler;

pub use base::RolloutBuffer;
pub use config::RolloutConfig;
pub use returns::ReturnEstimator;
pub use sampler::{FeedForwardBatches, Minibatch, RecurrentBatches};
