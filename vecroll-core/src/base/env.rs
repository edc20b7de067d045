//! Vectorized environment.
use crate::record::Record;
use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView2};

/// Result of stepping all environments once.
pub struct EnvStep {
    /// Observations after the step, shape `(num_envs, obs_dim)`.
    pub obs: Array2<f32>,

    /// Rewards, shape `(num_envs,)`.
    pub rewards: Array1<f32>,

    /// Episode-end flags, one per environment. An environment reporting
    /// `true` has already been reset and its row of `obs` is the first
    /// observation of the next episode.
    pub dones: Vec<bool>,

    /// Environment-defined information about the step.
    pub record: Record,
}

/// A fixed-size batch of environments stepped synchronously.
///
/// The underlying simulators may run in separate threads or processes;
/// from the perspective of this crate a step is a single blocking call
/// returning results for all environments at once.
pub trait VecEnv {
    /// Number of environments in the batch.
    fn num_envs(&self) -> usize;

    /// Reset all environments, returning the initial observations,
    /// shape `(num_envs, obs_dim)`.
    fn reset(&mut self) -> Result<Array2<f32>>;

    /// Step all environments with the given actions, shape
    /// `(num_envs, act_dim)`.
    fn step(&mut self, actions: ArrayView2<f32>) -> Result<EnvStep>;
}
