//! Configuration of [`RolloutBuffer`](super::RolloutBuffer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`RolloutBuffer`](super::RolloutBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RolloutConfig {
    /// Number of steps per trajectory window.
    pub num_steps: usize,

    /// Number of parallel environments.
    pub num_envs: usize,

    /// Width of one (stacked) observation row.
    pub obs_dim: usize,

    /// Width of one recurrent state row.
    pub state_dim: usize,

    /// Width of one action row.
    pub act_dim: usize,

    /// Random seed for minibatch permutations.
    pub seed: u64,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            num_steps: 5,
            num_envs: 16,
            obs_dim: 4,
            state_dim: 1,
            act_dim: 1,
            seed: 42,
        }
    }
}

impl RolloutConfig {
    /// Sets the number of steps per window.
    pub fn num_steps(mut self, v: usize) -> Self {
        self.num_steps = v;
        self
    }

    /// Sets the number of parallel environments.
    pub fn num_envs(mut self, v: usize) -> Self {
        self.num_envs = v;
        self
    }

    /// Sets the observation width.
    pub fn obs_dim(mut self, v: usize) -> Self {
        self.obs_dim = v;
        self
    }

    /// Sets the recurrent state width.
    pub fn state_dim(mut self, v: usize) -> Self {
        self.state_dim = v;
        self
    }

    /// Sets the action width.
    pub fn act_dim(mut self, v: usize) -> Self {
        self.act_dim = v;
        self
    }

    /// Sets the random seed used for minibatch permutations.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`RolloutConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RolloutConfig`] to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
