//! Configuration of [`Trainer`](super::Trainer).
use crate::error::VecrollError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Gradient update scheme applied to each completed window.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Synchronous advantage actor-critic, one whole-window update.
    A2c,

    /// Proximal policy optimization with a clipped surrogate objective.
    Ppo,

    /// A2C with Kronecker-factored natural gradient preconditioning.
    Acktr,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::A2c => write!(f, "a2c"),
            Algorithm::Ppo => write!(f, "ppo"),
            Algorithm::Acktr => write!(f, "acktr"),
        }
    }
}

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// Update scheme.
    pub algorithm: Algorithm,

    /// Number of window updates to run.
    pub num_updates: usize,

    /// Discount factor.
    pub gamma: f32,

    /// Generalized advantage estimation parameter.
    pub tau: f32,

    /// Use generalized advantage estimation instead of n-step returns.
    pub use_gae: bool,

    /// Whether the policy carries recurrent state across steps.
    pub recurrent: bool,

    /// Weight of the entropy bonus.
    pub entropy_coef: f32,

    /// Weight of the value loss in the combined objective.
    pub value_loss_coef: f32,

    /// Gradient norm clip applied by first-order optimizer steps.
    pub max_grad_norm: f32,

    /// PPO probability ratio clip.
    pub clip_param: f32,

    /// Number of passes over the window per PPO update.
    pub ppo_epochs: usize,

    /// Number of minibatches per PPO epoch.
    pub num_mini_batch: usize,

    /// Epsilon added to the advantage standard deviation when
    /// standardizing.
    pub adv_eps: f32,

    /// Number of optimizer steps between ACKTR curvature refreshes.
    pub fisher_interval: usize,

    /// Number of observation frames stacked per environment.
    pub num_stack: usize,

    /// Progress is logged every `log_interval` updates; 0 disables it.
    pub log_interval: usize,

    /// Random seed of the curvature sampling noise.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::A2c,
            num_updates: 100,
            gamma: 0.99,
            tau: 0.95,
            use_gae: false,
            recurrent: false,
            entropy_coef: 0.01,
            value_loss_coef: 0.5,
            max_grad_norm: 0.5,
            clip_param: 0.2,
            ppo_epochs: 4,
            num_mini_batch: 32,
            adv_eps: 1e-5,
            fisher_interval: 10,
            num_stack: 1,
            log_interval: 10,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    /// Sets the update scheme.
    pub fn algorithm(mut self, v: Algorithm) -> Self {
        self.algorithm = v;
        self
    }

    /// Sets the number of window updates.
    pub fn num_updates(mut self, v: usize) -> Self {
        self.num_updates = v;
        self
    }

    /// Derives the number of window updates from a total environment frame
    /// budget: `num_frames / (num_steps * num_envs)`, rounded down.
    pub fn num_frames(mut self, num_frames: usize, num_steps: usize, num_envs: usize) -> Self {
        self.num_updates = num_frames / (num_steps * num_envs);
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the generalized advantage estimation parameter.
    pub fn tau(mut self, v: f32) -> Self {
        self.tau = v;
        self
    }

    /// Enables or disables generalized advantage estimation.
    pub fn use_gae(mut self, v: bool) -> Self {
        self.use_gae = v;
        self
    }

    /// Marks the policy as recurrent.
    pub fn recurrent(mut self, v: bool) -> Self {
        self.recurrent = v;
        self
    }

    /// Sets the entropy bonus weight.
    pub fn entropy_coef(mut self, v: f32) -> Self {
        self.entropy_coef = v;
        self
    }

    /// Sets the value loss weight.
    pub fn value_loss_coef(mut self, v: f32) -> Self {
        self.value_loss_coef = v;
        self
    }

    /// Sets the gradient norm clip.
    pub fn max_grad_norm(mut self, v: f32) -> Self {
        self.max_grad_norm = v;
        self
    }

    /// Sets the PPO ratio clip.
    pub fn clip_param(mut self, v: f32) -> Self {
        self.clip_param = v;
        self
    }

    /// Sets the number of PPO epochs.
    pub fn ppo_epochs(mut self, v: usize) -> Self {
        self.ppo_epochs = v;
        self
    }

    /// Sets the number of minibatches per epoch.
    pub fn num_mini_batch(mut self, v: usize) -> Self {
        self.num_mini_batch = v;
        self
    }

    /// Sets the advantage standardization epsilon.
    pub fn adv_eps(mut self, v: f32) -> Self {
        self.adv_eps = v;
        self
    }

    /// Sets the curvature refresh interval.
    pub fn fisher_interval(mut self, v: usize) -> Self {
        self.fisher_interval = v;
        self
    }

    /// Sets the number of stacked observation frames.
    pub fn num_stack(mut self, v: usize) -> Self {
        self.num_stack = v;
        self
    }

    /// Sets the progress logging interval.
    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v;
        self
    }

    /// Sets the seed of the curvature sampling noise.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Checks the configuration against the window geometry.
    ///
    /// PPO requires the minibatch count to evenly divide the transition
    /// count (feed-forward) or the environment count (recurrent). ACKTR
    /// does not support recurrent policies.
    pub fn validate(&self, num_steps: usize, num_envs: usize) -> Result<(), VecrollError> {
        match self.algorithm {
            Algorithm::Ppo => {
                if self.recurrent {
                    if self.num_mini_batch == 0 || num_envs % self.num_mini_batch != 0 {
                        return Err(VecrollError::EnvCount {
                            num_envs,
                            num_mini_batch: self.num_mini_batch,
                        });
                    }
                } else {
                    let total = num_steps * num_envs;
                    if self.num_mini_batch == 0 || total % self.num_mini_batch != 0 {
                        return Err(VecrollError::MinibatchCount {
                            total,
                            num_mini_batch: self.num_mini_batch,
                        });
                    }
                }
            }
            Algorithm::Acktr => {
                if self.recurrent {
                    return Err(VecrollError::RecurrentNotSupported);
                }
            }
            Algorithm::A2c => {}
        }
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`] to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
