//! Minibatch sampling protocols.
//!
//! A completed window can be sliced into minibatches in two ways. The
//! feed-forward protocol shuffles all `num_steps * num_envs` transitions
//! and is valid for memory-less policies. The recurrent protocol keeps
//! whole environment columns in temporal order so the policy can unroll
//! its state, handing over only the state at the first row of each column.
//!
//! Both samplers permute eagerly and then yield lazily: one call produces
//! a finite, one-shot iterator, and a fresh call draws a new permutation.
use super::RolloutBuffer;
use crate::error::VecrollError;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;

/// One minibatch of gradient-ready training data.
///
/// `observations`, `actions`, `returns`, `masks`, `old_log_probs` and
/// `advantages` have one row per transition. `states` has one row per
/// trajectory: for feed-forward sampling that is one row per transition,
/// for recurrent sampling one row per environment column (the state at the
/// column's first step).
#[derive(Debug, Clone)]
pub struct Minibatch {
    /// Observations, `(batch, obs_dim)`.
    pub observations: Array2<f32>,

    /// Recurrent states, `(rows, state_dim)`.
    pub states: Array2<f32>,

    /// Actions, `(batch, act_dim)`.
    pub actions: Array2<f32>,

    /// Return targets, `(batch,)`.
    pub returns: Array1<f32>,

    /// Continuation masks, `(batch,)`.
    pub masks: Array1<f32>,

    /// Behavior-policy log probabilities, `(batch,)`.
    pub old_log_probs: Array1<f32>,

    /// Advantage targets, `(batch,)`.
    pub advantages: Array1<f32>,
}

impl RolloutBuffer {
    /// Shuffled transition-level minibatches for memory-less policies.
    ///
    /// `advantages` must have shape `(num_steps, num_envs)`. Fails if
    /// `num_mini_batch` does not evenly divide the transition count.
    pub fn feed_forward_batches<'a>(
        &'a mut self,
        advantages: &'a Array2<f32>,
        num_mini_batch: usize,
    ) -> Result<FeedForwardBatches<'a>, VecrollError> {
        let total = self.len();
        if num_mini_batch == 0 || total % num_mini_batch != 0 {
            return Err(VecrollError::MinibatchCount {
                total,
                num_mini_batch,
            });
        }
        let batch_size = total / num_mini_batch;
        let mut indices: Vec<usize> = (0..total).collect();
        indices.shuffle(&mut self.rng);
        Ok(FeedForwardBatches {
            buffer: self,
            advantages,
            indices,
            batch_size,
            cursor: 0,
        })
    }

    /// Environment-column minibatches for recurrent policies.
    ///
    /// `advantages` must have shape `(num_steps, num_envs)`. Fails if
    /// `num_mini_batch` does not evenly divide the environment count.
    pub fn recurrent_batches<'a>(
        &'a mut self,
        advantages: &'a Array2<f32>,
        num_mini_batch: usize,
    ) -> Result<RecurrentBatches<'a>, VecrollError> {
        let num_envs = self.num_envs;
        if num_mini_batch == 0 || num_envs % num_mini_batch != 0 {
            return Err(VecrollError::EnvCount {
                num_envs,
                num_mini_batch,
            });
        }
        let envs_per_batch = num_envs / num_mini_batch;
        let mut envs: Vec<usize> = (0..num_envs).collect();
        envs.shuffle(&mut self.rng);
        Ok(RecurrentBatches {
            buffer: self,
            advantages,
            envs,
            envs_per_batch,
            cursor: 0,
        })
    }
}

/// One-shot iterator over shuffled transition-level minibatches.
#[derive(Debug)]
pub struct FeedForwardBatches<'a> {
    buffer: &'a RolloutBuffer,
    advantages: &'a Array2<f32>,
    indices: Vec<usize>,
    batch_size: usize,
    cursor: usize,
}

impl<'a> Iterator for FeedForwardBatches<'a> {
    type Item = Minibatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.indices.len() {
            return None;
        }
        let group = &self.indices[self.cursor..self.cursor + self.batch_size];
        self.cursor += self.batch_size;

        let b = self.buffer;
        let size = group.len();
        let mut observations = Array2::zeros((size, b.obs_dim));
        let mut states = Array2::zeros((size, b.state_dim));
        let mut actions = Array2::zeros((size, b.act_dim));
        let mut returns = Array1::zeros(size);
        let mut masks = Array1::zeros(size);
        let mut old_log_probs = Array1::zeros(size);
        let mut advantages = Array1::zeros(size);

        for (row, &ix) in group.iter().enumerate() {
            let (t, n) = (ix / b.num_envs, ix % b.num_envs);
            observations
                .row_mut(row)
                .assign(&b.observations.index_axis(Axis(0), t).row(n));
            states
                .row_mut(row)
                .assign(&b.states.index_axis(Axis(0), t).row(n));
            actions
                .row_mut(row)
                .assign(&b.actions.index_axis(Axis(0), t).row(n));
            returns[row] = b.returns[[t, n]];
            masks[row] = b.masks[[t, n]];
            old_log_probs[row] = b.log_probs[[t, n]];
            advantages[row] = self.advantages[[t, n]];
        }

        Some(Minibatch {
            observations,
            states,
            actions,
            returns,
            masks,
            old_log_probs,
            advantages,
        })
    }
}

/// One-shot iterator over environment-column minibatches.
///
/// Rows are time-major: for a group of `G` environments, row `t * G + g`
/// holds step `t` of the group's `g`-th environment, so every column's
/// rows appear in strictly increasing time order.
#[derive(Debug)]
pub struct RecurrentBatches<'a> {
    buffer: &'a RolloutBuffer,
    advantages: &'a Array2<f32>,
    envs: Vec<usize>,
    envs_per_batch: usize,
    cursor: usize,
}

impl<'a> Iterator for RecurrentBatches<'a> {
    type Item = Minibatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.envs.len() {
            return None;
        }
        let group = &self.envs[self.cursor..self.cursor + self.envs_per_batch];
        self.cursor += self.envs_per_batch;

        let b = self.buffer;
        let size = b.num_steps * group.len();
        let mut observations = Array2::zeros((size, b.obs_dim));
        let mut states = Array2::zeros((group.len(), b.state_dim));
        let mut actions = Array2::zeros((size, b.act_dim));
        let mut returns = Array1::zeros(size);
        let mut masks = Array1::zeros(size);
        let mut old_log_probs = Array1::zeros(size);
        let mut advantages = Array1::zeros(size);

        for (g, &n) in group.iter().enumerate() {
            states
                .row_mut(g)
                .assign(&b.states.index_axis(Axis(0), 0).row(n));
        }
        for t in 0..b.num_steps {
            for (g, &n) in group.iter().enumerate() {
                let row = t * group.len() + g;
                observations
                    .row_mut(row)
                    .assign(&b.observations.index_axis(Axis(0), t).row(n));
                actions
                    .row_mut(row)
                    .assign(&b.actions.index_axis(Axis(0), t).row(n));
                returns[row] = b.returns[[t, n]];
                masks[row] = b.masks[[t, n]];
                old_log_probs[row] = b.log_probs[[t, n]];
                advantages[row] = self.advantages[[t, n]];
            }
        }

        Some(Minibatch {
            observations,
            states,
            actions,
            returns,
            masks,
            old_log_probs,
            advantages,
        })
    }
}
