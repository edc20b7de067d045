//! Train loop for on-policy actor-critic algorithms.
mod config;
mod episode;
mod loss;

pub use config::{Algorithm, TrainerConfig};
pub use episode::EpisodeStats;

use crate::{
    base::{BackwardMode, Checkpointer, PolicyOracle, VecEnv},
    buffer::{Minibatch, ReturnEstimator, RolloutBuffer, RolloutConfig},
    error::VecrollError,
    record::{Record, RecordValue, Recorder},
    util::FrameStack,
};
use anyhow::{ensure, Result};
use log::info;
use ndarray::Array1;
use rand::{rngs::StdRng, SeedableRng};
use std::time::Instant;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Orchestrates synchronous on-policy training.
///
/// Each update runs the same four phases regardless of the configured
/// [`Algorithm`]:
///
/// ```mermaid
/// flowchart TB
///   A(Collect a window of transitions)-->B(Bootstrap returns)
///   B-->C(Optimize)
///   C-->D(Roll the window over)
///   D-->A
/// ```
///
/// Collection queries the [`PolicyOracle`] once per step, advances the
/// [`VecEnv`] and records the transition in a [`RolloutBuffer`]. The
/// return phase asks the oracle for terminal value estimates and runs the
/// [`ReturnEstimator`]. The optimization phase depends on the algorithm:
/// A2C and ACKTR take one whole-window gradient step, PPO re-evaluates
/// shuffled minibatches for several epochs. Rollover carries the last
/// observation, state and mask rows into the next window.
pub struct Trainer {
    config: TrainerConfig,
    buffer: RolloutBuffer,
    stack: FrameStack,
    estimator: ReturnEstimator,
    rng: StdRng,
    best_return: f32,
    opt_steps: usize,
}

impl Trainer {
    /// Builds a trainer, checking the configuration against the window
    /// geometry. `rollout_config.obs_dim` is the stacked width and must be
    /// a multiple of `config.num_stack`.
    pub fn build(config: TrainerConfig, rollout_config: RolloutConfig) -> Result<Self> {
        config.validate(rollout_config.num_steps, rollout_config.num_envs)?;
        if config.num_stack == 0 || rollout_config.obs_dim % config.num_stack != 0 {
            return Err(VecrollError::ObsStack {
                obs_dim: rollout_config.obs_dim,
                num_stack: config.num_stack,
            }
            .into());
        }
        let stack = FrameStack::new(
            rollout_config.num_envs,
            rollout_config.obs_dim / config.num_stack,
            config.num_stack,
        );
        let estimator = ReturnEstimator::new(config.gamma, config.tau, config.use_gae);
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            buffer: RolloutBuffer::build(&rollout_config),
            stack,
            estimator,
            rng,
            config,
            best_return: f32::NEG_INFINITY,
            opt_steps: 0,
        })
    }

    /// The trajectory window.
    pub fn buffer(&self) -> &RolloutBuffer {
        &self.buffer
    }

    /// Mean return of the best update seen so far.
    pub fn best_return(&self) -> f32 {
        self.best_return
    }

    /// Collects one window of transitions.
    fn collect<O, E>(&mut self, oracle: &mut O, env: &mut E, stats: &mut EpisodeStats) -> Result<Record>
    where
        O: PolicyOracle,
        E: VecEnv,
    {
        let mut record = Record::empty();
        for t in 0..self.buffer.num_steps() {
            let out = oracle.act(
                self.buffer.observation_row(t),
                self.buffer.state_row(t),
                self.buffer.mask_row(t),
            )?;
            let step = env.step(out.actions.view())?;
            let masks: Array1<f32> = step
                .dones
                .iter()
                .map(|&done| if done { 0. } else { 1. })
                .collect();
            stats.observe(step.rewards.view(), masks.view());
            self.stack.clear_finished(masks.view());
            self.stack.push(step.obs.view());
            self.buffer.insert(
                t,
                self.stack.observation(),
                out.states.view(),
                out.actions.view(),
                out.log_probs.view(),
                out.values.view(),
                step.rewards.view(),
                masks.view(),
            );
            record = record.merge(step.record);
        }
        Ok(record)
    }

    /// One whole-window first-order update, shared by A2C and ACKTR.
    ///
    /// With `natural_gradient` set, a curvature-accumulation backward pass
    /// precedes the step whenever the refresh interval elapses, and the
    /// step itself runs without gradient clipping.
    fn optimize_whole<O>(&mut self, oracle: &mut O, natural_gradient: bool) -> Result<(f32, f32)>
    where
        O: PolicyOracle,
    {
        let observations = self.buffer.flat_observations();
        let states = self.buffer.state_row(0).to_owned();
        let masks = self.buffer.flat_masks();
        let actions = self.buffer.flat_actions();
        let eval = oracle.evaluate_actions(
            observations.view(),
            states.view(),
            masks.view(),
            actions.view(),
        )?;

        let returns = self.buffer.flat_returns();
        let advantages = &returns - &eval.values;
        let value_loss = loss::value_loss(&returns, &eval.values);
        let policy_loss = loss::policy_loss(&advantages, &eval.log_probs);

        if natural_gradient
            && self.config.fisher_interval > 0
            && self.opt_steps % self.config.fisher_interval == 0
        {
            let fisher = loss::fisher_loss(&eval.values, &eval.log_probs, &mut self.rng)?;
            oracle.zero_grad();
            oracle.backward_step(fisher, BackwardMode::AccumulateCurvature)?;
        }

        let total = value_loss * self.config.value_loss_coef + policy_loss
            - eval.entropy * self.config.entropy_coef;
        let max_grad_norm = if natural_gradient {
            None
        } else {
            Some(self.config.max_grad_norm)
        };
        oracle.zero_grad();
        oracle.backward_step(total, BackwardMode::Step { max_grad_norm })?;
        self.opt_steps += 1;
        Ok((value_loss, policy_loss))
    }

    /// Several epochs of clipped-surrogate minibatch updates.
    fn optimize_ppo<O>(&mut self, oracle: &mut O) -> Result<(f32, f32)>
    where
        O: PolicyOracle,
    {
        let advantages = loss::standardize(&self.buffer.advantages(), self.config.adv_eps);
        let mut value_loss_sum = 0.;
        let mut policy_loss_sum = 0.;
        let mut batches = 0;
        for _ in 0..self.config.ppo_epochs {
            if self.config.recurrent {
                for batch in self
                    .buffer
                    .recurrent_batches(&advantages, self.config.num_mini_batch)?
                {
                    let (vl, pl) = Self::minibatch_step(&self.config, oracle, &batch)?;
                    value_loss_sum += vl;
                    policy_loss_sum += pl;
                    batches += 1;
                }
            } else {
                for batch in self
                    .buffer
                    .feed_forward_batches(&advantages, self.config.num_mini_batch)?
                {
                    let (vl, pl) = Self::minibatch_step(&self.config, oracle, &batch)?;
                    value_loss_sum += vl;
                    policy_loss_sum += pl;
                    batches += 1;
                }
            }
        }
        self.opt_steps += batches;
        Ok((
            value_loss_sum / batches as f32,
            policy_loss_sum / batches as f32,
        ))
    }

    /// One re-evaluation and optimizer step on a single minibatch.
    fn minibatch_step<O>(
        config: &TrainerConfig,
        oracle: &mut O,
        batch: &Minibatch,
    ) -> Result<(f32, f32)>
    where
        O: PolicyOracle,
    {
        let eval = oracle.evaluate_actions(
            batch.observations.view(),
            batch.states.view(),
            batch.masks.view(),
            batch.actions.view(),
        )?;
        let value_loss = loss::value_loss(&batch.returns, &eval.values);
        let action_loss = loss::clip_loss(
            &eval.log_probs,
            &batch.old_log_probs,
            &batch.advantages,
            config.clip_param,
        );
        let total = value_loss + action_loss - eval.entropy * config.entropy_coef;
        oracle.zero_grad();
        oracle.backward_step(
            total,
            BackwardMode::Step {
                max_grad_norm: Some(config.max_grad_norm),
            },
        )?;
        Ok((value_loss, action_loss))
    }

    /// Runs one full update cycle: collect, bootstrap, optimize, rollover.
    ///
    /// The window must have been initialized by [`train`](Trainer::train)
    /// or by resetting the buffer with fresh observations.
    pub fn update<O, E>(
        &mut self,
        oracle: &mut O,
        env: &mut E,
        stats: &mut EpisodeStats,
    ) -> Result<Record>
    where
        O: PolicyOracle,
        E: VecEnv,
    {
        let mut record = self.collect(oracle, env, stats)?;

        let terminal_values = {
            let t = self.buffer.num_steps();
            oracle.value(
                self.buffer.observation_row(t),
                self.buffer.state_row(t),
                self.buffer.mask_row(t),
            )?
        };
        self.estimator
            .compute(&mut self.buffer, terminal_values.view());

        let (value_loss, policy_loss) = match self.config.algorithm {
            Algorithm::A2c => self.optimize_whole(oracle, false)?,
            Algorithm::Acktr => self.optimize_whole(oracle, true)?,
            Algorithm::Ppo => self.optimize_ppo(oracle)?,
        };

        self.buffer.rollover();

        record.insert("loss_value", RecordValue::Scalar(value_loss));
        record.insert("loss_policy", RecordValue::Scalar(policy_loss));
        record.insert("opt_steps", RecordValue::Scalar(self.opt_steps as f32));
        Ok(record)
    }

    /// Runs `num_updates` update cycles.
    ///
    /// Every update emits one [`Record`] with the losses and episode
    /// return statistics. Whenever the mean of the latest completed
    /// episode returns improves on the best seen so far, the
    /// [`Checkpointer`] is asked to save.
    pub fn train<O, E, C>(
        &mut self,
        oracle: &mut O,
        env: &mut E,
        recorder: &mut dyn Recorder,
        checkpointer: &mut C,
    ) -> Result<()>
    where
        O: PolicyOracle,
        E: VecEnv,
        C: Checkpointer<O>,
    {
        ensure!(
            env.num_envs() == self.buffer.num_envs(),
            "environment batch of {} does not match window of {} environments",
            env.num_envs(),
            self.buffer.num_envs()
        );

        let obs = env.reset()?;
        self.stack.reset();
        self.stack.push(obs.view());
        self.buffer.reset(self.stack.observation());
        let mut stats = EpisodeStats::new(self.buffer.num_envs());
        let steps_per_update = self.buffer.len();
        let start = Instant::now();

        for update in 0..self.config.num_updates {
            let mut record = self.update(oracle, env, &mut stats)?;

            let mean_return = stats.mean_finished();
            if mean_return > self.best_return {
                self.best_return = mean_return;
                checkpointer.save_best(oracle, self.best_return)?;
            }

            let env_steps = (update + 1) * steps_per_update;
            record.insert("env_steps", RecordValue::Scalar(env_steps as f32));
            record.insert("mean_return", RecordValue::Scalar(mean_return));
            record.insert("best_return", RecordValue::Scalar(self.best_return));
            record.insert(
                "episode_return",
                RecordValue::Array1(stats.finished().to_vec()),
            );

            if self.config.log_interval > 0 && update % self.config.log_interval == 0 {
                let fps = env_steps as f32 / start.elapsed().as_secs_f32();
                info!(
                    "{} update {}, env steps {}, {:.0} steps/s, mean return {:.2}, best {:.2}, \
                     value loss {:.4}, policy loss {:.4}",
                    self.config.algorithm,
                    update,
                    env_steps,
                    fps,
                    mean_return,
                    self.best_return,
                    record.get_scalar("loss_value").unwrap_or(f32::NAN),
                    record.get_scalar("loss_policy").unwrap_or(f32::NAN),
                );
            }

            recorder.write(record);
        }
        Ok(())
    }
}
