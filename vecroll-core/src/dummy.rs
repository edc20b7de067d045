//! Deterministic stubs of the external collaborators, used in tests.
use crate::{
    base::{BackwardMode, EnvStep, Evaluation, PolicyOracle, PolicyOutput, VecEnv},
    record::Record,
};
use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// A policy oracle with fixed outputs that records every optimizer call.
pub struct DummyOracle {
    act_dim: usize,
    /// Constant value estimate returned for every row.
    pub value: f32,
    /// Constant log-probability returned for every row.
    pub log_prob: f32,
    /// Losses handed to [`PolicyOracle::backward_step`], in call order.
    pub backward_calls: Vec<(f32, BackwardMode)>,
    /// Number of [`PolicyOracle::zero_grad`] calls.
    pub zero_grad_calls: usize,
}

impl DummyOracle {
    /// Constructs the oracle.
    pub fn new(act_dim: usize) -> Self {
        Self {
            act_dim,
            value: 0.5,
            log_prob: -0.1,
            backward_calls: Vec::new(),
            zero_grad_calls: 0,
        }
    }
}

impl PolicyOracle for DummyOracle {
    fn act(
        &mut self,
        observations: ArrayView2<f32>,
        states: ArrayView2<f32>,
        _masks: ArrayView1<f32>,
    ) -> Result<PolicyOutput> {
        let n = observations.nrows();
        Ok(PolicyOutput {
            values: Array1::from_elem(n, self.value),
            actions: Array2::zeros((n, self.act_dim)),
            log_probs: Array1::from_elem(n, self.log_prob),
            states: &states + 1.0,
        })
    }

    fn value(
        &mut self,
        observations: ArrayView2<f32>,
        _states: ArrayView2<f32>,
        _masks: ArrayView1<f32>,
    ) -> Result<Array1<f32>> {
        Ok(Array1::from_elem(observations.nrows(), self.value))
    }

    fn evaluate_actions(
        &mut self,
        observations: ArrayView2<f32>,
        _states: ArrayView2<f32>,
        _masks: ArrayView1<f32>,
        _actions: ArrayView2<f32>,
    ) -> Result<Evaluation> {
        let n = observations.nrows();
        Ok(Evaluation {
            values: Array1::from_elem(n, self.value),
            log_probs: Array1::from_elem(n, self.log_prob),
            entropy: 1.0,
        })
    }

    fn zero_grad(&mut self) {
        self.zero_grad_calls += 1;
    }

    fn backward_step(&mut self, loss: f32, mode: BackwardMode) -> Result<()> {
        self.backward_calls.push((loss, mode));
        Ok(())
    }
}

/// A batch of environments paying reward 1 every step, with episodes of a
/// fixed length shared by all environments.
pub struct DummyVecEnv {
    num_envs: usize,
    obs_dim: usize,
    episode_len: usize,
    steps: usize,
}

impl DummyVecEnv {
    /// Constructs the environment batch.
    pub fn new(num_envs: usize, obs_dim: usize, episode_len: usize) -> Self {
        Self {
            num_envs,
            obs_dim,
            episode_len,
            steps: 0,
        }
    }

    fn observe(&self) -> Array2<f32> {
        Array2::from_elem((self.num_envs, self.obs_dim), self.steps as f32)
    }
}

impl VecEnv for DummyVecEnv {
    fn num_envs(&self) -> usize {
        self.num_envs
    }

    fn reset(&mut self) -> Result<Array2<f32>> {
        self.steps = 0;
        Ok(self.observe())
    }

    fn step(&mut self, _actions: ArrayView2<f32>) -> Result<EnvStep> {
        self.steps += 1;
        let done = self.steps % self.episode_len == 0;
        Ok(EnvStep {
            obs: self.observe(),
            rewards: Array1::ones(self.num_envs),
            dones: vec![done; self.num_envs],
            record: Record::empty(),
        })
    }
}
