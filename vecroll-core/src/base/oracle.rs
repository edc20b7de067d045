//! Policy oracle.
use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Output of one action query for a batch of environments.
///
/// All rows are indexed by environment.
#[derive(Debug, Clone)]
pub struct PolicyOutput {
    /// Value estimates, shape `(num_envs,)`.
    pub values: Array1<f32>,

    /// Actions, shape `(num_envs, act_dim)`.
    pub actions: Array2<f32>,

    /// Log-probabilities of the sampled actions, shape `(num_envs,)`.
    pub log_probs: Array1<f32>,

    /// Recurrent states after the step, shape `(num_envs, state_dim)`.
    pub states: Array2<f32>,
}

/// Output of a gradient-tracked evaluation of stored actions.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Value estimates, one per evaluated transition.
    pub values: Array1<f32>,

    /// Log-probabilities of the given actions under the current parameters.
    pub log_probs: Array1<f32>,

    /// Mean entropy of the action distribution.
    pub entropy: f32,
}

/// How a scalar loss handed to [`PolicyOracle::backward_step`] is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackwardMode {
    /// Backpropagate and apply one parameter update, optionally clipping
    /// the global gradient norm beforehand.
    Step {
        /// Maximum gradient norm, or `None` to skip clipping.
        max_grad_norm: Option<f32>,
    },

    /// Backpropagate only to accumulate curvature statistics in the
    /// optimizer. Parameters must not change.
    AccumulateCurvature,
}

/// A trainable policy and value function with its optimizer.
///
/// The training core never inspects parameters or gradients; it queries
/// actions and evaluations and hands scalar losses back through
/// [`backward_step`]. Implementations are expected to retain whatever
/// internal state they need (e.g. the autodiff graph of the most recent
/// [`evaluate_actions`] call) to make the backward pass meaningful.
///
/// The mask argument of each query is the continuation mask of the queried
/// rows: a zero marks an environment whose episode ended on the previous
/// step, and implementations carrying recurrent state must clear that
/// environment's history before evaluating.
///
/// [`backward_step`]: PolicyOracle::backward_step
/// [`evaluate_actions`]: PolicyOracle::evaluate_actions
pub trait PolicyOracle {
    /// Sample actions for a batch of observations. No gradient tracking
    /// is required.
    fn act(
        &mut self,
        observations: ArrayView2<f32>,
        states: ArrayView2<f32>,
        masks: ArrayView1<f32>,
    ) -> Result<PolicyOutput>;

    /// Value estimates for a batch of observations, used for the terminal
    /// bootstrap. No gradient tracking is required.
    fn value(
        &mut self,
        observations: ArrayView2<f32>,
        states: ArrayView2<f32>,
        masks: ArrayView1<f32>,
    ) -> Result<Array1<f32>>;

    /// Evaluate previously taken actions under the current parameters,
    /// with gradient tracking.
    ///
    /// `states` holds one row per trajectory being evaluated (the state at
    /// its first step); when `observations` has more rows than `states`,
    /// the implementor recomputes intermediate states by unrolling in
    /// temporal order.
    fn evaluate_actions(
        &mut self,
        observations: ArrayView2<f32>,
        states: ArrayView2<f32>,
        masks: ArrayView1<f32>,
        actions: ArrayView2<f32>,
    ) -> Result<Evaluation>;

    /// Clear accumulated gradients.
    fn zero_grad(&mut self);

    /// Backpropagate the given scalar loss according to `mode`.
    fn backward_step(&mut self, loss: f32, mode: BackwardMode) -> Result<()>;
}
