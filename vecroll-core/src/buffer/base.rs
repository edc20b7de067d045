//! Storage of one trajectory window.
use super::RolloutConfig;
use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2};
use rand::{rngs::StdRng, SeedableRng};

/// Fixed-capacity store of one trajectory window.
///
/// The window covers `num_steps` transitions of `num_envs` parallel
/// environments. Observation, recurrent state and continuation mask arrays
/// have `num_steps + 1` rows: row 0 carries over the end of the previous
/// window, and row `t + 1` is written together with the action, log
/// probability, value estimate and reward of step `t`.
///
/// A mask element of 0 at row `t + 1` marks an environment whose episode
/// ended on step `t`; return computation and recurrent evaluation must not
/// carry history across such a row.
#[derive(Debug)]
pub struct RolloutBuffer {
    pub(super) num_steps: usize,
    pub(super) num_envs: usize,
    pub(super) obs_dim: usize,
    pub(super) state_dim: usize,
    pub(super) act_dim: usize,

    /// Observations, `(num_steps + 1, num_envs, obs_dim)`.
    pub(super) observations: Array3<f32>,

    /// Recurrent states, `(num_steps + 1, num_envs, state_dim)`.
    pub(super) states: Array3<f32>,

    /// Continuation masks, `(num_steps + 1, num_envs)`.
    pub(super) masks: Array2<f32>,

    /// Actions, `(num_steps, num_envs, act_dim)`.
    pub(super) actions: Array3<f32>,

    /// Behavior-policy log probabilities, `(num_steps, num_envs)`.
    pub(super) log_probs: Array2<f32>,

    /// Value estimates, `(num_steps, num_envs)`.
    pub(super) values: Array2<f32>,

    /// Rewards, `(num_steps, num_envs)`.
    pub(super) rewards: Array2<f32>,

    /// Bootstrapped returns, `(num_steps + 1, num_envs)`. The last row is
    /// the terminal bootstrap value.
    pub(super) returns: Array2<f32>,

    pub(super) rng: StdRng,
}

impl RolloutBuffer {
    /// Builds an empty buffer from the given configuration.
    pub fn build(config: &RolloutConfig) -> Self {
        let (t, n) = (config.num_steps, config.num_envs);
        Self {
            num_steps: t,
            num_envs: n,
            obs_dim: config.obs_dim,
            state_dim: config.state_dim,
            act_dim: config.act_dim,
            observations: Array3::zeros((t + 1, n, config.obs_dim)),
            states: Array3::zeros((t + 1, n, config.state_dim)),
            masks: Array2::zeros((t + 1, n)),
            actions: Array3::zeros((t, n, config.act_dim)),
            log_probs: Array2::zeros((t, n)),
            values: Array2::zeros((t, n)),
            rewards: Array2::zeros((t, n)),
            returns: Array2::zeros((t + 1, n)),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Number of steps per window.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Number of parallel environments.
    pub fn num_envs(&self) -> usize {
        self.num_envs
    }

    /// Number of transitions per window.
    pub fn len(&self) -> usize {
        self.num_steps * self.num_envs
    }

    /// Returns `true` if the window holds no transitions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Initializes the window with the observations of freshly reset
    /// environments. All other rows are zeroed.
    pub fn reset(&mut self, obs: ArrayView2<f32>) {
        self.observations.fill(0.);
        self.states.fill(0.);
        self.masks.fill(0.);
        self.actions.fill(0.);
        self.log_probs.fill(0.);
        self.values.fill(0.);
        self.rewards.fill(0.);
        self.returns.fill(0.);
        self.observations.slice_mut(s![0, .., ..]).assign(&obs);
    }

    /// Writes the results of step `t`: observation, state and mask at row
    /// `t + 1`, the rest at row `t`.
    ///
    /// Panics if `t >= num_steps`.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        t: usize,
        obs: ArrayView2<f32>,
        state: ArrayView2<f32>,
        action: ArrayView2<f32>,
        log_prob: ArrayView1<f32>,
        value: ArrayView1<f32>,
        reward: ArrayView1<f32>,
        mask: ArrayView1<f32>,
    ) {
        assert!(
            t < self.num_steps,
            "step index {} out of window of {} steps",
            t,
            self.num_steps
        );
        self.observations.slice_mut(s![t + 1, .., ..]).assign(&obs);
        self.states.slice_mut(s![t + 1, .., ..]).assign(&state);
        self.masks.slice_mut(s![t + 1, ..]).assign(&mask);
        self.actions.slice_mut(s![t, .., ..]).assign(&action);
        self.log_probs.slice_mut(s![t, ..]).assign(&log_prob);
        self.values.slice_mut(s![t, ..]).assign(&value);
        self.rewards.slice_mut(s![t, ..]).assign(&reward);
    }

    /// Copies the last observation, state and mask rows into row 0,
    /// starting the next window. The remaining rows are stale until
    /// overwritten.
    pub fn rollover(&mut self) {
        let t = self.num_steps;
        let obs = self.observations.slice(s![t, .., ..]).to_owned();
        let state = self.states.slice(s![t, .., ..]).to_owned();
        let mask = self.masks.slice(s![t, ..]).to_owned();
        self.observations.slice_mut(s![0, .., ..]).assign(&obs);
        self.states.slice_mut(s![0, .., ..]).assign(&state);
        self.masks.slice_mut(s![0, ..]).assign(&mask);
    }

    /// Observation rows of step `t`, shape `(num_envs, obs_dim)`.
    pub fn observation_row(&self, t: usize) -> ArrayView2<f32> {
        self.observations.slice(s![t, .., ..])
    }

    /// Recurrent state rows of step `t`, shape `(num_envs, state_dim)`.
    pub fn state_row(&self, t: usize) -> ArrayView2<f32> {
        self.states.slice(s![t, .., ..])
    }

    /// Continuation mask row of step `t`, shape `(num_envs,)`.
    pub fn mask_row(&self, t: usize) -> ArrayView1<f32> {
        self.masks.slice(s![t, ..])
    }

    /// The computed returns, `(num_steps + 1, num_envs)`.
    pub fn returns(&self) -> &Array2<f32> {
        &self.returns
    }

    /// Advantages of the window, `returns - values`, shape
    /// `(num_steps, num_envs)`.
    pub fn advantages(&self) -> Array2<f32> {
        let ret = self.returns.slice(s![..self.num_steps, ..]);
        &ret - &self.values
    }

    /// Observations of steps `0..num_steps` flattened to
    /// `(num_steps * num_envs, obs_dim)`, step-major.
    pub fn flat_observations(&self) -> Array2<f32> {
        self.observations
            .slice(s![..self.num_steps, .., ..])
            .to_owned()
            .into_shape((self.len(), self.obs_dim))
            .expect("window rows are contiguous")
    }

    /// Actions flattened to `(num_steps * num_envs, act_dim)`, step-major.
    pub fn flat_actions(&self) -> Array2<f32> {
        self.actions
            .to_owned()
            .into_shape((self.len(), self.act_dim))
            .expect("window rows are contiguous")
    }

    /// Masks of steps `0..num_steps` flattened to
    /// `(num_steps * num_envs,)`, step-major.
    pub fn flat_masks(&self) -> Array1<f32> {
        self.masks
            .slice(s![..self.num_steps, ..])
            .to_owned()
            .into_shape(self.len())
            .expect("window rows are contiguous")
    }

    /// Returns of steps `0..num_steps` flattened to
    /// `(num_steps * num_envs,)`, step-major.
    pub fn flat_returns(&self) -> Array1<f32> {
        self.returns
            .slice(s![..self.num_steps, ..])
            .to_owned()
            .into_shape(self.len())
            .expect("window rows are contiguous")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array2};

    fn buffer_2x2() -> RolloutBuffer {
        let config = RolloutConfig::default()
            .num_steps(2)
            .num_envs(2)
            .obs_dim(2)
            .state_dim(1)
            .act_dim(1);
        RolloutBuffer::build(&config)
    }

    fn insert_step(buffer: &mut RolloutBuffer, t: usize, mask: [f32; 2]) {
        let base = 10.0 * (t as f32 + 1.0);
        buffer.insert(
            t,
            arr2(&[[base, base + 1.0], [base + 2.0, base + 3.0]]).view(),
            arr2(&[[base], [base + 0.5]]).view(),
            arr2(&[[1.0], [0.0]]).view(),
            arr1(&[-0.5, -0.7]).view(),
            arr1(&[0.3, 0.4]).view(),
            arr1(&[1.0, 1.0]).view(),
            arr1(&mask).view(),
        );
    }

    #[test]
    fn reset_sets_first_row_only() {
        let mut buffer = buffer_2x2();
        let obs = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        buffer.reset(obs.view());

        assert_eq!(buffer.observation_row(0), obs.view());
        assert_eq!(buffer.observation_row(1), Array2::<f32>::zeros((2, 2)).view());
        assert_eq!(buffer.mask_row(0), arr1(&[0.0, 0.0]).view());
    }

    #[test]
    fn insert_writes_shifted_rows() {
        let mut buffer = buffer_2x2();
        buffer.reset(arr2(&[[0.0, 0.0], [0.0, 0.0]]).view());
        insert_step(&mut buffer, 0, [1.0, 0.0]);

        assert_eq!(buffer.observation_row(1)[[0, 0]], 10.0);
        assert_eq!(buffer.mask_row(1), arr1(&[1.0, 0.0]).view());
        assert_eq!(buffer.rewards[[0, 0]], 1.0);
        assert_eq!(buffer.values[[0, 1]], 0.4);
    }

    #[test]
    #[should_panic(expected = "out of window")]
    fn insert_rejects_out_of_window_step() {
        let mut buffer = buffer_2x2();
        insert_step(&mut buffer, 2, [1.0, 1.0]);
    }

    #[test]
    fn rollover_copies_last_row_exactly() {
        let mut buffer = buffer_2x2();
        buffer.reset(arr2(&[[1.0, 2.0], [3.0, 4.0]]).view());
        insert_step(&mut buffer, 0, [1.0, 1.0]);
        insert_step(&mut buffer, 1, [0.0, 1.0]);

        let last_obs = buffer.observation_row(2).to_owned();
        let last_state = buffer.state_row(2).to_owned();
        let last_mask = buffer.mask_row(2).to_owned();
        buffer.rollover();

        assert_eq!(buffer.observation_row(0), last_obs.view());
        assert_eq!(buffer.state_row(0), last_state.view());
        assert_eq!(buffer.mask_row(0), last_mask.view());
    }

    #[test]
    fn flat_views_are_step_major() {
        let mut buffer = buffer_2x2();
        buffer.reset(arr2(&[[0.0, 0.0], [0.0, 0.0]]).view());
        insert_step(&mut buffer, 0, [1.0, 1.0]);
        insert_step(&mut buffer, 1, [1.0, 1.0]);

        let obs = buffer.flat_observations();
        assert_eq!(obs.shape(), &[4, 2]);
        // Row t * num_envs + n holds environment n at step t.
        assert_eq!(obs[[0, 0]], 0.0); // step 0 is the reset row
        assert_eq!(obs[[2, 0]], 10.0); // step 1, env 0
        assert_eq!(obs[[3, 0]], 12.0); // step 1, env 1
    }
}
