//! Bootstrapped return estimation.
use super::RolloutBuffer;
use ndarray::ArrayView1;

/// Computes bootstrapped multi-step returns for a completed window.
///
/// With `use_gae` unset the estimator produces the standard n-step return
/// with episode truncation:
///
/// ```text
/// R[T] = v_terminal
/// R[t] = r[t] + gamma * R[t+1] * mask[t+1]
/// ```
///
/// With `use_gae` set it accumulates a generalized advantage instead and
/// stores `R[t] = gae + v[t]`, where `tau` trades bias for variance:
/// `tau = 0` reduces to the one-step temporal difference, `tau = 1`
/// approaches the Monte-Carlo return.
///
/// All arithmetic is plain floating point. NaN and infinite inputs
/// propagate into the returns on purpose; they signal an upstream
/// numerical failure and must stay visible.
#[derive(Debug, Clone)]
pub struct ReturnEstimator {
    gamma: f32,
    tau: f32,
    use_gae: bool,
}

impl ReturnEstimator {
    /// Constructs an estimator with discount `gamma`, GAE parameter `tau`
    /// and estimation mode `use_gae`.
    pub fn new(gamma: f32, tau: f32, use_gae: bool) -> Self {
        Self {
            gamma,
            tau,
            use_gae,
        }
    }

    /// Overwrites the returns of `buffer` given the terminal value
    /// estimates for row `num_steps`, shape `(num_envs,)`.
    pub fn compute(&self, buffer: &mut RolloutBuffer, terminal_values: ArrayView1<f32>) {
        let (t_max, n_max) = (buffer.num_steps, buffer.num_envs);

        for n in 0..n_max {
            buffer.returns[[t_max, n]] = terminal_values[n];
        }

        if self.use_gae {
            for n in 0..n_max {
                let mut gae = 0.;
                for t in (0..t_max).rev() {
                    let next_value = if t + 1 == t_max {
                        terminal_values[n]
                    } else {
                        buffer.values[[t + 1, n]]
                    };
                    let mask = buffer.masks[[t + 1, n]];
                    let delta = buffer.rewards[[t, n]] + self.gamma * next_value * mask
                        - buffer.values[[t, n]];
                    gae = delta + self.gamma * self.tau * mask * gae;
                    buffer.returns[[t, n]] = gae + buffer.values[[t, n]];
                }
            }
        } else {
            for n in 0..n_max {
                for t in (0..t_max).rev() {
                    buffer.returns[[t, n]] = buffer.rewards[[t, n]]
                        + self.gamma * buffer.returns[[t + 1, n]] * buffer.masks[[t + 1, n]];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RolloutConfig;
    use ndarray::{arr1, Array1, Array2};

    fn filled_buffer(
        num_steps: usize,
        num_envs: usize,
        rewards: &[f32],
        values: &[f32],
        masks: &[f32],
    ) -> RolloutBuffer {
        let config = RolloutConfig::default()
            .num_steps(num_steps)
            .num_envs(num_envs)
            .obs_dim(1)
            .state_dim(1)
            .act_dim(1);
        let mut buffer = RolloutBuffer::build(&config);
        buffer.reset(Array2::zeros((num_envs, 1)).view());
        for t in 0..num_steps {
            let r: Array1<f32> = (0..num_envs).map(|n| rewards[t * num_envs + n]).collect();
            let v: Array1<f32> = (0..num_envs).map(|n| values[t * num_envs + n]).collect();
            let m: Array1<f32> = (0..num_envs)
                .map(|n| masks[(t + 1) * num_envs + n])
                .collect();
            buffer.insert(
                t,
                Array2::zeros((num_envs, 1)).view(),
                Array2::zeros((num_envs, 1)).view(),
                Array2::zeros((num_envs, 1)).view(),
                Array1::zeros(num_envs).view(),
                v.view(),
                r.view(),
                m.view(),
            );
        }
        buffer
    }

    #[test]
    fn nstep_returns_two_envs_constant_reward() {
        // T = 4, constant reward 1, no episode ends, zero terminal value.
        let g = 0.99f32;
        let mut buffer = filled_buffer(4, 2, &[1.0; 8], &[0.0; 8], &[1.0; 10]);
        ReturnEstimator::new(g, 0.95, false).compute(&mut buffer, arr1(&[0.0, 0.0]).view());

        let expected = [
            1.0 + g + g * g + g * g * g,
            1.0 + g + g * g,
            1.0 + g,
            1.0,
            0.0,
        ];
        for (t, e) in expected.iter().enumerate() {
            for n in 0..2 {
                assert!((buffer.returns()[[t, n]] - e).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn mask_breaks_bootstrap_chain() {
        // Episode ends between steps 2 and 3; the terminal value of 5 must
        // not leak across the boundary.
        let g = 0.9f32;
        let mut buffer = filled_buffer(4, 1, &[1.0; 4], &[0.0; 4], &[1.0, 1.0, 1.0, 0.0, 1.0]);
        ReturnEstimator::new(g, 0.95, false).compute(&mut buffer, arr1(&[5.0]).view());

        assert!((buffer.returns()[[3, 0]] - (1.0 + g * 5.0)).abs() < 1e-6);
        assert!((buffer.returns()[[2, 0]] - 1.0).abs() < 1e-6);
        assert!((buffer.returns()[[1, 0]] - (1.0 + g)).abs() < 1e-6);
        assert!((buffer.returns()[[0, 0]] - (1.0 + g * (1.0 + g))).abs() < 1e-6);
    }

    #[test]
    fn pre_boundary_returns_ignore_post_boundary_rewards() {
        let masks = [1.0, 1.0, 1.0, 0.0, 1.0];
        let mut a = filled_buffer(4, 1, &[1.0, 2.0, 3.0, 4.0], &[0.5; 4], &masks);
        let mut b = filled_buffer(4, 1, &[1.0, 2.0, 3.0, -7.0], &[0.5; 4], &masks);
        let est = ReturnEstimator::new(0.99, 0.95, true);
        est.compute(&mut a, arr1(&[2.0]).view());
        est.compute(&mut b, arr1(&[2.0]).view());

        // Steps 0..3 precede the boundary at row 3; perturbing the reward
        // behind it must not reach them.
        for t in 0..3 {
            assert_eq!(a.returns()[[t, 0]], b.returns()[[t, 0]]);
        }
        assert_ne!(a.returns()[[3, 0]], b.returns()[[3, 0]]);
    }

    #[test]
    fn gae_with_tau_one_matches_nstep_return() {
        let rewards = [0.3, -1.0, 2.0, 0.7, 0.1, 0.4];
        let values = [0.9, 0.2, -0.4, 1.1, 0.0, -0.2];
        let masks = [1.0; 8];

        let mut plain = filled_buffer(3, 2, &rewards, &values, &masks);
        let mut gae = filled_buffer(3, 2, &rewards, &values, &masks);
        let terminal = arr1(&[0.6, -0.3]);
        ReturnEstimator::new(0.99, 1.0, false).compute(&mut plain, terminal.view());
        ReturnEstimator::new(0.99, 1.0, true).compute(&mut gae, terminal.view());

        for t in 0..3 {
            for n in 0..2 {
                assert!((plain.returns()[[t, n]] - gae.returns()[[t, n]]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn nan_rewards_propagate() {
        let mut buffer = filled_buffer(2, 1, &[1.0, f32::NAN], &[0.0, 0.0], &[1.0; 3]);
        ReturnEstimator::new(0.99, 0.95, false).compute(&mut buffer, arr1(&[0.0]).view());
        assert!(buffer.returns()[[0, 0]].is_nan());
    }
}
