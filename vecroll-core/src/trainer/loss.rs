//! Scalar training objectives.
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Shifts and scales advantages to zero mean and unit variance. `eps` is
/// added to the standard deviation to keep a constant window finite.
pub(super) fn standardize(advantages: &Array2<f32>, eps: f32) -> Array2<f32> {
    let mean = advantages.mean().unwrap_or(0.);
    let std = advantages.std(1.);
    advantages.mapv(|a| (a - mean) / (std + eps))
}

/// Mean squared error between return targets and value predictions.
pub(super) fn value_loss(returns: &Array1<f32>, values: &Array1<f32>) -> f32 {
    (returns - values).mapv(|d| d * d).mean().unwrap_or(0.)
}

/// Vanilla policy gradient surrogate, `-mean(advantage * log_prob)`.
pub(super) fn policy_loss(advantages: &Array1<f32>, log_probs: &Array1<f32>) -> f32 {
    -(advantages * log_probs).mean().unwrap_or(0.)
}

/// Clipped probability-ratio surrogate.
///
/// For each transition the ratio `exp(log_prob - old_log_prob)` scales the
/// advantage twice, once raw and once clamped to
/// `[1 - clip_param, 1 + clip_param]`; the pessimistic (smaller) of the
/// two is kept and the negated mean is returned.
pub(super) fn clip_loss(
    log_probs: &Array1<f32>,
    old_log_probs: &Array1<f32>,
    advantages: &Array1<f32>,
    clip_param: f32,
) -> f32 {
    let mut total = 0.;
    for ((&lp, &old), &adv) in log_probs.iter().zip(old_log_probs.iter()).zip(advantages) {
        let ratio = (lp - old).exp();
        let clamped = ratio.max(1. - clip_param).min(1. + clip_param);
        total += (ratio * adv).min(clamped * adv);
    }
    -total / log_probs.len() as f32
}

/// Fisher-matching objective for curvature accumulation.
///
/// The policy part is the negated mean log probability of the sampled
/// actions. The value part treats the value head as a Gaussian whose
/// targets are the current predictions perturbed by noise with the same
/// standard deviation as the predictions themselves.
pub(super) fn fisher_loss(
    values: &Array1<f32>,
    log_probs: &Array1<f32>,
    rng: &mut StdRng,
) -> anyhow::Result<f32> {
    let pg_fisher = -log_probs.mean().unwrap_or(0.);
    let noise = Normal::new(0., values.std(0.))?;
    let vf_fisher = -values
        .iter()
        .map(|_| {
            let z: f32 = noise.sample(rng);
            z * z
        })
        .sum::<f32>()
        / values.len() as f32;
    Ok(pg_fisher + vf_fisher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};
    use rand::SeedableRng;

    #[test]
    fn standardize_centers_and_scales() {
        let adv = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let out = standardize(&adv, 0.0);
        assert!(out.mean().unwrap().abs() < 1e-6);
        assert!((out.std(1.) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn standardize_eps_keeps_constant_window_finite() {
        let adv = arr2(&[[2.0, 2.0], [2.0, 2.0]]);
        let out = standardize(&adv, 1e-5);
        assert!(out.iter().all(|v| v.is_finite()));
        assert_eq!(out, arr2(&[[0.0, 0.0], [0.0, 0.0]]));
    }

    #[test]
    fn unit_ratio_reduces_to_plain_surrogate() {
        let lp = arr1(&[-0.3, -1.0, -0.1]);
        let adv = arr1(&[1.0, -2.0, 0.5]);
        let loss = clip_loss(&lp, &lp, &adv, 0.2);
        assert!((loss - policy_loss(&adv, &Array1::ones(3))).abs() < 1e-6);
    }

    #[test]
    fn clip_caps_the_ratio() {
        // Ratio 2 with a positive advantage is clamped to 1 + clip.
        let old = arr1(&[0.0]);
        let new = arr1(&[2.0f32.ln()]);
        let adv = arr1(&[1.0]);
        let loss = clip_loss(&new, &old, &adv, 0.2);
        assert!((loss + 1.2).abs() < 1e-6);

        // A negative advantage keeps the pessimistic unclipped term.
        let adv = arr1(&[-1.0]);
        let loss = clip_loss(&new, &old, &adv, 0.2);
        assert!((loss - 2.0).abs() < 1e-6);
    }

    #[test]
    fn value_loss_is_mean_squared_error() {
        let returns = arr1(&[1.0, 2.0]);
        let values = arr1(&[0.0, 4.0]);
        assert!((value_loss(&returns, &values) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn fisher_loss_is_finite_for_constant_values() {
        // Zero spread in the predictions gives zero-variance noise.
        let values = arr1(&[0.5, 0.5, 0.5]);
        let log_probs = arr1(&[-0.1, -0.2, -0.3]);
        let mut rng = StdRng::seed_from_u64(0);
        let loss = fisher_loss(&values, &log_probs, &mut rng).unwrap();
        assert!((loss - 0.2).abs() < 1e-6);
    }
}
