//! Per-environment episode return bookkeeping.
use ndarray::{Array1, ArrayView1};

/// Tracks episode returns across window boundaries.
///
/// `running` accumulates the rewards of the episode currently in progress
/// in each environment; whenever an episode ends its total moves into
/// `finished` and the accumulator restarts at zero. `finished` therefore
/// always holds the return of the most recently completed episode per
/// environment, 0 until the first one completes.
#[derive(Debug, Clone)]
pub struct EpisodeStats {
    running: Array1<f32>,
    finished: Array1<f32>,
}

impl EpisodeStats {
    /// Constructs zeroed statistics for `num_envs` environments.
    pub fn new(num_envs: usize) -> Self {
        Self {
            running: Array1::zeros(num_envs),
            finished: Array1::zeros(num_envs),
        }
    }

    /// Folds in one step of rewards and continuation masks.
    pub fn observe(&mut self, rewards: ArrayView1<f32>, masks: ArrayView1<f32>) {
        self.running += &rewards;
        for n in 0..self.running.len() {
            let m = masks[n];
            self.finished[n] = self.finished[n] * m + (1. - m) * self.running[n];
            self.running[n] *= m;
        }
    }

    /// Return of the most recently completed episode per environment.
    pub fn finished(&self) -> ArrayView1<f32> {
        self.finished.view()
    }

    /// Mean over [`finished`](EpisodeStats::finished).
    pub fn mean_finished(&self) -> f32 {
        self.finished.mean().unwrap_or(0.)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn episode_end_moves_running_total() {
        let mut stats = EpisodeStats::new(2);
        stats.observe(arr1(&[1.0, 2.0]).view(), arr1(&[1.0, 1.0]).view());
        stats.observe(arr1(&[1.0, 3.0]).view(), arr1(&[0.0, 1.0]).view());

        // Env 0 finished with a return of 2; env 1 is still running.
        assert_eq!(stats.finished(), arr1(&[2.0, 0.0]).view());
        assert_eq!(stats.mean_finished(), 1.0);
    }

    #[test]
    fn accumulator_restarts_after_episode_end() {
        let mut stats = EpisodeStats::new(1);
        stats.observe(arr1(&[3.0]).view(), arr1(&[0.0]).view());
        stats.observe(arr1(&[1.0]).view(), arr1(&[1.0]).view());
        stats.observe(arr1(&[1.0]).view(), arr1(&[0.0]).view());

        // The second episode's return must not include the first one's.
        assert_eq!(stats.finished(), arr1(&[2.0]).view());
    }

    #[test]
    fn finished_keeps_last_value_while_running() {
        let mut stats = EpisodeStats::new(1);
        stats.observe(arr1(&[5.0]).view(), arr1(&[0.0]).view());
        stats.observe(arr1(&[1.0]).view(), arr1(&[1.0]).view());
        assert_eq!(stats.finished()[0], 5.0);
    }
}
