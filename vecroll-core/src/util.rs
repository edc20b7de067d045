//! Utilities.
use ndarray::{s, Array2, ArrayView1, ArrayView2};

/// Sliding stack of the most recent observation frames per environment.
///
/// Holds one row per environment of width `frame_dim * num_stack`; every
/// [`push`] shifts the window left by one frame and appends the new one.
/// When an episode ends, [`clear_finished`] zeroes the affected rows so
/// that no history from the previous episode leaks into the first stacked
/// observation of the next one. The continuation mask is the only signal
/// used for that decision.
///
/// [`push`]: FrameStack::push
/// [`clear_finished`]: FrameStack::clear_finished
#[derive(Debug, Clone)]
pub struct FrameStack {
    frame_dim: usize,
    num_stack: usize,
    current: Array2<f32>,
}

impl FrameStack {
    /// Constructs an empty stack for `num_envs` environments with frames
    /// of width `frame_dim`, keeping `num_stack` frames.
    pub fn new(num_envs: usize, frame_dim: usize, num_stack: usize) -> Self {
        Self {
            frame_dim,
            num_stack,
            current: Array2::zeros((num_envs, frame_dim * num_stack)),
        }
    }

    /// Width of one stacked observation row.
    pub fn obs_dim(&self) -> usize {
        self.frame_dim * self.num_stack
    }

    /// Zeroes the whole stack.
    pub fn reset(&mut self) {
        self.current.fill(0.);
    }

    /// Appends one frame per environment, shape `(num_envs, frame_dim)`.
    pub fn push(&mut self, obs: ArrayView2<f32>) {
        let total = self.obs_dim();
        if self.num_stack > 1 {
            let shifted = self.current.slice(s![.., self.frame_dim..]).to_owned();
            self.current
                .slice_mut(s![.., ..total - self.frame_dim])
                .assign(&shifted);
        }
        self.current
            .slice_mut(s![.., total - self.frame_dim..])
            .assign(&obs);
    }

    /// Zeroes the rows of environments whose continuation mask is 0.
    pub fn clear_finished(&mut self, masks: ArrayView1<f32>) {
        for (mut row, &m) in self.current.outer_iter_mut().zip(masks.iter()) {
            row.mapv_inplace(|v| v * m);
        }
    }

    /// The current stacked observations, `(num_envs, obs_dim)`.
    pub fn observation(&self) -> ArrayView2<f32> {
        self.current.view()
    }
}
