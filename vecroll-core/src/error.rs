//! Errors in the library.
use thiserror::Error;

/// Errors produced by this crate.
///
/// Configuration errors are raised before any transition is collected and
/// abort the run. Numerical failures (NaN or infinite losses) are never
/// wrapped in this type; they propagate through computed values unchanged.
#[derive(Debug, Error)]
pub enum VecrollError {
    /// The number of minibatches does not evenly divide the flattened
    /// transition count of one trajectory window.
    #[error(
        "number of minibatches ({num_mini_batch}) must evenly divide \
         the number of transitions per window ({total})"
    )]
    MinibatchCount {
        /// Transitions per window (`num_steps * num_envs`).
        total: usize,
        /// Requested number of minibatches.
        num_mini_batch: usize,
    },

    /// The number of minibatches does not evenly divide the number of
    /// environments, which sequential-chunk sampling requires.
    #[error(
        "number of minibatches ({num_mini_batch}) must evenly divide \
         the number of environments ({num_envs}) for recurrent sampling"
    )]
    EnvCount {
        /// Number of parallel environments.
        num_envs: usize,
        /// Requested number of minibatches.
        num_mini_batch: usize,
    },

    /// Recurrent policies are not supported by the natural-gradient
    /// algorithm.
    #[error("recurrent policies are not supported with the acktr algorithm")]
    RecurrentNotSupported,

    /// The stacked observation width is not a multiple of the frame count.
    #[error("observation dimension ({obs_dim}) must be a multiple of num_stack ({num_stack})")]
    ObsStack {
        /// Width of the stacked observation rows.
        obs_dim: usize,
        /// Number of stacked frames.
        num_stack: usize,
    },

    /// A record was queried with an unknown key.
    #[error("record key error: {0}")]
    RecordKeyError(String),

    /// A record value had a type other than the requested one.
    #[error("record value type error, expected {0}")]
    RecordValueTypeError(String),
}
