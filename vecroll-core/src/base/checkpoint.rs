//! Checkpointing boundary.
use super::PolicyOracle;
use anyhow::Result;

/// Persists the policy when training results improve.
///
/// The trainer only supplies the trigger: it calls [`save_best`] whenever
/// the mean return of completed episodes exceeds the best value seen so
/// far. What gets serialized, and in which format, is entirely up to the
/// implementor.
///
/// [`save_best`]: Checkpointer::save_best
pub trait Checkpointer<O: PolicyOracle> {
    /// Persist the current state of `oracle`. `best_return` is the metric
    /// that triggered the save.
    fn save_best(&mut self, oracle: &O, best_return: f32) -> Result<()>;
}

/// A checkpointer that does nothing.
pub struct NullCheckpointer;

impl<O: PolicyOracle> Checkpointer<O> for NullCheckpointer {
    fn save_best(&mut self, _oracle: &O, _best_return: f32) -> Result<()> {
        Ok(())
    }
}
