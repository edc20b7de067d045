//! Types for recording training metrics.
//!
//! A [`Record`] is a set of named values produced by one training update,
//! for example loss scalars or episode returns. Objects implementing
//! [`Recorder`] receive records from the training loop and decide what to
//! do with them: [`NullRecorder`] discards everything, while
//! [`BufferedRecorder`] keeps records in memory, which is convenient in
//! tests and for custom post-processing.
mod base;
mod recorder;

pub use base::{Record, RecordValue};
pub use recorder::{BufferedRecorder, NullRecorder, Recorder};
