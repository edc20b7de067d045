//! Core abstractions.
//!
//! These traits are the seams to the external collaborators of the training
//! core: the parametric policy with its optimizer ([`PolicyOracle`]), the
//! batch of simulated environments ([`VecEnv`]) and the persistence layer
//! reacting to improved results ([`Checkpointer`]).
mod checkpoint;
mod env;
mod oracle;

pub use checkpoint::{Checkpointer, NullCheckpointer};
pub use env::{EnvStep, VecEnv};
pub use oracle::{BackwardMode, Evaluation, PolicyOracle, PolicyOutput};
