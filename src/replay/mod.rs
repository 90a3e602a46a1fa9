//! Replaying position traces through the navigator, for demos and offline checks.

mod error;
mod runner;
mod trace;

pub use runner::Runner;
pub use trace::Trace;
