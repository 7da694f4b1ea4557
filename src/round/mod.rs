//! Round lifecycle: scheduling and resolution

pub mod resolution;
pub mod scheduler;

pub use resolution::{BetSettlement, RoundOutcome};
pub use scheduler::RoundScheduler;
