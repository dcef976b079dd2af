//! Run parameters and the records a run produces.
mod outcome;
mod run;

#[cfg(test)]
mod tests;

pub use outcome::{ErrorKind, Outcome, RunSummary, WorkerSummary};
pub use run::RunConfig;
