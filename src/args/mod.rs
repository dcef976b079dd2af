//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod test_support;

pub use cli::VolleyArgs;
pub use types::{OutputFormat, PositiveU64, PositiveUsize};

pub(crate) use parsers::parse_duration_arg;
