//! Git access for cmoverride.

pub mod baseline;

pub use baseline::{BaselineSource, GitBaselineSource};
