//! Compute module - Route analysis and evolutionary search.

pub mod analysis;
pub mod evolution;

pub use analysis::*;
