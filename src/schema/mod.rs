//! Schema module - Route encoding, configuration and result types.

mod config;
mod error;
mod evolution;
mod genome;
mod point;

pub use config::*;
pub use error::*;
pub use evolution::*;
pub use genome::*;
pub use point::*;
