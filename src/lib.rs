//! Route Search - Evolutionary search for discrete treasure-hunt routes.
//!
//! A route visits a sequence of points, each on one of `positions` equally
//! spaced rays around the origin at some distance. Routes are evolved to find
//! hidden treasures cheaply, measured by competitive ratio, covered area or an
//! adversarial worst case.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Route encoding, configuration and result types
//! - `compute`: Route analysis, mutation, fitness and the evolution loop
//!
//! # Example
//!
//! ```rust,no_run
//! use route_search::{
//!     compute::evolution::Evolution,
//!     schema::{DiscretePoint, FitnessMethod, SearchConfig},
//! };
//!
//! let config = SearchConfig {
//!     positions: 6,
//!     treasures: vec![DiscretePoint::new(2, 6, 4.0).unwrap()],
//!     fitness: FitnessMethod::Singular,
//!     limit: 100,
//!     ..Default::default()
//! };
//!
//! let result = Evolution::new(config).run().unwrap();
//! println!("Best competitive ratio: {:.3}", result.best.fitness);
//! println!("Generations: {}", result.history.len());
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{Evolution, GenerationEngine, SurvivorEngine};
pub use schema::{
    DiscreteChromosome, DiscreteGene, DiscretePoint, FitnessMethod, Mutator, SearchConfig,
};
