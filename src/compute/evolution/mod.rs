//! Evolutionary search for treasure-hunt routes.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Mutation** (`mutation`): operators over discrete chromosomes
//! - **Fitness Functions** (`fitness`): scoring per [`FitnessMethod`]
//! - **Generation Engines** (`engine`): how a population becomes the next one
//! - **Search** (`search`): the [`Evolution`] orchestrator
//!
//! # Example
//!
//! ```rust,no_run
//! use route_search::schema::{FitnessMethod, SearchConfig};
//! use route_search::compute::evolution::Evolution;
//!
//! let config = SearchConfig {
//!     fitness: FitnessMethod::WorstCase,
//!     limit: 200,
//!     ..Default::default()
//! };
//!
//! let mut evolution = Evolution::new(config)
//!     .with_progress(|generation| println!("Generation {generation} done"));
//! let result = evolution.run().expect("valid configuration");
//!
//! println!("Best fitness: {:.3}", result.best.fitness);
//! ```
//!
//! # Fitness Methods
//!
//! - `Singular`: competitive ratio for the first treasure
//! - `Multi`: mean competitive ratio over all treasures
//! - `MaxArea`: path length per unit of enclosed area
//! - `WorstCase`: competitive ratio against an adversarial treasure
//!
//! [`FitnessMethod`]: crate::schema::FitnessMethod

mod engine;
mod fitness;
mod mutation;
mod search;

pub use engine::{GenerationEngine, SurvivorEngine};
pub use fitness::{FitnessEvaluator, FitnessFn, MetricResult, fitness_function};
pub use mutation::{MutationResult, apply_mutators};
pub use search::{Candidate, Evolution, ProgressCallback};
