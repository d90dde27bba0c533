//! Progress, history and result types produced by a search run.

use serde::{Deserialize, Serialize};

use super::{ChromosomeRecord, RouteError, SearchConfigError};

/// Snapshot of a scored route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    /// Fitness score (lower is better).
    pub fitness: f64,
    /// Individual metric scores.
    pub metric_scores: Vec<MetricScore>,
    /// The route in persisted form.
    pub route: ChromosomeRecord,
    /// Generation this candidate was created.
    pub generation: usize,
}

/// Score for an individual metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricScore {
    /// Metric name.
    pub name: String,
    /// Raw score.
    pub score: f64,
}

/// Summary of a single completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Generation index, starting at 1.
    pub generation: usize,
    /// Best candidate of this generation.
    pub best: CandidateSnapshot,
    /// Best fitness of this generation.
    pub best_fitness: f64,
    /// Mean fitness of this generation.
    pub mean_fitness: f64,
}

/// Ordered record of completed generations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    pub generations: Vec<GenerationSummary>,
}

impl EvolutionHistory {
    pub fn push(&mut self, summary: GenerationSummary) {
        self.generations.push(summary);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn last(&self) -> Option<&GenerationSummary> {
        self.generations.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenerationSummary> {
        self.generations.iter()
    }

    /// Best fitness per generation, for plotting.
    pub fn best_fitness(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best_fitness).collect()
    }

    /// Mean fitness per generation.
    pub fn mean_fitness(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.mean_fitness).collect()
    }
}

/// Lifecycle of an evolution run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not started yet.
    #[default]
    Idle,
    /// Generations in progress.
    Running,
    /// Stopped by the abort flag.
    Aborted,
    /// Generation limit reached.
    Completed,
    /// Stopped by an error from the engine or fitness evaluation.
    Failed,
}

/// Final result of a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best candidate found.
    pub best: CandidateSnapshot,
    /// Full history for analysis.
    pub history: EvolutionHistory,
    /// Statistics from the run.
    pub stats: EvolutionStats,
}

/// Statistics from a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Total generations run.
    pub generations: usize,
    /// Total fitness evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Mean fitness of the final population.
    pub final_mean_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason a run stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the generation limit.
    MaxGenerations,
    /// Abort flag was raised.
    Aborted,
}

/// Failure of a search run.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] SearchConfigError),
    #[error("Route error: {0}")]
    Route(#[from] RouteError),
    #[error("Population is empty")]
    EmptyPopulation,
    #[error("Engine produced {actual} routes, expected {expected}")]
    GenerationSize { expected: usize, actual: usize },
}
