//! Fitness evaluation for candidate routes.
//!
//! Every method is minimized.

use std::f64::consts::TAU;
use std::sync::Arc;

use crate::compute::analysis::{
    area_covered, area_in_sector, competitive_ratio, fill, spiral_likeness, trace_length,
    with_origin, worst_case_by_sector,
};
use crate::schema::{DiscreteChromosome, FitnessMethod, RouteError, SearchConfig};

/// Result of evaluating a single metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    pub name: String,
    pub score: f64,
}

impl MetricResult {
    fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Scoring function: fitness plus the metrics it was built from.
pub type FitnessFn =
    fn(&DiscreteChromosome, &SearchConfig) -> Result<(f64, Vec<MetricResult>), RouteError>;

/// Scoring function for `method`.
pub fn fitness_function(method: FitnessMethod) -> FitnessFn {
    match method {
        FitnessMethod::Singular => singular,
        FitnessMethod::Multi => multi,
        FitnessMethod::MaxArea => max_area,
        FitnessMethod::WorstCase => worst_case,
    }
}

/// Fitness evaluator bound to one configuration.
#[derive(Clone)]
pub struct FitnessEvaluator {
    config: Arc<SearchConfig>,
    function: FitnessFn,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator using the configured method.
    pub fn new(config: Arc<SearchConfig>) -> Self {
        let function = fitness_function(config.fitness);
        Self { config, function }
    }

    pub fn method(&self) -> FitnessMethod {
        self.config.fitness
    }

    /// Evaluate a route, returning `(fitness, metric_results)`.
    pub fn evaluate(
        &self,
        chromosome: &DiscreteChromosome,
    ) -> Result<(f64, Vec<MetricResult>), RouteError> {
        (self.function)(chromosome, &self.config)
    }
}

fn missing_treasure(method: FitnessMethod) -> RouteError {
    RouteError::ConfigurationMismatch(format!("{method} fitness needs a treasure"))
}

/// Competitive ratio for the first treasure.
fn singular(
    chromosome: &DiscreteChromosome,
    config: &SearchConfig,
) -> Result<(f64, Vec<MetricResult>), RouteError> {
    let treasure = config
        .treasures
        .first()
        .ok_or_else(|| missing_treasure(FitnessMethod::Singular))?;
    let ratio = competitive_ratio(chromosome, treasure);
    Ok((ratio, vec![MetricResult::new("competitive_ratio", ratio)]))
}

/// Mean competitive ratio over all treasures.
///
/// The metrics carry one ratio per treasure followed by spiral-likeness.
fn multi(
    chromosome: &DiscreteChromosome,
    config: &SearchConfig,
) -> Result<(f64, Vec<MetricResult>), RouteError> {
    if config.treasures.is_empty() {
        return Err(missing_treasure(FitnessMethod::Multi));
    }

    let mut metrics: Vec<MetricResult> = config
        .treasures
        .iter()
        .enumerate()
        .map(|(i, treasure)| {
            MetricResult::new(format!("treasure_{i}"), competitive_ratio(chromosome, treasure))
        })
        .collect();
    let mean = metrics.iter().map(|m| m.score).sum::<f64>() / metrics.len() as f64;
    metrics.push(MetricResult::new(
        "spiral_likeness",
        spiral_likeness(chromosome),
    ));

    Ok((mean, metrics))
}

/// Trace length per unit area of the filled route.
fn max_area(
    chromosome: &DiscreteChromosome,
    _config: &SearchConfig,
) -> Result<(f64, Vec<MetricResult>), RouteError> {
    let filled = fill(chromosome)?;
    let length = trace_length(&filled);
    let area = area_covered(&filled);

    let reach = filled
        .iter()
        .map(|p| p.distance())
        .fold(0.0, f64::max);
    let disc = area_in_sector(TAU, reach, 1);
    let coverage = if disc > 0.0 { area / disc } else { 0.0 };

    let fitness = if area > 0.0 {
        length / area
    } else {
        f64::INFINITY
    };

    Ok((
        fitness,
        vec![
            MetricResult::new("trace_length", length),
            MetricResult::new("area", area),
            MetricResult::new("coverage", coverage),
        ],
    ))
}

/// Worst competitive ratio against an adversarial treasure.
///
/// Scores the route as visited from the origin; unlike MAX_AREA it does not
/// insert `fill` waypoints, which would add visits the route never makes.
fn worst_case(
    chromosome: &DiscreteChromosome,
    config: &SearchConfig,
) -> Result<(f64, Vec<MetricResult>), RouteError> {
    let route = with_origin(&chromosome.points());
    let sectors = worst_case_by_sector(&route, config.worst_case_sectors);
    let fitness = sectors
        .iter()
        .copied()
        .reduce(f64::max)
        .unwrap_or(f64::INFINITY);

    let metrics = sectors
        .into_iter()
        .enumerate()
        .map(|(i, score)| MetricResult::new(format!("sector_{i}"), score))
        .collect();
    Ok((fitness, metrics))
}
