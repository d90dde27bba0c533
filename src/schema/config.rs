//! Configuration types for a route search run.

use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::DiscretePoint;

/// Closest distance from the origin the adversary may hide a treasure at.
pub const MIN_TREASURE_DISTANCE: f64 = 1.0;

/// Bounds every gene of a chromosome is validated against.
///
/// Shared by reference (`Arc`) between all genes of a run and never mutated
/// once the run has started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneConstraints {
    /// Number of rays (slots) around the origin; also the chromosome length.
    pub positions: usize,
    /// Inclusive `(min, max)` range for gene distances.
    pub distance_bounds: (f64, f64),
}

impl GeneConstraints {
    /// Create constraints, rejecting empty slot sets and malformed bounds.
    pub fn new(positions: usize, distance_bounds: (f64, f64)) -> Result<Self, SearchConfigError> {
        let constraints = Self {
            positions,
            distance_bounds,
        };
        constraints.validate()?;
        Ok(constraints)
    }

    /// Validate slot count and distance bounds.
    pub fn validate(&self) -> Result<(), SearchConfigError> {
        if self.positions == 0 {
            return Err(SearchConfigError::InvalidPositions);
        }
        let (min, max) = self.distance_bounds;
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
            return Err(SearchConfigError::InvalidBounds(format!(
                "distance bounds ({min}, {max}) must be finite with 0 <= min <= max"
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn contains_distance(&self, distance: f64) -> bool {
        distance >= self.distance_bounds.0 && distance <= self.distance_bounds.1
    }

    #[inline]
    pub fn contains_position(&self, position: usize) -> bool {
        position < self.positions
    }

    /// Uniform random distance within the bounds.
    pub fn random_distance<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (min, max) = self.distance_bounds;
        if min == max {
            min
        } else {
            rng.gen_range(min..=max)
        }
    }

    /// Uniform random position in `[0, positions)`.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.positions)
    }
}

impl Default for GeneConstraints {
    fn default() -> Self {
        Self {
            positions: default_positions(),
            distance_bounds: default_distance_bounds(),
        }
    }
}

/// Fitness method used to score routes. All variants are minimized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FitnessMethod {
    /// Competitive ratio of finding the first treasure.
    Singular,
    /// Competitive ratios over every treasure, combined as their mean.
    Multi,
    /// Path length per unit of enclosed area.
    MaxArea,
    /// Competitive ratio against an adversarial treasure placement.
    #[default]
    WorstCase,
}

impl FitnessMethod {
    /// Every available method, in display order.
    pub const ALL: [FitnessMethod; 4] = [
        FitnessMethod::Singular,
        FitnessMethod::Multi,
        FitnessMethod::WorstCase,
        FitnessMethod::MaxArea,
    ];

    /// Whether the method scores against configured treasures.
    pub fn needs_treasures(self) -> bool {
        matches!(self, FitnessMethod::Singular | FitnessMethod::Multi)
    }
}

impl std::fmt::Display for FitnessMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FitnessMethod::Singular => "SINGULAR",
            FitnessMethod::Multi => "MULTI",
            FitnessMethod::MaxArea => "MAX_AREA",
            FitnessMethod::WorstCase => "WORST_CASE",
        };
        f.write_str(name)
    }
}

/// Mutation operator and its firing probability.
///
/// The operators themselves live in `compute::evolution`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Mutator {
    /// Per gene: redraw the distance uniformly from the bounds.
    Distance { probability: f64 },
    /// Per gene: redraw the position uniformly from all slots.
    Position { probability: f64 },
    /// Per chromosome: exchange two whole genes.
    SwapGene { probability: f64 },
    /// Per chromosome: exchange the positions of two genes.
    SwapPositions { probability: f64 },
    /// Per chromosome: exchange the distances of two genes.
    SwapDistance { probability: f64 },
}

impl Mutator {
    #[inline]
    pub fn probability(&self) -> f64 {
        match *self {
            Mutator::Distance { probability }
            | Mutator::Position { probability }
            | Mutator::SwapGene { probability }
            | Mutator::SwapPositions { probability }
            | Mutator::SwapDistance { probability } => probability,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutator::Distance { .. } => "DistanceMutator",
            Mutator::Position { .. } => "PositionMutator",
            Mutator::SwapGene { .. } => "SwapGeneMutator",
            Mutator::SwapPositions { .. } => "SwapPositionsMutator",
            Mutator::SwapDistance { .. } => "SwapDistanceMutator",
        }
    }

    /// Whether the operator needs two distinct gene slots.
    pub fn requires_pair(&self) -> bool {
        matches!(
            self,
            Mutator::SwapGene { .. } | Mutator::SwapPositions { .. } | Mutator::SwapDistance { .. }
        )
    }

    /// Check the probability lies in `[0, 1]`.
    pub fn validate(&self) -> Result<(), SearchConfigError> {
        let p = self.probability();
        if !(0.0..=1.0).contains(&p) {
            return Err(SearchConfigError::InvalidProbability {
                mutator: self.name(),
                probability: p,
            });
        }
        Ok(())
    }
}

/// Top-level configuration for a route search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Display name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Number of rays (slots); also the chromosome length.
    #[serde(default = "default_positions")]
    pub positions: usize,
    /// Inclusive distance range for genes.
    #[serde(default = "default_distance_bounds")]
    pub distance_bounds: (f64, f64),
    /// Treasure points searched for by the treasure-based fitness methods.
    #[serde(default)]
    pub treasures: Vec<DiscretePoint>,
    /// Fitness method, fixed for the whole run.
    #[serde(default)]
    pub fitness: FitnessMethod,
    /// Mutators applied in order to every offspring.
    #[serde(default = "default_mutators")]
    pub mutators: Vec<Mutator>,
    /// Number of individuals per generation.
    #[serde(default = "default_population")]
    pub population: usize,
    /// Offspring bred per generation.
    #[serde(default = "default_offspring")]
    pub offspring: usize,
    /// Best individuals carried over unchanged.
    #[serde(default = "default_survivors")]
    pub survivors: usize,
    /// Generation limit.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Tournament size for parent selection.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Sector count used by the worst case fitness.
    #[serde(default = "default_worst_case_sectors")]
    pub worst_case_sectors: usize,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            positions: default_positions(),
            distance_bounds: default_distance_bounds(),
            treasures: Vec::new(),
            fitness: FitnessMethod::default(),
            mutators: default_mutators(),
            population: default_population(),
            offspring: default_offspring(),
            survivors: default_survivors(),
            limit: default_limit(),
            tournament_size: default_tournament_size(),
            worst_case_sectors: default_worst_case_sectors(),
            random_seed: None,
        }
    }
}

fn default_name() -> String {
    "Unnamed".to_string()
}
fn default_positions() -> usize {
    3
}
fn default_distance_bounds() -> (f64, f64) {
    (1.0, 10.0)
}
fn default_mutators() -> Vec<Mutator> {
    vec![
        Mutator::SwapGene { probability: 0.5 },
        Mutator::SwapPositions { probability: 0.5 },
    ]
}
fn default_population() -> usize {
    20
}
fn default_offspring() -> usize {
    10
}
fn default_survivors() -> usize {
    10
}
fn default_limit() -> usize {
    1000
}
fn default_tournament_size() -> usize {
    3
}
fn default_worst_case_sectors() -> usize {
    1
}

impl SearchConfig {
    /// Gene constraints derived from this configuration.
    pub fn constraints(&self) -> GeneConstraints {
        GeneConstraints {
            positions: self.positions,
            distance_bounds: self.distance_bounds,
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, SearchConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SearchConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), SearchConfigError> {
        self.constraints().validate()?;

        if self.population < 2 {
            return Err(SearchConfigError::PopulationTooSmall);
        }
        if self.survivors + self.offspring != self.population {
            return Err(SearchConfigError::SizeMismatch {
                survivors: self.survivors,
                offspring: self.offspring,
                population: self.population,
            });
        }
        if self.tournament_size == 0 {
            return Err(SearchConfigError::InvalidTournamentSize);
        }
        if self.worst_case_sectors == 0 {
            return Err(SearchConfigError::InvalidSectorCount);
        }
        // No gene could reach the nearest adversarial treasure
        if self.fitness == FitnessMethod::WorstCase
            && self.distance_bounds.1 < MIN_TREASURE_DISTANCE
        {
            return Err(SearchConfigError::InvalidBounds(format!(
                "worst case needs distances up to at least {MIN_TREASURE_DISTANCE}, got max {}",
                self.distance_bounds.1
            )));
        }

        for mutator in &self.mutators {
            mutator.validate()?;
            if mutator.requires_pair() && self.positions < 2 {
                return Err(SearchConfigError::SwapNeedsPair(mutator.name()));
            }
        }

        if self.fitness.needs_treasures() && self.treasures.is_empty() {
            return Err(SearchConfigError::MissingTreasure(self.fitness));
        }
        for (index, treasure) in self.treasures.iter().enumerate() {
            if treasure.positions() != self.positions {
                return Err(SearchConfigError::TreasureMismatch {
                    index,
                    positions: treasure.positions(),
                    expected: self.positions,
                });
            }
            if treasure.distance() <= 0.0 {
                return Err(SearchConfigError::InvalidBounds(format!(
                    "treasure {index} must lie away from the origin"
                )));
            }
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchConfigError {
    #[error("Position count must be non-zero")]
    InvalidPositions,
    #[error("Invalid parameter bounds: {0}")]
    InvalidBounds(String),
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Survivors ({survivors}) plus offspring ({offspring}) must equal population ({population})")]
    SizeMismatch {
        survivors: usize,
        offspring: usize,
        population: usize,
    },
    #[error("Tournament size must be non-zero")]
    InvalidTournamentSize,
    #[error("Worst case sector count must be non-zero")]
    InvalidSectorCount,
    #[error("{mutator} probability {probability} must lie in [0, 1]")]
    InvalidProbability {
        mutator: &'static str,
        probability: f64,
    },
    #[error("{0} needs at least two positions")]
    SwapNeedsPair(&'static str),
    #[error("Fitness method {0} needs at least one treasure")]
    MissingTreasure(FitnessMethod),
    #[error("Treasure {index} uses {positions} positions, expected {expected}")]
    TreasureMismatch {
        index: usize,
        positions: usize,
        expected: usize,
    },
    #[error("Error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error parsing config: {0}")]
    Parse(#[from] serde_json::Error),
}
