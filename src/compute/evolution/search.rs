//! Evolution orchestrator driving a route search.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::schema::{
    CandidateSnapshot, DiscreteChromosome, EvolutionHistory, EvolutionResult, EvolutionStats,
    GenerationSummary, MetricScore, RouteError, RunState, SearchConfig, SearchError, StopReason,
};

use super::engine::{GenerationEngine, SurvivorEngine};
use super::fitness::{FitnessEvaluator, MetricResult};

/// A scored individual in the population.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The route.
    pub chromosome: DiscreteChromosome,
    /// Fitness score (lower is better).
    pub fitness: f64,
    /// Individual metric results.
    pub metrics: Vec<MetricResult>,
    /// Generation created.
    pub generation: usize,
}

impl Candidate {
    /// Create an unscored candidate.
    pub fn new(chromosome: DiscreteChromosome, generation: usize) -> Self {
        Self {
            chromosome,
            fitness: f64::INFINITY,
            metrics: Vec::new(),
            generation,
        }
    }

    /// Convert to snapshot for serialization.
    pub fn to_snapshot(&self) -> CandidateSnapshot {
        CandidateSnapshot {
            fitness: self.fitness,
            metric_scores: self
                .metrics
                .iter()
                .map(|m| MetricScore {
                    name: m.name.clone(),
                    score: m.score,
                })
                .collect(),
            route: self.chromosome.to_record(),
            generation: self.generation,
        }
    }
}

/// Progress callback, invoked with the index of each completed generation.
pub type ProgressCallback = Box<dyn Fn(usize) + Send + Sync>;

/// Runs generations of a route search.
pub struct Evolution {
    config: Arc<SearchConfig>,
    engine: Box<dyn GenerationEngine>,
    progress: Option<ProgressCallback>,
    population: Vec<Candidate>,
    history: EvolutionHistory,
    best: Option<Candidate>,
    state: RunState,
    generation: usize,
    aborted: Arc<AtomicBool>,
}

impl Evolution {
    /// Create a new evolution using the [`SurvivorEngine`].
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config: Arc::new(config),
            engine: Box::new(SurvivorEngine),
            progress: None,
            population: Vec::new(),
            history: EvolutionHistory::default(),
            best: None,
            state: RunState::Idle,
            generation: 0,
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the generation engine.
    pub fn with_engine<E: GenerationEngine + 'static>(mut self, engine: E) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Set the progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Get abort handle.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.aborted)
    }

    /// Raise or clear the abort flag.
    pub fn set_aborted(&self, aborted: bool) {
        self.aborted.store(aborted, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Best candidate seen so far.
    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Current population.
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Evaluate all candidates in the population.
    #[cfg(not(target_arch = "wasm32"))]
    fn evaluate_population(&mut self, evaluator: &FitnessEvaluator) -> Result<(), RouteError> {
        self.population
            .par_iter_mut()
            .try_for_each(|candidate| -> Result<(), RouteError> {
                let (fitness, metrics) = evaluator.evaluate(&candidate.chromosome)?;
                candidate.fitness = fitness;
                candidate.metrics = metrics;
                Ok(())
            })
    }

    #[cfg(target_arch = "wasm32")]
    fn evaluate_population(&mut self, evaluator: &FitnessEvaluator) -> Result<(), RouteError> {
        for candidate in &mut self.population {
            let (fitness, metrics) = evaluator.evaluate(&candidate.chromosome)?;
            candidate.fitness = fitness;
            candidate.metrics = metrics;
        }
        Ok(())
    }

    fn generation_best(&self) -> Option<&Candidate> {
        self.population
            .iter()
            .min_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    fn mean_fitness(&self) -> f64 {
        if self.population.is_empty() {
            return f64::INFINITY;
        }
        self.population.iter().map(|c| c.fitness).sum::<f64>() / self.population.len() as f64
    }

    fn update_best(&mut self) {
        let Some(candidate) = self
            .population
            .iter()
            .min_by(|a, b| a.fitness.total_cmp(&b.fitness))
        else {
            return;
        };
        let improved = self
            .best
            .as_ref()
            .is_none_or(|best| candidate.fitness < best.fitness);
        if improved {
            self.best = Some(candidate.clone());
        }
    }

    fn record_generation(&mut self) {
        let Some(best) = self.generation_best() else {
            return;
        };
        let summary = GenerationSummary {
            generation: self.generation,
            best: best.to_snapshot(),
            best_fitness: best.fitness,
            mean_fitness: self.mean_fitness(),
        };
        debug!(
            "Generation {}: best {:.4}, mean {:.4}",
            summary.generation, summary.best_fitness, summary.mean_fitness
        );
        self.history.push(summary);
    }

    /// Check if evolution should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.aborted.load(Ordering::SeqCst) {
            return Some(StopReason::Aborted);
        }
        if self.generation >= self.config.limit {
            return Some(StopReason::MaxGenerations);
        }
        None
    }

    /// Build the initial population and step generations until a stop
    /// condition. Returns the stop reason and the number of evaluations.
    fn run_generations(
        &mut self,
        evaluator: &FitnessEvaluator,
        rng: &mut StdRng,
    ) -> Result<(StopReason, u64), SearchError> {
        // Initial population
        let constraints = Arc::new(self.config.constraints());
        self.population = (0..self.config.population)
            .map(|_| {
                DiscreteChromosome::random(Arc::clone(&constraints), rng)
                    .map(|chromosome| Candidate::new(chromosome, 0))
            })
            .collect::<Result<_, _>>()?;
        self.evaluate_population(evaluator)?;
        self.update_best();
        let mut total_evaluations = self.population.len() as u64;

        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }

            let next = self
                .engine
                .next_generation(&self.population, &self.config, rng)?;
            if next.len() != self.config.population {
                return Err(SearchError::GenerationSize {
                    expected: self.config.population,
                    actual: next.len(),
                });
            }
            self.generation += 1;
            let generation = self.generation;
            self.population = next
                .into_iter()
                .map(|chromosome| Candidate::new(chromosome, generation))
                .collect();

            self.evaluate_population(evaluator)?;
            total_evaluations += self.population.len() as u64;
            self.update_best();
            self.record_generation();

            if let Some(callback) = &self.progress {
                callback(self.generation);
            }
        };

        Ok((stop_reason, total_evaluations))
    }

    /// Run the search until the generation limit or an abort.
    ///
    /// The configuration is validated first and never changed by the run.
    /// An error after the run has started leaves the state at
    /// [`RunState::Failed`].
    pub fn run(&mut self) -> Result<EvolutionResult, SearchError> {
        self.config.validate()?;

        let start_time = std::time::Instant::now();
        let seed = self.config.random_seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let evaluator = FitnessEvaluator::new(Arc::clone(&self.config));

        info!(
            "Starting search '{}': {} fitness, {} positions, population {}, limit {}, seed {}",
            self.config.name,
            evaluator.method(),
            self.config.positions,
            self.config.population,
            self.config.limit,
            seed
        );

        self.state = RunState::Running;
        self.generation = 0;
        self.history = EvolutionHistory::default();
        self.best = None;

        let (stop_reason, total_evaluations) = match self.run_generations(&evaluator, &mut rng) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Search failed at generation {}: {}", self.generation, e);
                self.state = RunState::Failed;
                return Err(e);
            }
        };

        self.state = match stop_reason {
            StopReason::Aborted => {
                warn!("Search aborted after {} generations", self.generation);
                RunState::Aborted
            }
            StopReason::MaxGenerations => RunState::Completed,
        };

        let best = self.best.as_ref().ok_or(SearchError::EmptyPopulation)?;
        let elapsed = start_time.elapsed().as_secs_f64();

        info!(
            "Search finished after {} generations: best fitness {:.4} ({:?})",
            self.generation, best.fitness, stop_reason
        );

        Ok(EvolutionResult {
            best: best.to_snapshot(),
            history: self.history.clone(),
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations,
                best_fitness: best.fitness,
                final_mean_fitness: self.mean_fitness(),
                elapsed_seconds: elapsed,
                stop_reason,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DiscretePoint, FitnessMethod, Mutator, SearchConfigError};
    use std::sync::Mutex;

    fn config() -> SearchConfig {
        SearchConfig {
            name: "test".to_string(),
            positions: 4,
            distance_bounds: (1.0, 8.0),
            treasures: vec![DiscretePoint::new(2, 4, 3.0).unwrap()],
            fitness: FitnessMethod::Singular,
            mutators: vec![Mutator::SwapPositions { probability: 1.0 }],
            population: 10,
            survivors: 4,
            offspring: 6,
            limit: 5,
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_evolution_run() {
        let mut evolution = Evolution::new(config());
        assert_eq!(evolution.state(), RunState::Idle);

        let result = evolution.run().unwrap();

        assert_eq!(result.history.len(), 5);
        assert_eq!(result.stats.generations, 5);
        assert_eq!(result.stats.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.stats.total_evaluations, 60);
        assert_eq!(evolution.state(), RunState::Completed);
        assert_eq!(evolution.population().len(), 10);

        let generations: Vec<_> = result.history.iter().map(|g| g.generation).collect();
        assert_eq!(generations, vec![1, 2, 3, 4, 5]);
        assert!(result.history.iter().all(|g| g.best_fitness <= g.mean_fitness));
    }

    #[test]
    fn test_best_never_regresses() {
        let mut evolution = Evolution::new(config());
        let result = evolution.run().unwrap();

        let best = result.history.best_fitness();
        assert!(best.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(evolution.best().map(|c| c.fitness), Some(result.stats.best_fitness));
    }

    #[test]
    fn test_cancellation() {
        let mut evolution = Evolution::new(config());
        let abort = evolution.abort_handle();

        // Abort immediately
        abort.store(true, Ordering::SeqCst);

        let result = evolution.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Aborted);
        assert!(result.history.is_empty());
        assert_eq!(evolution.state(), RunState::Aborted);
    }

    #[test]
    fn test_abort_from_callback() {
        let mut evolution = Evolution::new(SearchConfig {
            limit: 100,
            ..config()
        });
        let abort = evolution.abort_handle();
        evolution = evolution.with_progress(move |generation| {
            if generation == 3 {
                abort.store(true, Ordering::SeqCst);
            }
        });

        let result = evolution.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Aborted);
        assert_eq!(result.history.len(), 3);
    }

    #[test]
    fn test_progress_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut evolution =
            Evolution::new(config()).with_progress(move |g| sink.lock().unwrap().push(g));

        evolution.run().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let first = Evolution::new(config()).run().unwrap();
        let second = Evolution::new(config()).run().unwrap();
        assert_eq!(first.history.best_fitness(), second.history.best_fitness());
        assert_eq!(first.best.route, second.best.route);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut evolution = Evolution::new(SearchConfig {
            survivors: 5,
            ..config()
        });
        assert!(matches!(
            evolution.run(),
            Err(SearchError::Config(SearchConfigError::SizeMismatch { .. }))
        ));
        assert_eq!(evolution.state(), RunState::Idle);
    }

    #[test]
    fn test_all_methods_run() {
        for fitness in FitnessMethod::ALL {
            let mut evolution = Evolution::new(SearchConfig {
                fitness,
                limit: 2,
                ..config()
            });
            let result = evolution.run().unwrap();
            assert_eq!(result.history.len(), 2);
        }
    }

    struct Frozen;

    impl GenerationEngine for Frozen {
        fn next_generation(
            &self,
            population: &[Candidate],
            _config: &SearchConfig,
            _rng: &mut StdRng,
        ) -> Result<Vec<DiscreteChromosome>, RouteError> {
            Ok(population.iter().map(|c| c.chromosome.clone()).collect())
        }
    }

    #[test]
    fn test_custom_engine() {
        let mut evolution = Evolution::new(config()).with_engine(Frozen);
        let result = evolution.run().unwrap();
        let best = result.history.best_fitness();
        assert!(best.iter().all(|&f| f == best[0]));
    }

    struct Empty;

    impl GenerationEngine for Empty {
        fn next_generation(
            &self,
            _population: &[Candidate],
            _config: &SearchConfig,
            _rng: &mut StdRng,
        ) -> Result<Vec<DiscreteChromosome>, RouteError> {
            Ok(Vec::new())
        }
    }

    struct Failing;

    impl GenerationEngine for Failing {
        fn next_generation(
            &self,
            _population: &[Candidate],
            _config: &SearchConfig,
            _rng: &mut StdRng,
        ) -> Result<Vec<DiscreteChromosome>, RouteError> {
            Err(RouteError::MutationPrecondition {
                required: 2,
                actual: 1,
            })
        }
    }

    #[test]
    fn test_short_generation_rejected() {
        let calls = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&calls);
        let mut evolution = Evolution::new(config())
            .with_engine(Empty)
            .with_progress(move |_| *sink.lock().unwrap() += 1);

        assert!(matches!(
            evolution.run(),
            Err(SearchError::GenerationSize {
                expected: 10,
                actual: 0
            })
        ));
        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(evolution.history().is_empty());
        assert_eq!(evolution.state(), RunState::Failed);
    }

    #[test]
    fn test_engine_error_ends_run() {
        let mut evolution = Evolution::new(config()).with_engine(Failing);
        assert!(matches!(
            evolution.run(),
            Err(SearchError::Route(RouteError::MutationPrecondition { .. }))
        ));
        assert_eq!(evolution.state(), RunState::Failed);

        // A failed run can be restarted with a working engine
        let mut evolution = evolution.with_engine(SurvivorEngine);
        assert!(evolution.run().is_ok());
        assert_eq!(evolution.state(), RunState::Completed);
    }
}
