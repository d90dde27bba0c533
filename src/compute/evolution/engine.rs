//! Generation stepping: how one population becomes the next.

use std::sync::Arc;

use rand::Rng;
use rand::rngs::StdRng;

use crate::schema::{DiscreteChromosome, RouteError, SearchConfig};

use super::mutation::apply_mutators;
use super::search::Candidate;

/// Produces the next generation from a scored population.
///
/// Implementations must return exactly `config.population` chromosomes and
/// must only use the mutators configured in `config`.
pub trait GenerationEngine: Send + Sync {
    fn next_generation(
        &self,
        population: &[Candidate],
        config: &SearchConfig,
        rng: &mut StdRng,
    ) -> Result<Vec<DiscreteChromosome>, RouteError>;
}

/// Elitist, mutation-only engine.
///
/// Keeps the `survivors` best candidates unchanged and fills the rest with
/// offspring: a tournament-selected parent passed through every configured
/// mutator in order. Invalid candidates are never kept or selected; when no
/// valid candidate exists the offspring are fresh random routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurvivorEngine;

impl GenerationEngine for SurvivorEngine {
    fn next_generation(
        &self,
        population: &[Candidate],
        config: &SearchConfig,
        rng: &mut StdRng,
    ) -> Result<Vec<DiscreteChromosome>, RouteError> {
        let constraints = population
            .first()
            .map(|c| Arc::clone(c.chromosome.constraints()))
            .unwrap_or_else(|| Arc::new(config.constraints()));

        // Lower fitness is better
        let mut ranked: Vec<&Candidate> = population
            .iter()
            .filter(|c| c.chromosome.is_valid())
            .collect();
        ranked.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

        let mut next = Vec::with_capacity(config.population);
        next.extend(
            ranked
                .iter()
                .take(config.survivors)
                .map(|c| c.chromosome.clone()),
        );

        while next.len() < config.population {
            if ranked.is_empty() {
                next.push(DiscreteChromosome::random(Arc::clone(&constraints), rng)?);
                continue;
            }

            let parent = ranked[select_index(&ranked, config.tournament_size, rng)];
            let child = apply_mutators(&config.mutators, &parent.chromosome, rng)?;
            next.push(child.chromosome);
        }

        Ok(next)
    }
}

/// Tournament selection: lowest fitness among `size` uniform draws.
fn select_index<R: Rng + ?Sized>(population: &[&Candidate], size: usize, rng: &mut R) -> usize {
    let mut best_idx = rng.gen_range(0..population.len());
    for _ in 1..size {
        let idx = rng.gen_range(0..population.len());
        if population[idx].fitness < population[best_idx].fitness {
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DiscretePoint, FitnessMethod, Mutator};
    use rand::SeedableRng;

    fn config() -> SearchConfig {
        SearchConfig {
            positions: 5,
            population: 6,
            survivors: 2,
            offspring: 4,
            fitness: FitnessMethod::WorstCase,
            mutators: vec![Mutator::SwapPositions { probability: 1.0 }],
            ..Default::default()
        }
    }

    fn population(config: &SearchConfig, rng: &mut StdRng) -> Vec<Candidate> {
        let constraints = Arc::new(config.constraints());
        (0..config.population)
            .map(|i| {
                let chromosome = DiscreteChromosome::random(Arc::clone(&constraints), rng).unwrap();
                let mut candidate = Candidate::new(chromosome, 0);
                candidate.fitness = i as f64;
                candidate
            })
            .collect()
    }

    #[test]
    fn test_survivors_kept_in_order() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(1);
        let mut current = population(&config, &mut rng);
        current.reverse();

        let next = SurvivorEngine
            .next_generation(&current, &config, &mut rng)
            .unwrap();
        assert_eq!(next.len(), 6);
        assert_eq!(next[0], current[5].chromosome);
        assert_eq!(next[1], current[4].chromosome);
        assert!(next.iter().all(DiscreteChromosome::is_valid));
    }

    #[test]
    fn test_empty_population_refilled() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(2);
        let next = SurvivorEngine.next_generation(&[], &config, &mut rng).unwrap();
        assert_eq!(next.len(), config.population);
    }

    #[test]
    fn test_tournament_prefers_low_fitness() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(3);
        let current = population(&config, &mut rng);
        let refs: Vec<&Candidate> = current.iter().collect();

        let picks: Vec<_> = (0..200)
            .map(|_| select_index(&refs, refs.len() * 4, &mut rng))
            .collect();
        let best = picks.iter().filter(|&&i| i == 0).count();
        assert!(best > 150);
        assert_eq!(select_index(&refs[..1], 3, &mut rng), 0);
    }

    #[test]
    fn test_invalid_candidates_skipped() {
        let config = SearchConfig {
            mutators: vec![Mutator::Distance { probability: 0.0 }],
            ..config()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let mut current = population(&config, &mut rng);

        // Best-scored candidate is out of bounds
        let points: Vec<DiscretePoint> = current[0]
            .chromosome
            .points()
            .iter()
            .map(|p| p.with_distance(50.0).unwrap())
            .collect();
        let invalid =
            DiscreteChromosome::from_points(Arc::clone(current[0].chromosome.constraints()), &points);
        assert!(!invalid.is_valid());
        current[0].chromosome = invalid;
        current[0].fitness = -1.0;

        for _ in 0..20 {
            let next = SurvivorEngine
                .next_generation(&current, &config, &mut rng)
                .unwrap();
            assert_eq!(next.len(), config.population);
            assert_eq!(next[0], current[1].chromosome);
            assert!(next.iter().all(DiscreteChromosome::is_valid));
        }
    }

    #[test]
    fn test_all_invalid_population_replaced() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(5);
        let mut current = population(&config, &mut rng);
        for candidate in &mut current {
            let points: Vec<DiscretePoint> = candidate
                .chromosome
                .points()
                .iter()
                .map(|p| p.with_distance(0.5).unwrap())
                .collect();
            candidate.chromosome = DiscreteChromosome::from_points(
                Arc::clone(candidate.chromosome.constraints()),
                &points,
            );
        }

        let next = SurvivorEngine
            .next_generation(&current, &config, &mut rng)
            .unwrap();
        assert_eq!(next.len(), config.population);
        assert!(next.iter().all(DiscreteChromosome::is_valid));
    }
}
