//! Mutation operators over discrete chromosomes.

use rand::Rng;

use crate::schema::{DiscreteChromosome, DiscretePoint, Mutator, RouteError};

/// Outcome of applying one or more mutators.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    /// The mutated chromosome; equal to the input when nothing changed.
    pub chromosome: DiscreteChromosome,
    /// Number of mutation events that altered an allele. A draw that lands on
    /// the old value, or a swap with no differing pair, is not counted.
    pub mutations: usize,
}

impl MutationResult {
    #[inline]
    pub fn changed(&self) -> bool {
        self.mutations > 0
    }
}

impl Mutator {
    /// Apply this operator to a copy of `target`.
    ///
    /// Swap operators need at least two genes; this is checked before any
    /// randomness is drawn. A firing swap picks uniformly among the pairs
    /// whose swapped field differs. An invalid `target` is rejected rather than
    /// mutated.
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        target: &DiscreteChromosome,
        rng: &mut R,
    ) -> Result<MutationResult, RouteError> {
        if self.requires_pair() && target.len() < 2 {
            return Err(RouteError::MutationPrecondition {
                required: 2,
                actual: target.len(),
            });
        }
        let probability = self.probability();
        if !(0.0..=1.0).contains(&probability) {
            return Err(RouteError::ConfigurationMismatch(format!(
                "{} probability {probability} outside [0, 1]",
                self.name()
            )));
        }
        target.validate()?;

        let mut chromosome = target.clone();
        let mutations = match self {
            Mutator::Distance { .. } => {
                let mut changed = 0;
                for i in 0..chromosome.len() {
                    if rng.gen_bool(probability) {
                        let gene = &chromosome.genes()[i];
                        let distance = gene.constraints().random_distance(rng);
                        if distance != gene.allele().distance() {
                            let mutated = gene.with_allele(gene.allele().with_distance(distance)?);
                            chromosome.set_gene(i, mutated);
                            changed += 1;
                        }
                    }
                }
                changed
            }
            Mutator::Position { .. } => {
                let mut changed = 0;
                for i in 0..chromosome.len() {
                    if rng.gen_bool(probability) {
                        let gene = &chromosome.genes()[i];
                        let position = gene.constraints().random_position(rng);
                        if position != gene.allele().position() {
                            let mutated = gene.with_allele(gene.allele().with_position(position)?);
                            chromosome.set_gene(i, mutated);
                            changed += 1;
                        }
                    }
                }
                changed
            }
            Mutator::SwapGene { .. } => {
                if !rng.gen_bool(probability) {
                    0
                } else if let Some((a, b)) = differing_pair(&chromosome, rng, |x, y| x != y) {
                    chromosome.swap_genes(a, b);
                    1
                } else {
                    0
                }
            }
            Mutator::SwapPositions { .. } | Mutator::SwapDistance { .. } => {
                let by_position = matches!(self, Mutator::SwapPositions { .. });
                let differs = |x: &DiscretePoint, y: &DiscretePoint| {
                    if by_position {
                        x.position() != y.position()
                    } else {
                        x.distance() != y.distance()
                    }
                };
                if !rng.gen_bool(probability) {
                    0
                } else if let Some((a, b)) = differing_pair(&chromosome, rng, differs) {
                    let mut first = *chromosome.genes()[a].allele();
                    let mut second = *chromosome.genes()[b].allele();
                    if by_position {
                        first.swap_positions(&mut second)?;
                    } else {
                        first.swap_distance(&mut second)?;
                    }
                    let gene_a = chromosome.genes()[a].with_allele(first);
                    let gene_b = chromosome.genes()[b].with_allele(second);
                    chromosome.set_gene(a, gene_a);
                    chromosome.set_gene(b, gene_b);
                    1
                } else {
                    0
                }
            }
        };

        Ok(MutationResult {
            chromosome,
            mutations,
        })
    }
}

/// A pair `a < b` whose alleles differ under `differs`, chosen uniformly
/// among all such pairs. `None` when every pair is alike.
fn differing_pair<R, F>(
    chromosome: &DiscreteChromosome,
    rng: &mut R,
    differs: F,
) -> Option<(usize, usize)>
where
    R: Rng + ?Sized,
    F: Fn(&DiscretePoint, &DiscretePoint) -> bool,
{
    let points = chromosome.points();
    let pairs: Vec<(usize, usize)> = (0..points.len())
        .flat_map(|a| (a + 1..points.len()).map(move |b| (a, b)))
        .filter(|&(a, b)| differs(&points[a], &points[b]))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    Some(pairs[rng.gen_range(0..pairs.len())])
}

/// Apply `mutators` in order, each to the previous one's output.
pub fn apply_mutators<R: Rng + ?Sized>(
    mutators: &[Mutator],
    target: &DiscreteChromosome,
    rng: &mut R,
) -> Result<MutationResult, RouteError> {
    let mut result = MutationResult {
        chromosome: target.clone(),
        mutations: 0,
    };
    for mutator in mutators {
        let next = mutator.mutate(&result.chromosome, rng)?;
        result.mutations += next.mutations;
        result.chromosome = next.chromosome;
    }
    Ok(result)
}
