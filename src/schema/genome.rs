//! Genes and chromosomes encoding a candidate route.

use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{DiscretePoint, GeneConstraints, PointRecord, RouteError};

/// One stop of a route: a [`DiscretePoint`] bound to shared constraints.
///
/// Genes are never clamped into range. An invalid gene is reported by
/// [`DiscreteGene::is_valid`] and replaced by a fresh [`DiscreteGene::random`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteGene {
    allele: DiscretePoint,
    constraints: Arc<GeneConstraints>,
}

impl DiscreteGene {
    /// Bind a point to constraints without validating it.
    pub fn new(allele: DiscretePoint, constraints: Arc<GeneConstraints>) -> Self {
        Self {
            allele,
            constraints,
        }
    }

    /// Bind a point to constraints, failing if it violates them.
    pub fn try_new(
        allele: DiscretePoint,
        constraints: Arc<GeneConstraints>,
    ) -> Result<Self, RouteError> {
        let gene = Self::new(allele, constraints);
        gene.validate()?;
        Ok(gene)
    }

    /// Random gene within the constraints.
    pub fn random<R: Rng + ?Sized>(
        constraints: Arc<GeneConstraints>,
        rng: &mut R,
    ) -> Result<Self, RouteError> {
        let position = constraints.random_position(rng);
        Self::random_at(position, constraints, rng)
    }

    /// Random distance on a fixed ray.
    pub(crate) fn random_at<R: Rng + ?Sized>(
        position: usize,
        constraints: Arc<GeneConstraints>,
        rng: &mut R,
    ) -> Result<Self, RouteError> {
        let distance = constraints.random_distance(rng);
        let allele = DiscretePoint::new(position, constraints.positions, distance)?;
        Ok(Self::new(allele, constraints))
    }

    /// New gene holding `allele`, bound to the same constraints.
    pub fn with_allele(&self, allele: DiscretePoint) -> Self {
        Self::new(allele, Arc::clone(&self.constraints))
    }

    #[inline]
    pub fn allele(&self) -> &DiscretePoint {
        &self.allele
    }

    #[inline]
    pub fn constraints(&self) -> &Arc<GeneConstraints> {
        &self.constraints
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check the allele against the constraints.
    pub fn validate(&self) -> Result<(), RouteError> {
        let positions = self.constraints.positions;
        if self.allele.positions() != positions {
            return Err(RouteError::slot_mismatch(positions, self.allele.positions()));
        }
        if !self.constraints.contains_position(self.allele.position()) {
            return Err(RouteError::position_out_of_range(
                self.allele.position(),
                positions,
            ));
        }
        if !self.constraints.contains_distance(self.allele.distance()) {
            let (min, max) = self.constraints.distance_bounds;
            return Err(RouteError::InvalidEncoding(format!(
                "distance {} outside bounds [{min}, {max}]",
                self.allele.distance()
            )));
        }
        Ok(())
    }
}

/// Ordered sequence of genes: one candidate route, visited front to back.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteChromosome {
    genes: Vec<DiscreteGene>,
    constraints: Arc<GeneConstraints>,
}

impl DiscreteChromosome {
    /// Random valid chromosome.
    ///
    /// Every ray is visited once, in shuffled order, at a random distance.
    pub fn random<R: Rng + ?Sized>(
        constraints: Arc<GeneConstraints>,
        rng: &mut R,
    ) -> Result<Self, RouteError> {
        let mut genes = (0..constraints.positions)
            .map(|position| DiscreteGene::random_at(position, Arc::clone(&constraints), rng))
            .collect::<Result<Vec<_>, _>>()?;
        genes.shuffle(rng);
        Ok(Self { genes, constraints })
    }

    /// Wrap genes as-is. Use [`DiscreteChromosome::is_valid`] to check them.
    pub fn from_genes(constraints: Arc<GeneConstraints>, genes: Vec<DiscreteGene>) -> Self {
        Self { genes, constraints }
    }

    /// Bind every point to `constraints`, in order.
    pub fn from_points(constraints: Arc<GeneConstraints>, points: &[DiscretePoint]) -> Self {
        let genes = points
            .iter()
            .map(|&point| DiscreteGene::new(point, Arc::clone(&constraints)))
            .collect();
        Self { genes, constraints }
    }

    /// Rebuild a chromosome from its persisted form, validating it.
    pub fn from_record(
        constraints: Arc<GeneConstraints>,
        record: &ChromosomeRecord,
    ) -> Result<Self, RouteError> {
        let points = record
            .genes
            .iter()
            .map(|&gene| DiscretePoint::try_from(gene))
            .collect::<Result<Vec<_>, _>>()?;
        let chromosome = Self::from_points(constraints, &points);
        chromosome.validate()?;
        Ok(chromosome)
    }

    /// Genes in visiting order.
    #[inline]
    pub fn to_seq(&self) -> &[DiscreteGene] {
        &self.genes
    }

    #[inline]
    pub fn genes(&self) -> &[DiscreteGene] {
        &self.genes
    }

    #[inline]
    pub fn gene(&self, index: usize) -> Option<&DiscreteGene> {
        self.genes.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Configured slot count.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.constraints.positions
    }

    #[inline]
    pub fn constraints(&self) -> &Arc<GeneConstraints> {
        &self.constraints
    }

    /// Alleles in visiting order.
    pub fn points(&self) -> Vec<DiscretePoint> {
        self.genes.iter().map(|gene| *gene.allele()).collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check length, every gene, and that all genes share these constraints.
    pub fn validate(&self) -> Result<(), RouteError> {
        if self.genes.len() != self.constraints.positions {
            return Err(RouteError::InvalidEncoding(format!(
                "chromosome has {} genes, expected {}",
                self.genes.len(),
                self.constraints.positions
            )));
        }
        for gene in &self.genes {
            if gene.constraints() != &self.constraints {
                return Err(RouteError::ConfigurationMismatch(
                    "gene bound to foreign constraints".to_string(),
                ));
            }
            gene.validate()?;
        }
        Ok(())
    }

    /// Same genes in a uniformly random order.
    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut genes = self.genes.clone();
        genes.shuffle(rng);
        Self::from_genes(Arc::clone(&self.constraints), genes)
    }

    /// Replace the gene at `index`.
    pub(crate) fn set_gene(&mut self, index: usize, gene: DiscreteGene) {
        self.genes[index] = gene;
    }

    /// Exchange two genes wholesale.
    pub(crate) fn swap_genes(&mut self, a: usize, b: usize) {
        self.genes.swap(a, b);
    }

    /// Persisted form.
    pub fn to_record(&self) -> ChromosomeRecord {
        ChromosomeRecord {
            genes: self.genes.iter().map(|gene| (*gene.allele()).into()).collect(),
        }
    }
}

impl std::fmt::Display for DiscreteChromosome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, gene) in self.genes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let allele = gene.allele();
            write!(f, "{}@{:.3}", allele.position(), allele.distance())?;
        }
        f.write_str("]")
    }
}

/// Plain property bag for persisting a [`DiscreteChromosome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromosomeRecord {
    pub genes: Vec<PointRecord>,
}

impl From<&DiscreteChromosome> for ChromosomeRecord {
    fn from(chromosome: &DiscreteChromosome) -> Self {
        chromosome.to_record()
    }
}
