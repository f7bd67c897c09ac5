//! Candidate solutions and their simulate-then-evaluate lifecycle.

use std::cmp::Ordering;

use crate::chromosome::Chromosome;
use crate::error::{BoxError, GeneticError, Result};

/// Problem-specific interpretation of a chromosome.
///
/// `simulate` does the expensive work for the current chromosome, `fitness` turns the
/// simulation outcome into a score in `[0, 1]` where lower is better.
pub trait Phenotype: Send {
    fn simulate(&mut self, chromosome: &Chromosome) -> std::result::Result<(), BoxError>;

    fn fitness(&mut self, chromosome: &Chromosome) -> f64;
}

impl<T: Phenotype + ?Sized> Phenotype for Box<T> {
    fn simulate(&mut self, chromosome: &Chromosome) -> std::result::Result<(), BoxError> {
        (**self).simulate(chromosome)
    }

    fn fitness(&mut self, chromosome: &Chromosome) -> f64 {
        (**self).fitness(chromosome)
    }
}

/// A chromosome paired with its phenotype.
///
/// Any change to the chromosome marks the individual dirty; fitness can only be
/// computed after a fresh [`Individual::simulate`].
#[derive(Debug, Clone)]
pub struct Individual<P> {
    chromosome: Chromosome,
    phenotype: P,
    simulated: bool,
    fitness: Option<f64>,
}

impl<P: Phenotype> Individual<P> {
    pub fn new(chromosome: Chromosome, phenotype: P) -> Self {
        Self {
            chromosome,
            phenotype,
            simulated: false,
            fitness: None,
        }
    }

    /// Runs the phenotype's simulation for the current chromosome.
    ///
    /// Does nothing while the individual is already simulated.
    pub fn simulate(&mut self) -> Result<()> {
        if self.simulated {
            return Ok(());
        }
        self.phenotype
            .simulate(&self.chromosome)
            .map_err(GeneticError::Simulation)?;
        self.simulated = true;
        self.fitness = None;
        Ok(())
    }

    /// Computes and caches the fitness of the last simulation.
    pub fn calculate_fitness(&mut self) -> Result<f64> {
        if !self.simulated {
            return Err(GeneticError::NotSimulated);
        }
        if let Some(fitness) = self.fitness {
            return Ok(fitness);
        }
        let fitness = self.phenotype.fitness(&self.chromosome);
        if !(0.0..=1.0).contains(&fitness) {
            return Err(GeneticError::FitnessOutOfRange { fitness });
        }
        self.fitness = Some(fitness);
        Ok(fitness)
    }

    /// Simulates and evaluates in one step.
    pub fn evaluate(&mut self) -> Result<f64> {
        self.simulate()?;
        self.calculate_fitness()
    }

    /// Cached fitness, `None` while dirty or not yet evaluated.
    #[inline]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    #[inline]
    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    /// Crosses this individual's chromosome with `other`'s at a random point.
    pub fn crossover<Q: Phenotype>(&mut self, other: &mut Individual<Q>) -> Result<()> {
        self.crossover_inner(other, None)
    }

    /// Crosses this individual's chromosome with `other`'s, swapping bits from `index` on.
    pub fn crossover_at<Q: Phenotype>(
        &mut self,
        other: &mut Individual<Q>,
        index: usize,
    ) -> Result<()> {
        self.crossover_inner(other, Some(index))
    }

    fn crossover_inner<Q: Phenotype>(
        &mut self,
        other: &mut Individual<Q>,
        index: Option<usize>,
    ) -> Result<()> {
        self.mark_dirty();
        other.mark_dirty();
        Chromosome::crossover(&mut self.chromosome, &mut other.chromosome, index)
    }

    /// Flips each bit with probability `rate`.
    pub fn mutate(&mut self, rate: f64) {
        self.mark_dirty();
        self.chromosome.mutate(rate);
    }

    /// Orders fitter (lower) individuals first.
    ///
    /// Individuals without a cached fitness sort after every evaluated one. This
    /// ordering is not consistent with chromosome equality.
    pub fn compare_fitness(&self, other: &Self) -> Ordering {
        match (self.fitness, other.fitness) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    #[inline]
    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    #[inline]
    pub fn phenotype(&self) -> &P {
        &self.phenotype
    }

    pub fn into_parts(self) -> (Chromosome, P) {
        (self.chromosome, self.phenotype)
    }

    fn mark_dirty(&mut self) {
        self.simulated = false;
        self.fitness = None;
    }
}
