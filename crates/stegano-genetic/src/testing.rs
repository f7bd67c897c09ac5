//! Cheap phenotypes for exercising the algorithm without a real problem behind it.

use crate::chromosome::Chromosome;
use crate::error::BoxError;
use crate::individual::Phenotype;

/// Reads the chromosome as an `f64` and squashes its magnitude into `[0, 1]`.
///
/// Values up to 1 are taken as is, larger ones keep only their leading digits scaled
/// by a tenth. NaN and infinities score the worst possible fitness.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectFitness;

impl Phenotype for DirectFitness {
    fn simulate(&mut self, _chromosome: &Chromosome) -> Result<(), BoxError> {
        Ok(())
    }

    fn fitness(&mut self, chromosome: &Chromosome) -> f64 {
        let value = chromosome.as_f64().abs();
        if !value.is_finite() {
            return 1.0;
        }
        if value <= 1.0 {
            return value;
        }
        let mantissa = value / 10f64.powf(value.log10().floor());
        (mantissa / 10.0).min(1.0)
    }
}

/// Scores `1 / n` where `n` is the number of simulations run so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountingFitness {
    simulations: u64,
}

impl CountingFitness {
    pub fn simulations(&self) -> u64 {
        self.simulations
    }
}

impl Phenotype for CountingFitness {
    fn simulate(&mut self, _chromosome: &Chromosome) -> Result<(), BoxError> {
        self.simulations += 1;
        Ok(())
    }

    fn fitness(&mut self, _chromosome: &Chromosome) -> f64 {
        if self.simulations == 0 {
            1.0
        } else {
            1.0 / self.simulations as f64
        }
    }
}
