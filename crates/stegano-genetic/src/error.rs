//! Error types for the genetic search.

use std::fmt;
use thiserror::Error;

/// Boxed error raised by a phenotype while it simulates a chromosome.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for genetic operations.
pub type Result<T> = std::result::Result<T, GeneticError>;

/// Errors that can occur while evolving a population.
#[derive(Error)]
pub enum GeneticError {
    /// Fitness was requested from an individual whose chromosome changed since the last simulation.
    #[error("individual has not been simulated since its chromosome last changed")]
    NotSimulated,

    /// A phenotype reported a fitness outside of `[0, 1]`.
    #[error("fitness {fitness} is outside of [0, 1]")]
    FitnessOutOfRange { fitness: f64 },

    /// Crossover partners must carry chromosomes of the same length.
    #[error("chromosome length mismatch: {left} vs {right}")]
    ChromosomeLengthMismatch { left: usize, right: usize },

    /// Crossover point must address a bit of the chromosome.
    #[error("crossover index {index} is out of range for a chromosome of {len} bits")]
    CrossoverIndexOutOfRange { index: usize, len: usize },

    /// A parameter of the algorithm or of an operator is invalid.
    #[error("invalid parameter `{param}`: {reason}")]
    InvalidParameter { param: &'static str, reason: String },

    /// The phenotype failed to simulate a chromosome.
    #[error("simulation failed: {0}")]
    Simulation(#[source] BoxError),
}

impl fmt::Debug for GeneticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
