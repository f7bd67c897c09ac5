//! Genetic Search for Embedding Parameters
//!
//! A small, problem-agnostic genetic algorithm. Candidate solutions are bit-string
//! [`Chromosome`]s, interpreted by a problem-specific [`Phenotype`]. Lower fitness is
//! better and always lies in `[0, 1]`.
//!
//! # Layer Responsibilities
//!
//! This crate only knows about bits and scores:
//! - Chromosome operators (randomize, mutate, single-point crossover)
//! - The simulate-then-evaluate lifecycle of an [`Individual`]
//! - Linear [`RankSelection`]
//! - The generational driver with elitism ([`GeneticAlgorithm`])
//!
//! What a chromosome means is decided by the caller (e.g. `stegano-pm1`).
//!
//! With the `parallel` feature, the individuals of one generation are simulated on the
//! rayon thread pool.
//!
//! # Example
//!
//! ```
//! use fastrand::Rng;
//! use stegano_genetic::testing::DirectFitness;
//! use stegano_genetic::{GaParameters, GeneticAlgorithm, RankSelection};
//!
//! let params = GaParameters::new(20, 64)
//!     .with_elitism_rate(0.2)
//!     .with_mutation_rate(0.05);
//! let mut ga = GeneticAlgorithm::new(
//!     params,
//!     || DirectFitness,
//!     RankSelection::new(10.0)?,
//!     Rng::with_seed(7),
//! )?;
//!
//! let best = ga.run_generations(10)?;
//! assert!(best.fitness().is_some());
//! # Ok::<(), stegano_genetic::GeneticError>(())
//! ```

mod algorithm;
mod chromosome;
mod error;
mod individual;
mod selection;
pub mod testing;

pub use algorithm::{GaParameters, GeneticAlgorithm};
pub use chromosome::Chromosome;
pub use error::{BoxError, GeneticError, Result};
pub use individual::{Individual, Phenotype};
pub use selection::{RankSelection, SelectionOperator};
