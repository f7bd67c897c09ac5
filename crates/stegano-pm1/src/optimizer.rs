//! Genetic optimization of PM1 embedding parameters.
//!
//! Two searches run back to back:
//! 1. the embedding seed that changes the fewest coefficients
//! 2. for that seed, the plus-minus sequence whose stego image is least blocky
//!
//! The winning pair is then used for the real embedding.

use std::sync::Arc;

use fastrand::Rng;
use stegano_genetic::{Chromosome, GaParameters, GeneticAlgorithm, RankSelection};

use crate::blockiness::{BlockinessMetric, CroppedEstimate};
use crate::error::Result;
use crate::fitness::{Blockiness, SeedChangeCount};
use crate::image::CoverImage;
use crate::protocol::{required_sequence_len, SequenceIndexing, SEED_BITS};
use crate::request::EmbedRequest;
use crate::Pm1Embedder;

/// Settings of one genetic search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaSettings {
    pub population_size: usize,
    pub generations: usize,
    pub elitism_rate: f64,
    pub mutation_rate: f64,
    /// Rank selection gradient, expected offspring of the best over the worst.
    pub selection_gradient: f64,
}

impl GaSettings {
    /// Seed search defaults: population 50, 50 generations, elitism 0.4, mutation 0.3.
    pub fn default_seed_search() -> Self {
        GaSettings {
            population_size: 50,
            generations: 50,
            elitism_rate: 0.4,
            mutation_rate: 0.3,
            selection_gradient: 10.0,
        }
    }

    /// Sequence search defaults: population 50, 50 generations, elitism 0.5, mutation 0.1.
    pub fn default_sequence_search() -> Self {
        GaSettings {
            population_size: 50,
            generations: 50,
            elitism_rate: 0.5,
            mutation_rate: 0.1,
            selection_gradient: 10.0,
        }
    }

    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_selection_gradient(mut self, gradient: f64) -> Self {
        self.selection_gradient = gradient;
        self
    }

    fn parameters(&self, chromosome_size: usize) -> GaParameters {
        GaParameters::new(self.population_size, chromosome_size)
            .with_elitism_rate(self.elitism_rate)
            .with_mutation_rate(self.mutation_rate)
    }
}

/// Options for [`GeneticPm1`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneticPm1Options {
    pub seed_search: GaSettings,
    pub sequence_search: GaSettings,
    pub indexing: SequenceIndexing,
    /// Seed of the search's random source, `None` for a random one.
    pub rng_seed: Option<u64>,
}

impl Default for GeneticPm1Options {
    fn default() -> Self {
        Self {
            seed_search: GaSettings::default_seed_search(),
            sequence_search: GaSettings::default_sequence_search(),
            indexing: SequenceIndexing::default(),
            rng_seed: None,
        }
    }
}

impl GeneticPm1Options {
    pub fn with_seed_search(mut self, settings: GaSettings) -> Self {
        self.seed_search = settings;
        self
    }

    pub fn with_sequence_search(mut self, settings: GaSettings) -> Self {
        self.sequence_search = settings;
        self
    }

    pub fn with_indexing(mut self, indexing: SequenceIndexing) -> Self {
        self.indexing = indexing;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

/// Result of an optimized embedding.
#[derive(Debug, Clone)]
pub struct OptimizedEmbedding {
    pub image: CoverImage,
    pub seed: u16,
    pub sequence: Chromosome,
    /// Change-count fitness of the chosen seed.
    pub seed_fitness: f64,
    /// Blockiness fitness of the chosen sequence.
    pub sequence_fitness: f64,
}

/// PM1 embedding with genetically optimized seed and plus-minus sequence.
pub struct GeneticPm1 {
    options: GeneticPm1Options,
    metric: Arc<dyn BlockinessMetric>,
}

impl Default for GeneticPm1 {
    fn default() -> Self {
        Self::new(GeneticPm1Options::default())
    }
}

impl GeneticPm1 {
    pub fn new(options: GeneticPm1Options) -> Self {
        Self::with_metric(options, Arc::new(CroppedEstimate::default()))
    }

    pub fn with_metric(options: GeneticPm1Options, metric: Arc<dyn BlockinessMetric>) -> Self {
        GeneticPm1 { options, metric }
    }

    pub fn options(&self) -> &GeneticPm1Options {
        &self.options
    }

    /// Embeds the request's message, returning only the stego image.
    pub fn embed(&self, request: &EmbedRequest) -> Result<CoverImage> {
        Ok(self.optimize(request)?.image)
    }

    /// Runs both searches and embeds with the best parameters found.
    pub fn optimize(&self, request: &EmbedRequest) -> Result<OptimizedEmbedding> {
        let mut rng = match self.options.rng_seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };

        let (seed, seed_fitness) = self.search_seed(request, rng.fork())?;
        log::debug!("best embedding seed {seed:#06x} with change fitness {seed_fitness:.4}");

        let (sequence, image, sequence_fitness) =
            self.search_sequence(request, seed, rng.fork())?;
        log::debug!("best plus-minus sequence with blockiness fitness {sequence_fitness:.4}");

        Ok(OptimizedEmbedding {
            image,
            seed,
            sequence,
            seed_fitness,
            sequence_fitness,
        })
    }

    fn search_seed(&self, request: &EmbedRequest, rng: Rng) -> Result<(u16, f64)> {
        let settings = &self.options.seed_search;
        let mut ga = GeneticAlgorithm::new(
            settings.parameters(SEED_BITS),
            || SeedChangeCount::new(request.clone()),
            RankSelection::new(settings.selection_gradient)?,
            rng,
        )?;
        // at least one generation so the best individual is evaluated
        ga.run_generations(settings.generations.max(1))?;
        let mut best = ga.into_best();
        let fitness = best.calculate_fitness()?;
        Ok((best.chromosome().as_u16(), fitness))
    }

    fn search_sequence(
        &self,
        request: &EmbedRequest,
        seed: u16,
        rng: Rng,
    ) -> Result<(Chromosome, CoverImage, f64)> {
        let settings = &self.options.sequence_search;
        let indexing = self.options.indexing;
        let length = required_sequence_len(request.message().len(), indexing);

        let mut ga = GeneticAlgorithm::new(
            settings.parameters(length),
            || {
                Blockiness::new(request.clone(), seed, Arc::clone(&self.metric))
                    .with_indexing(indexing)
            },
            RankSelection::new(settings.selection_gradient)?,
            rng,
        )?;
        ga.run_generations(settings.generations.max(1))?;

        let mut best = ga.into_best();
        let fitness = best.calculate_fitness()?;
        let (sequence, phenotype) = best.into_parts();
        let image = match phenotype.into_stego() {
            Some(image) => image,
            None => Pm1Embedder::new(&sequence)
                .with_indexing(indexing)
                .embed(request, seed)?,
        };
        Ok((sequence, image, fitness))
    }
}
