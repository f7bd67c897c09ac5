//! Phenotypes that score PM1 embedding parameters.

use std::sync::Arc;

use stegano_genetic::{BoxError, Chromosome, Phenotype};

use crate::blockiness::BlockinessMetric;
use crate::image::CoverImage;
use crate::protocol::{AlwaysDecrement, SequenceIndexing};
use crate::request::EmbedRequest;
use crate::Pm1Embedder;

/// Reads a 16-bit chromosome as the embedding seed and scores the number of
/// coefficients an embedding with that seed would change.
#[derive(Debug, Clone)]
pub struct SeedChangeCount {
    request: EmbedRequest,
    changes: usize,
}

impl SeedChangeCount {
    pub fn new(request: EmbedRequest) -> Self {
        SeedChangeCount {
            request,
            changes: 0,
        }
    }

    /// Changes counted by the last simulation.
    pub fn changes(&self) -> usize {
        self.changes
    }
}

impl Phenotype for SeedChangeCount {
    fn simulate(&mut self, chromosome: &Chromosome) -> Result<(), BoxError> {
        self.changes = Pm1Embedder::new(AlwaysDecrement)
            .count_changes(&self.request, chromosome.as_u16())?;
        Ok(())
    }

    fn fitness(&mut self, _chromosome: &Chromosome) -> f64 {
        let bits = (self.request.message().len() + 16) * 8;
        self.changes as f64 / bits as f64
    }
}

/// Uses the chromosome as the plus-minus sequence for an embedding with a fixed
/// seed and scores how far the stego image's blockiness drifts from its estimate.
#[derive(Clone)]
pub struct Blockiness {
    request: EmbedRequest,
    seed: u16,
    indexing: SequenceIndexing,
    metric: Arc<dyn BlockinessMetric>,
    stego: Option<CoverImage>,
    ratio: f64,
}

impl Blockiness {
    pub fn new(request: EmbedRequest, seed: u16, metric: Arc<dyn BlockinessMetric>) -> Self {
        Blockiness {
            request,
            seed,
            indexing: SequenceIndexing::default(),
            metric,
            stego: None,
            ratio: 0.0,
        }
    }

    pub fn with_indexing(mut self, indexing: SequenceIndexing) -> Self {
        self.indexing = indexing;
        self
    }

    /// Stego image produced by the last simulation.
    pub fn stego(&self) -> Option<&CoverImage> {
        self.stego.as_ref()
    }

    pub fn into_stego(self) -> Option<CoverImage> {
        self.stego
    }
}

impl Phenotype for Blockiness {
    fn simulate(&mut self, chromosome: &Chromosome) -> Result<(), BoxError> {
        let stego = Pm1Embedder::new(chromosome)
            .with_indexing(self.indexing)
            .embed(&self.request, self.seed)?;
        self.ratio = self.metric.blockiness_ratio(&stego)?;
        self.stego = Some(stego);
        Ok(())
    }

    fn fitness(&mut self, _chromosome: &Chromosome) -> f64 {
        1.0 - self.ratio
    }
}
