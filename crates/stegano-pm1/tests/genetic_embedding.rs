use std::sync::Arc;

use fastrand::Rng;
use stegano_pm1::*;

fn noisy_cover(seed: u64, size: usize) -> CoverImage {
    let mut rng = Rng::with_seed(seed);
    let samples: Vec<u8> = (0..size * size).map(|_| rng.u8(30..230)).collect();
    CoverImage::from_luma(size, size, &samples, 75).unwrap()
}

fn quick_options(rng_seed: u64) -> GeneticPm1Options {
    let small = GaSettings::default_seed_search()
        .with_population_size(8)
        .with_generations(3);
    GeneticPm1Options::default()
        .with_seed_search(small)
        .with_sequence_search(
            GaSettings::default_sequence_search()
                .with_population_size(6)
                .with_generations(2),
        )
        .with_rng_seed(rng_seed)
}

struct ConstantRatio(f64);

impl BlockinessMetric for ConstantRatio {
    fn blockiness_ratio(&self, _stego: &CoverImage) -> Result<f64> {
        Ok(self.0)
    }
}

#[test]
fn ensure_optimized_embedding_can_be_extracted() {
    let message = b"Meet me at the usual place";
    let request = EmbedRequest::new(noisy_cover(1, 64), message.to_vec(), "s3cr3t").unwrap();

    let stego = GeneticPm1::new(quick_options(7)).embed(&request).unwrap();

    assert_eq!(extract(&stego, "s3cr3t").unwrap(), message);
    assert_ne!(&stego, request.cover());
}

#[test]
fn ensure_report_matches_a_plain_embedding() {
    let message = b"reproducible";
    let request = EmbedRequest::new(noisy_cover(2, 64), message.to_vec(), "key").unwrap();

    let report = GeneticPm1::new(quick_options(3)).optimize(&request).unwrap();

    let changes = Pm1Embedder::new(AlwaysDecrement)
        .count_changes(&request, report.seed)
        .unwrap();
    let expected_fitness = changes as f64 / ((message.len() + 16) * 8) as f64;
    assert!((report.seed_fitness - expected_fitness).abs() < 1e-12);

    assert_eq!(
        report.sequence.len(),
        required_sequence_len(message.len(), SequenceIndexing::Continuous)
    );
    let replay = Pm1Embedder::new(&report.sequence)
        .embed(&request, report.seed)
        .unwrap();
    assert_eq!(replay, report.image);
    assert!((0.0..=1.0).contains(&report.sequence_fitness));
}

#[test]
fn ensure_same_rng_seed_gives_same_result() {
    let request = EmbedRequest::new(noisy_cover(3, 48), b"twice".to_vec(), "key").unwrap();

    let first = GeneticPm1::new(quick_options(11)).optimize(&request).unwrap();
    let second = GeneticPm1::new(quick_options(11)).optimize(&request).unwrap();

    assert_eq!(first.seed, second.seed);
    assert_eq!(first.sequence, second.sequence);
    assert_eq!(first.image, second.image);
}

#[test]
fn ensure_per_phase_indexing_round_trips() {
    let message = b"phase by phase";
    let request = EmbedRequest::new(noisy_cover(4, 64), message.to_vec(), "key").unwrap();
    let options = quick_options(5).with_indexing(SequenceIndexing::PerPhase);

    let report = GeneticPm1::new(options).optimize(&request).unwrap();

    assert_eq!(report.sequence.len(), 16 + message.len() * 8);
    assert_eq!(extract(&report.image, "key").unwrap(), message);
}

#[test]
fn ensure_custom_metric_drives_sequence_fitness() {
    let request = EmbedRequest::new(noisy_cover(5, 48), b"metric".to_vec(), "key").unwrap();
    let optimizer = GeneticPm1::with_metric(quick_options(1), Arc::new(ConstantRatio(0.75)));

    let report = optimizer.optimize(&request).unwrap();

    assert!((report.sequence_fitness - 0.25).abs() < 1e-12);
}

#[test]
fn ensure_plain_embedding_spans_components() {
    let mut rng = Rng::with_seed(6);
    let mut component = |blocks: usize| {
        let coefficients: Vec<i16> = (0..blocks * 64)
            .map(|i| if i % 64 == 0 { 80 } else { rng.i16(-6..=6) })
            .collect();
        Component::new(blocks, 1, QuantTable::standard_luma(80), coefficients).unwrap()
    };
    let cover = CoverImage::new(vec![component(20), component(10), component(10)]).unwrap();
    let message: Vec<u8> = (0..150).map(|i| (i * 31) as u8).collect();

    let stego = embed(&cover, &message, "multi").unwrap();

    assert_eq!(stego.usable_coefficients(), cover.usable_coefficients());
    assert_eq!(extract(&stego, "multi").unwrap(), message);
}

#[test]
fn ensure_oversized_message_is_rejected() {
    let cover = noisy_cover(7, 16);
    let message = vec![0x5Au8; cover.usable_coefficient_count() / 8 + 1];

    let result = embed(&cover, &message, "key");

    assert!(matches!(result, Err(Pm1Error::CapacityExceeded { .. })));
}

#[test]
fn ensure_wrong_key_does_not_reveal_message() {
    let message = b"only for the right key";
    let stego = embed(&noisy_cover(8, 64), message, "right").unwrap();

    match extract(&stego, "wrong") {
        Ok(extracted) => assert_ne!(extracted, message),
        Err(e) => assert!(matches!(e, Pm1Error::InsufficientCoefficients { .. })),
    }
}
