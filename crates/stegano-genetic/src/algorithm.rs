//! Generational genetic algorithm with elitism.

use fastrand::Rng;

use crate::chromosome::Chromosome;
use crate::error::{GeneticError, Result};
use crate::individual::{Individual, Phenotype};
use crate::selection::{RankSelection, SelectionOperator};

/// Shape of a genetic search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaParameters {
    /// Number of individuals, must be even.
    pub population_size: usize,
    /// Bits per chromosome.
    pub chromosome_size: usize,
    /// Share of the population carried over unchanged into the next generation.
    pub elitism_rate: f64,
    /// Per-bit flip probability applied to offspring.
    pub mutation_rate: f64,
}

impl GaParameters {
    pub fn new(population_size: usize, chromosome_size: usize) -> Self {
        Self {
            population_size,
            chromosome_size,
            elitism_rate: 0.0,
            mutation_rate: 0.0,
        }
    }

    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Number of elites, `floor(population * elitism_rate)` rounded down to an even count.
    pub fn elites(&self) -> usize {
        let elites = (self.population_size as f64 * self.elitism_rate).floor() as usize;
        let elites = elites.min(self.population_size);
        elites - elites % 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 || self.population_size % 2 != 0 {
            return Err(GeneticError::InvalidParameter {
                param: "population_size",
                reason: format!("must be even and positive, got {}", self.population_size),
            });
        }
        if self.chromosome_size == 0 {
            return Err(GeneticError::InvalidParameter {
                param: "chromosome_size",
                reason: "must be positive".to_string(),
            });
        }
        check_rate("elitism_rate", self.elitism_rate)?;
        check_rate("mutation_rate", self.mutation_rate)
    }
}

fn check_rate(param: &'static str, rate: f64) -> Result<()> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(GeneticError::InvalidParameter {
            param,
            reason: format!("must be within [0, 1], got {rate}"),
        })
    }
}

/// Evolves a population of [`Individual`]s towards lower fitness.
///
/// Every generation simulates and evaluates all individuals and sorts them fittest
/// first. From the second generation on, the non-elite slots are refilled pairwise
/// by selection, crossover and mutation before evaluation.
pub struct GeneticAlgorithm<P, S = RankSelection> {
    params: GaParameters,
    selection: S,
    rng: Rng,
    population: Vec<Individual<P>>,
    generation: usize,
}

impl<P: Phenotype, S: SelectionOperator> GeneticAlgorithm<P, S> {
    /// Builds a random population, asking `factory` for one phenotype per individual.
    pub fn new<F>(params: GaParameters, mut factory: F, selection: S, mut rng: Rng) -> Result<Self>
    where
        F: FnMut() -> P,
    {
        params.validate()?;
        let population = (0..params.population_size)
            .map(|_| {
                let chromosome = Chromosome::random(params.chromosome_size, rng.fork());
                Individual::new(chromosome, factory())
            })
            .collect();

        Ok(Self {
            params,
            selection,
            rng,
            population,
            generation: 0,
        })
    }

    /// Runs exactly `generations` more generations and returns the fittest individual.
    pub fn run_generations(&mut self, generations: usize) -> Result<&Individual<P>> {
        for _ in 0..generations {
            self.run_generation()?;
        }
        Ok(self.best())
    }

    /// Runs generations until the fittest individual scores at or below `threshold`.
    ///
    /// Does not return if the threshold is never reached.
    pub fn run_until(&mut self, threshold: f64) -> Result<&Individual<P>> {
        loop {
            self.run_generation()?;
            if self.best().fitness().is_some_and(|fitness| fitness <= threshold) {
                return Ok(self.best());
            }
        }
    }

    /// Current fittest individual. Only meaningful after at least one generation.
    pub fn best(&self) -> &Individual<P> {
        &self.population[0]
    }

    /// Consumes the algorithm, handing out the fittest individual.
    pub fn into_best(self) -> Individual<P> {
        let mut population = self.population;
        population.swap_remove(0)
    }

    pub fn population(&self) -> &[Individual<P>] {
        &self.population
    }

    /// Number of completed generations.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn params(&self) -> &GaParameters {
        &self.params
    }

    fn run_generation(&mut self) -> Result<()> {
        self.prepare_generation();
        if self.generation > 0 {
            self.reproduce()?;
        }
        self.simulate_population()?;
        self.population.sort_by(|a, b| a.compare_fitness(b));
        self.generation += 1;

        log::debug!(
            "generation {} done, best fitness {:?}",
            self.generation,
            self.best().fitness()
        );
        Ok(())
    }

    fn prepare_generation(&mut self) {
        log::trace!(
            "starting generation {} with {} individuals",
            self.generation,
            self.population.len()
        );
    }

    fn reproduce(&mut self) -> Result<()> {
        let size = self.population.len();
        let mut slot = self.params.elites();

        while slot + 1 < size {
            self.place_selected(slot);
            self.place_selected(slot + 1);

            let (head, tail) = self.population.split_at_mut(slot + 1);
            let (first, second) = (&mut head[slot], &mut tail[0]);
            first.crossover(second)?;
            first.mutate(self.params.mutation_rate);
            second.mutate(self.params.mutation_rate);

            slot += 2;
        }
        Ok(())
    }

    /// Selects a parent among the not yet placed individuals and moves it into `slot`.
    fn place_selected(&mut self, slot: usize) {
        let fitness: Vec<f64> = self.population[slot..]
            .iter()
            .map(|individual| individual.fitness().unwrap_or(1.0))
            .collect();
        let chosen = slot + self.selection.select(&fitness, &mut self.rng);
        // keeps the remaining candidates ranked fittest first
        self.population[slot..=chosen].rotate_right(1);
    }

    #[cfg(not(feature = "parallel"))]
    fn simulate_population(&mut self) -> Result<()> {
        for individual in self.population.iter_mut() {
            individual.evaluate()?;
        }
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn simulate_population(&mut self) -> Result<()> {
        use rayon::prelude::*;

        self.population
            .par_iter_mut()
            .try_for_each(|individual| individual.evaluate().map(drop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingFitness, DirectFitness};

    fn direct_ga(population: usize, seed: u64) -> GeneticAlgorithm<DirectFitness> {
        let params = GaParameters::new(population, 64)
            .with_elitism_rate(0.2)
            .with_mutation_rate(0.05);
        GeneticAlgorithm::new(
            params,
            || DirectFitness,
            RankSelection::new(10.0).unwrap(),
            Rng::with_seed(seed),
        )
        .unwrap()
    }

    #[test]
    fn test_odd_population_is_rejected() {
        let params = GaParameters::new(7, 16);
        let result = GeneticAlgorithm::new(
            params,
            || DirectFitness,
            RankSelection::new(1.0).unwrap(),
            Rng::with_seed(0),
        );
        assert!(matches!(
            result,
            Err(GeneticError::InvalidParameter { param: "population_size", .. })
        ));
    }

    #[test]
    fn test_rates_must_be_probabilities() {
        assert!(GaParameters::new(4, 8).with_mutation_rate(1.5).validate().is_err());
        assert!(GaParameters::new(4, 8).with_elitism_rate(-0.1).validate().is_err());
        assert!(GaParameters::new(4, 8).with_elitism_rate(1.0).validate().is_ok());
    }

    #[test]
    fn test_elites_round_down_to_even() {
        assert_eq!(GaParameters::new(50, 16).with_elitism_rate(0.4).elites(), 20);
        assert_eq!(GaParameters::new(50, 16).with_elitism_rate(0.5).elites(), 24);
        assert_eq!(GaParameters::new(10, 16).with_elitism_rate(0.3).elites(), 2);
        assert_eq!(GaParameters::new(10, 16).with_elitism_rate(1.0).elites(), 10);
    }

    #[test]
    fn test_first_generation_does_not_reproduce() {
        let mut ga = direct_ga(10, 1);
        let chromosomes = |ga: &GeneticAlgorithm<DirectFitness>| -> Vec<Chromosome> {
            ga.population().iter().map(|i| i.chromosome().clone()).collect()
        };
        let mut before = chromosomes(&ga);

        ga.run_generations(1).unwrap();

        let mut after = chromosomes(&ga);
        let key = |c: &Chromosome| c.bits().to_vec();
        before.sort_by_key(key);
        after.sort_by_key(key);
        assert_eq!(before, after);
    }

    #[test]
    fn test_population_is_sorted_after_each_generation() {
        let mut ga = direct_ga(20, 2);
        for _ in 0..5 {
            ga.run_generations(1).unwrap();
            let fitness: Vec<f64> = ga.population().iter().map(|i| i.fitness().unwrap()).collect();
            assert!(fitness.windows(2).all(|w| w[0] <= w[1]), "{fitness:?}");
        }
        assert_eq!(ga.generation(), 5);
    }

    #[test]
    fn test_elitism_never_loses_the_best() {
        let mut ga = direct_ga(20, 3);
        let mut best = ga.run_generations(1).unwrap().fitness().unwrap();

        for _ in 0..30 {
            let next = ga.run_generations(1).unwrap().fitness().unwrap();
            assert!(next <= best, "best fitness went from {best} to {next}");
            best = next;
        }
    }

    #[test]
    fn test_run_until_stops_at_threshold() {
        let params = GaParameters::new(6, 8).with_elitism_rate(0.4).with_mutation_rate(0.1);
        let mut ga = GeneticAlgorithm::new(
            params,
            CountingFitness::default,
            RankSelection::new(10.0).unwrap(),
            Rng::with_seed(4),
        )
        .unwrap();

        // only offspring are simulated again, so reaching 1/5 takes at least five generations
        let best = ga.run_until(0.2).unwrap();
        assert!(best.fitness().is_some_and(|fitness| fitness <= 0.2));
        assert!(ga.generation() >= 5);
        assert!(ga.population()[..2].iter().all(|elite| elite.is_simulated()));
    }

    #[test]
    fn test_elites_are_not_simulated_again() {
        let params = GaParameters::new(6, 8).with_elitism_rate(0.4).with_mutation_rate(0.1);
        let mut ga = GeneticAlgorithm::new(
            params,
            CountingFitness::default,
            RankSelection::new(10.0).unwrap(),
            Rng::with_seed(9),
        )
        .unwrap();

        ga.run_generations(2).unwrap();

        let counts: Vec<u64> =
            ga.population().iter().map(|i| i.phenotype().simulations()).collect();
        assert_eq!(counts.iter().filter(|&&n| n == 2).count(), 4, "{counts:?}");
        assert_eq!(counts.iter().filter(|&&n| n == 1).count(), 2, "{counts:?}");
    }

    struct FixedSelection(usize);

    impl SelectionOperator for FixedSelection {
        fn select(&self, fitness: &[f64], _rng: &mut Rng) -> usize {
            self.0.min(fitness.len() - 1)
        }
    }

    #[test]
    fn test_placement_keeps_remaining_candidates_ranked() {
        let params = GaParameters::new(10, 64).with_mutation_rate(0.05);
        let mut ga =
            GeneticAlgorithm::new(params, || DirectFitness, FixedSelection(4), Rng::with_seed(6))
                .unwrap();
        ga.run_generations(1).unwrap();
        let chosen = ga.population()[4].chromosome().clone();

        ga.place_selected(0);

        assert_eq!(ga.population()[0].chromosome(), &chosen);
        let rest: Vec<f64> = ga.population()[1..].iter().map(|i| i.fitness().unwrap()).collect();
        assert!(rest.windows(2).all(|w| w[0] <= w[1]), "{rest:?}");
    }

    #[test]
    fn test_into_best_returns_fittest() {
        let mut ga = direct_ga(8, 5);
        let expected = ga.run_generations(3).unwrap().chromosome().clone();

        let best = ga.into_best();
        assert_eq!(best.chromosome(), &expected);
    }
}
