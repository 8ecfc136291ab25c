//! The analysis engine.

use std::fmt;

use crate::{
    config::{Config, ConfigurationError},
    frequency::AlleleFrequencies,
    fst::FstMatrix,
    genotype::{Matrix, StructuralError},
    heterozygosity::{self, Heterozygosity},
    metric::Metric,
    pca,
    representation::Representation,
    sample,
    score::{self, Components, HeimScore},
};

pub mod analysis;
pub use analysis::{Analysis, FstTable, Issue, PopulationSummary};

/// Reason given for genotype-based metrics when only labels are analysed.
const NO_GENOTYPES: &str = "no genotype matrix supplied";

/// An engine computing HEIM equity metrics.
///
/// The engine holds only its validated configuration, and each analysis is independent of any
/// other. The same engine can be shared between threads.
#[derive(Clone, Debug)]
pub struct Engine {
    config: Config,
}

impl Engine {
    /// Creates a new engine.
    ///
    /// # Errors
    ///
    /// If the configuration is invalid. No computation runs with an invalid configuration.
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self { config })
    }

    /// Runs the full analysis of a genotype matrix.
    ///
    /// Sample columns of the matrix must be in the order of `samples`. Samples with unknown
    /// population are excluded from heterozygosity and FST, but included in PCA and the
    /// representation index.
    ///
    /// # Errors
    ///
    /// If the number of samples in the matrix and the mapping disagree.
    pub fn analyze(&self, matrix: &Matrix, samples: &sample::Map) -> Result<Analysis, Error> {
        if matrix.samples() != samples.len() {
            return Err(StructuralError::SampleCountMismatch {
                matrix: matrix.samples(),
                assigned: samples.len(),
            }
            .into());
        }

        log::info!(
            "Analysing {} variants for {} samples in {} populations",
            matrix.variants(),
            matrix.samples(),
            samples.number_of_populations(),
        );
        log::debug!(
            "Fraction of missing genotypes: {:.4}",
            matrix.missing_fraction()
        );

        let indices = samples.population_indices();
        let named = samples
            .populations()
            .filter(|(_, population)| !population.is_unknown())
            .map(|(id, population)| (id, population.to_string()))
            .collect::<Vec<_>>();
        let groups = named
            .iter()
            .map(|(id, _)| indices[id.0].as_slice())
            .collect::<Vec<_>>();

        let frequencies = AlleleFrequencies::estimate(matrix, &groups);
        let heterozygosity =
            heterozygosity::calculate(matrix, &groups, &frequencies, self.config.min_sites());
        let fst = FstMatrix::calculate(&frequencies, self.config.polymorphism_threshold());
        let pca = pca::project(matrix, self.config.components());
        let representation = self.representation(samples);

        let components = Components {
            representation_index: representation.index.clone(),
            heterozygosity_balance: score::heterozygosity_balance(&heterozygosity),
            fst_coverage: score::fst_coverage(&fst),
            geographic_spread: score::geographic_spread(&representation),
        };
        let score = self.score(components);

        let populations = summarise(samples, |id| {
            named
                .iter()
                .position(|(named_id, _)| *named_id == id)
                .map(|i| heterozygosity[i])
        });

        let fst = FstTable {
            populations: named.into_iter().map(|(_, name)| name).collect(),
            matrix: fst,
        };

        Ok(Analysis::new(
            samples.len(),
            Some(matrix.variants()),
            populations,
            Some(fst),
            Some(pca),
            representation,
            score,
        ))
    }

    /// Runs the analysis of population labels only.
    ///
    /// Representation index and geographic spread are computed from the labels. Heterozygosity
    /// balance and FST coverage cannot be, and are undefined, so the HEIM score reports
    /// insufficient data.
    ///
    /// # Errors
    ///
    /// If there are no samples.
    pub fn analyze_labels(&self, samples: &sample::Map) -> Result<Analysis, Error> {
        if samples.is_empty() {
            return Err(StructuralError::NoSamples.into());
        }

        log::info!(
            "Analysing population labels for {} samples in {} populations",
            samples.len(),
            samples.number_of_populations(),
        );

        let representation = self.representation(samples);

        let components = Components {
            representation_index: representation.index.clone(),
            heterozygosity_balance: Metric::Undefined(String::from(NO_GENOTYPES)),
            fst_coverage: Metric::Undefined(String::from(NO_GENOTYPES)),
            geographic_spread: score::geographic_spread(&representation),
        };
        let score = self.score(components);

        let populations = summarise(samples, |_| None);

        Ok(Analysis::new(
            samples.len(),
            None,
            populations,
            None,
            None,
            representation,
            score,
        ))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn representation(&self, samples: &sample::Map) -> Representation {
        Representation::calculate(
            samples,
            self.config.reference(),
            self.config.formula(),
            self.config.unknown_threshold(),
        )
    }

    fn score(&self, components: Components) -> HeimScore {
        let score = HeimScore::new(components, self.config.weights());

        match &score {
            HeimScore::Score { value, rating, .. } => {
                log::info!("HEIM score: {value:.1} ({rating})")
            }
            HeimScore::InsufficientData { undefined, .. } => {
                for component in undefined {
                    log::warn!("Insufficient data for HEIM score, {component}");
                }
            }
        }

        score
    }
}

fn summarise<F>(samples: &sample::Map, mut heterozygosity: F) -> Vec<PopulationSummary>
where
    F: FnMut(sample::population::Id) -> Option<Heterozygosity>,
{
    let sizes = samples.population_sizes();

    samples
        .populations()
        .map(|(id, population)| PopulationSummary {
            name: population.to_string(),
            group: population.group(),
            samples: sizes[id.0],
            heterozygosity: heterozygosity(id),
        })
        .collect()
}

/// An error that stops an analysis.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Malformed input.
    Structural(StructuralError),
    /// Invalid configuration.
    Configuration(ConfigurationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Structural(e) => write!(f, "malformed input: {e}"),
            Error::Configuration(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StructuralError> for Error {
    fn from(e: StructuralError) -> Self {
        Self::Structural(e)
    }
}

impl From<ConfigurationError> for Error {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{score::Component, utils::MISSING, Group, Weights};

    /// Deterministic generator for synthetic genotypes.
    struct SplitMix(u64);

    impl SplitMix {
        fn next_f64(&mut self) -> f64 {
            self.0 = self.0.wrapping_add(0x9e3779b97f4a7c15);
            let mut z = self.0;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
            z ^= z >> 31;
            (z >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    const FIXTURE: [(&str, usize, f64); 5] = [
        ("AFR", 8, 0.5),
        ("AMR", 5, 0.15),
        ("EAS", 7, 0.3),
        ("EUR", 22, 0.2),
        ("SAS", 8, 0.25),
    ];

    fn fixture() -> (Matrix, sample::Map) {
        let samples = sample::Map::try_from_iter(FIXTURE.iter().flat_map(|&(population, n, _)| {
            (0..n).map(move |i| (format!("{population}_{i:03}"), population))
        }))
        .unwrap();

        let frequencies = FIXTURE
            .iter()
            .flat_map(|&(_, n, p)| std::iter::repeat(p).take(n))
            .collect::<Vec<_>>();

        let mut rng = SplitMix(2024);
        let rows = (0..500)
            .map(|v| {
                frequencies
                    .iter()
                    .enumerate()
                    .map(|(s, &p)| {
                        if (v + s) % 97 == 0 {
                            MISSING
                        } else {
                            let alleles = (rng.next_f64() < p) as u8 + (rng.next_f64() < p) as u8;
                            f64::from(alleles)
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        (Matrix::from_rows(rows).unwrap(), samples)
    }

    #[test]
    fn test_fixture_scenario() {
        let (matrix, samples) = fixture();
        let engine = Engine::new(Config::default()).unwrap();

        let analysis = engine.analyze(&matrix, &samples).unwrap();

        assert_eq!(analysis.samples, 50);
        assert_eq!(analysis.variants, Some(500));

        let heterozygosity = analysis
            .populations
            .iter()
            .map(|p| p.heterozygosity.unwrap().observed)
            .collect::<Vec<_>>();
        assert!(heterozygosity[1..].iter().all(|&h| h < heterozygosity[0]));

        let fst = analysis.fst.as_ref().unwrap();
        assert_eq!(fst.populations, vec!["AFR", "AMR", "EAS", "EUR", "SAS"]);
        assert_eq!(fst.matrix.defined_pairs(), 10);

        let components = analysis.score.components();
        assert_approx_eq!(
            components.representation_index.value().unwrap(),
            0.72,
            epsilon = 1e-9
        );
        assert_eq!(components.fst_coverage, Metric::Defined(1.0));
        assert_approx_eq!(components.geographic_spread.value().unwrap(), 5.0 / 7.0);

        let value = analysis.score.value().unwrap();
        assert!((0.0..=100.0).contains(&value));

        assert_eq!(analysis.pca.as_ref().unwrap().components.len(), 10);
    }

    #[test]
    fn test_rerun_is_bit_identical() {
        let (matrix, samples) = fixture();
        let engine = Engine::new(Config::default().set_components(4)).unwrap();

        let first = engine.analyze(&matrix, &samples).unwrap();
        let second = engine.analyze(&matrix, &samples).unwrap();

        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn test_labels_only() {
        let (_, samples) = fixture();
        let engine = Engine::new(Config::default()).unwrap();

        let analysis = engine.analyze_labels(&samples).unwrap();

        let components = analysis.score.components();
        assert!(components.representation_index.is_defined());
        assert!(components.geographic_spread.is_defined());
        assert_eq!(
            components.heterozygosity_balance,
            Metric::Undefined(String::from(NO_GENOTYPES))
        );
        assert_eq!(
            components.fst_coverage,
            Metric::Undefined(String::from(NO_GENOTYPES))
        );
        assert_eq!(analysis.score.value(), None);
        assert!(analysis.fst.is_none());
        assert!(analysis.pca.is_none());

        let subjects = analysis
            .data_quality()
            .iter()
            .map(|issue| issue.subject.as_str())
            .collect::<Vec<_>>();
        assert!(subjects.contains(&Component::HeterozygosityBalance.name()));
        assert!(subjects.contains(&Component::FstCoverage.name()));
    }

    #[test]
    fn test_labels_only_without_samples() {
        let engine = Engine::new(Config::default()).unwrap();

        assert_eq!(
            engine.analyze_labels(&sample::Map::default()).unwrap_err(),
            Error::Structural(StructuralError::NoSamples)
        );
    }

    #[test]
    fn test_sample_count_mismatch() {
        let (matrix, _) = fixture();
        let samples = sample::Map::try_from_iter([("a", "AFR"), ("b", "EUR")]).unwrap();
        let engine = Engine::new(Config::default()).unwrap();

        assert_eq!(
            engine.analyze(&matrix, &samples).unwrap_err(),
            Error::Structural(StructuralError::SampleCountMismatch {
                matrix: 50,
                assigned: 2
            })
        );
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let weights = Weights::new(0.25, 0.25, 0.25, 0.25).unwrap();
        assert!(Engine::new(Config::default().set_weights(weights)).is_ok());

        assert!(matches!(
            Engine::new(Config::default().set_min_sites(0)),
            Err(Error::Configuration(ConfigurationError::InvalidMinSites))
        ));
    }

    #[test]
    fn test_unknown_population_excluded_from_fst() {
        let matrix = Matrix::from_rows([
            [0.0, 0.0, 2.0, 2.0, 1.0, 1.0],
            [0.0, 1.0, 2.0, 1.0, 0.0, 2.0],
        ])
        .unwrap();
        let samples = sample::Map::try_from_iter([
            ("a0", "AFR"),
            ("a1", "AFR"),
            ("e0", "EUR"),
            ("e1", "EUR"),
            ("u0", "unknown"),
            ("u1", "unknown"),
        ])
        .unwrap();
        let engine = Engine::new(Config::default().set_components(2)).unwrap();

        let analysis = engine.analyze(&matrix, &samples).unwrap();

        let fst = analysis.fst.as_ref().unwrap();
        assert_eq!(fst.populations, vec!["AFR", "EUR"]);
        assert_eq!(fst.matrix.pairs(), 1);

        let unknown = &analysis.populations[2];
        assert_eq!(unknown.samples, 2);
        assert_eq!(unknown.group, None);
        assert!(unknown.heterozygosity.is_none());

        assert_approx_eq!(analysis.representation.unmapped_fraction, 1.0 / 3.0);
        assert!(analysis.warnings.iter().any(|w| w.contains("33.3%")));
        assert_eq!(
            analysis.representation.groups[Group::Afr as usize].samples,
            2
        );
    }

    #[test]
    fn test_single_population_has_undefined_fst_coverage() {
        let matrix = Matrix::from_rows([[0.0, 1.0, 2.0], [1.0, 1.0, 0.0]]).unwrap();
        let samples =
            sample::Map::try_from_iter([("a", "AFR"), ("b", "AFR"), ("c", "AFR")]).unwrap();
        let engine = Engine::new(Config::default()).unwrap();

        let analysis = engine.analyze(&matrix, &samples).unwrap();

        assert!(!analysis.score.components().fst_coverage.is_defined());
        assert!(matches!(analysis.score, HeimScore::InsufficientData { .. }));
    }

    #[test]
    fn test_group_labels_match_in_any_case() {
        let matrix = Matrix::from_rows([[0.0, 1.0, 2.0, 2.0], [1.0, 0.0, 0.0, 1.0]]).unwrap();
        let samples =
            sample::Map::try_from_iter([("a", "afr"), ("b", "AFR"), ("c", "EUR"), ("d", "eur")])
                .unwrap();
        let engine = Engine::new(Config::default().set_components(2)).unwrap();

        let analysis = engine.analyze(&matrix, &samples).unwrap();

        let fst = analysis.fst.as_ref().unwrap();
        assert_eq!(fst.populations, vec!["AFR", "EUR"]);
        assert!(fst.matrix.get(0, 1).unwrap() > 0.0);
        assert_eq!(
            analysis.score.components().fst_coverage,
            Metric::Defined(1.0)
        );
        assert!(analysis.populations.iter().all(|p| p.samples == 2));
    }

    #[test]
    fn test_relabelled_sample_is_rejected() {
        let result =
            sample::Map::try_from_iter([("a", "AFR"), ("a", "EUR"), ("b", "EUR"), ("c", "EAS")]);

        let error = Error::from(result.unwrap_err());

        assert_eq!(
            error.to_string(),
            "malformed input: sample 'a' is assigned a population more than once"
        );
    }
}
