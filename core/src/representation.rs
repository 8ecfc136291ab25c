//! Representation of continental groupings relative to global proportions.

use std::fmt;

use serde::Serialize;

use crate::{
    config::ConfigurationError,
    group::Group,
    metric::Metric,
    sample::{self, Population},
};

/// Tolerance when checking that reference proportions sum to one.
pub const REFERENCE_SUM_TOLERANCE: f64 = 0.01;

/// Expected global proportions of each continental grouping.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceTable([f64; Group::COUNT]);

impl ReferenceTable {
    /// Creates a new reference table.
    ///
    /// # Errors
    ///
    /// Each of the seven groupings must be given exactly once, with a finite, positive proportion,
    /// and the proportions must sum to one within [`REFERENCE_SUM_TOLERANCE`].
    pub fn new<I>(proportions: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (Group, f64)>,
    {
        let mut table = [None; Group::COUNT];

        for (group, proportion) in proportions {
            if !(proportion.is_finite() && proportion > 0.0 && proportion <= 1.0) {
                return Err(ConfigurationError::InvalidReferenceProportion { group, proportion });
            }

            match &mut table[group as usize] {
                Some(_) => return Err(ConfigurationError::DuplicateReferenceGroup { group }),
                entry => *entry = Some(proportion),
            }
        }

        let mut proportions = [0.0; Group::COUNT];
        for (group, (entry, proportion)) in Group::ALL
            .into_iter()
            .zip(table.into_iter().zip(proportions.iter_mut()))
        {
            *proportion = entry.ok_or(ConfigurationError::MissingReferenceGroup { group })?;
        }

        let sum = proportions.iter().sum::<f64>();
        if (sum - 1.0).abs() > REFERENCE_SUM_TOLERANCE {
            return Err(ConfigurationError::ReferenceSum { sum });
        }

        Ok(Self(proportions))
    }

    /// Creates a new reference table from population codes.
    ///
    /// # Errors
    ///
    /// If any code does not name a continental grouping, or see [`ReferenceTable::new`].
    pub fn from_codes<'a, I>(proportions: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let proportions = proportions
            .into_iter()
            .map(|(code, proportion)| {
                code.parse::<Group>()
                    .map(|group| (group, proportion))
                    .map_err(|e| ConfigurationError::UnknownReferenceGroup { code: e.0 })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(proportions)
    }

    /// Returns the expected proportion of a group.
    pub fn get(&self, group: Group) -> f64 {
        self.0[group as usize]
    }

    /// Returns an iterator over groups and their expected proportions.
    pub fn iter(&self) -> impl Iterator<Item = (Group, f64)> + '_ {
        Group::ALL.into_iter().zip(self.0.iter().copied())
    }
}

impl Default for ReferenceTable {
    /// Approximate global proportions of the 1000 Genomes superpopulations.
    fn default() -> Self {
        Self([0.17, 0.13, 0.22, 0.16, 0.26, 0.005, 0.06])
    }
}

/// How deviation from the reference proportions is measured.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// `1 - max |observed - expected|`.
    #[default]
    AbsoluteDifference,
    /// `1 - max |observed - expected| / expected`.
    RelativeDeviation,
}

impl Formula {
    fn deviation(self, observed: f64, expected: f64) -> f64 {
        match self {
            Formula::AbsoluteDifference => (observed - expected).abs(),
            Formula::RelativeDeviation => (observed - expected).abs() / expected,
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::AbsoluteDifference => f.write_str("absolute difference"),
            Formula::RelativeDeviation => f.write_str("relative deviation"),
        }
    }
}

/// Observed and expected proportion of a continental grouping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GroupProportion {
    /// The grouping.
    pub group: Group,
    /// Number of samples assigned to the grouping.
    pub samples: usize,
    /// Observed fraction of all samples.
    pub observed: f64,
    /// Reference proportion.
    pub expected: f64,
}

/// The representation index and the proportions it was computed from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Representation {
    /// Index in [0, 1], larger for proportions closer to the reference, or undefined.
    pub index: Metric,
    /// Fraction of samples with unknown population or a label outside the reference groupings.
    pub unmapped_fraction: f64,
    /// Proportions per grouping, in canonical order.
    pub groups: Vec<GroupProportion>,
    /// Warning about unmapped samples, if any.
    pub warning: Option<String>,
}

impl Representation {
    /// Calculates the representation index of a sample mapping.
    ///
    /// If the unmapped fraction exceeds `unknown_threshold`, the index is undefined rather than
    /// computed from the mapped minority, and a warning is logged and recorded.
    pub fn calculate(
        samples: &sample::Map,
        reference: &ReferenceTable,
        formula: Formula,
        unknown_threshold: f64,
    ) -> Self {
        let total = samples.len();

        let mut counts = [0usize; Group::COUNT];
        let mut unmapped = 0;
        for (id, size) in samples.population_sizes().into_iter().enumerate() {
            match samples.population(sample::population::Id(id)).and_then(Population::group) {
                Some(group) => counts[group as usize] += size,
                None => unmapped += size,
            }
        }

        let fraction = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };

        let unmapped_fraction = fraction(unmapped);
        let groups = reference
            .iter()
            .map(|(group, expected)| GroupProportion {
                group,
                samples: counts[group as usize],
                observed: fraction(counts[group as usize]),
                expected,
            })
            .collect::<Vec<_>>();

        let (index, warning) = if total == 0 {
            let reason = String::from("no samples provided");
            (Metric::Undefined(reason.clone()), Some(reason))
        } else if unmapped_fraction > unknown_threshold {
            let warning = format!(
                "{:.1}% of samples ({unmapped} of {total}) have an unknown or unmapped population, \
                    exceeding the threshold of {:.1}%; representation index is undefined",
                unmapped_fraction * 100.0,
                unknown_threshold * 100.0,
            );
            let reason = format!(
                "{:.1}% of samples have unknown or unmapped population",
                unmapped_fraction * 100.0
            );
            (Metric::Undefined(reason), Some(warning))
        } else {
            let max_deviation = groups
                .iter()
                .map(|g| formula.deviation(g.observed, g.expected))
                .fold(0.0, f64::max);

            let warning = (unmapped > 0).then(|| {
                format!(
                    "{:.1}% of samples ({unmapped} of {total}) have an unknown or unmapped \
                        population; representation index may be affected",
                    unmapped_fraction * 100.0
                )
            });

            (
                Metric::Defined((1.0 - max_deviation).clamp(0.0, 1.0)),
                warning,
            )
        };

        if let Some(warning) = &warning {
            log::warn!("{warning}");
        }

        Self {
            index,
            unmapped_fraction,
            groups,
            warning,
        }
    }

    /// Returns the number of distinct groupings with at least one sample.
    pub fn represented_groups(&self) -> usize {
        self.groups.iter().filter(|g| g.samples > 0).count()
    }
}
