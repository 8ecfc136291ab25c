//! The composite HEIM equity score.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{
    config::ConfigurationError,
    fst::FstMatrix,
    group::Group,
    heterozygosity::Heterozygosity,
    metric::Metric,
    representation::Representation,
    utils::{nan_mean, ratio},
};

/// Theoretical maximum expected heterozygosity at a diploid, diallelic site.
pub const MAX_HETEROZYGOSITY: f64 = 0.5;

/// Tolerance when checking that weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A sub-component of the HEIM score.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// Deviation of sample proportions from global proportions.
    RepresentationIndex,
    /// Mean observed heterozygosity relative to its theoretical maximum.
    HeterozygosityBalance,
    /// Fraction of population pairs with defined FST.
    FstCoverage,
    /// Fraction of continental groupings represented.
    GeographicSpread,
}

impl Component {
    /// All components, in the order of their weights.
    pub const ALL: [Component; 4] = [
        Component::RepresentationIndex,
        Component::HeterozygosityBalance,
        Component::FstCoverage,
        Component::GeographicSpread,
    ];

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Component::RepresentationIndex => "representation index",
            Component::HeterozygosityBalance => "heterozygosity balance",
            Component::FstCoverage => "FST coverage",
            Component::GeographicSpread => "geographic spread",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weights of the HEIM score components, summing to one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Weights {
    representation_index: f64,
    heterozygosity_balance: f64,
    fst_coverage: f64,
    geographic_spread: f64,
}

impl Weights {
    /// Creates new weights, in the order of [`Component::ALL`].
    ///
    /// # Errors
    ///
    /// If any weight is negative or not finite, or if the weights do not sum to one within
    /// [`WEIGHT_SUM_TOLERANCE`].
    pub fn new(
        representation_index: f64,
        heterozygosity_balance: f64,
        fst_coverage: f64,
        geographic_spread: f64,
    ) -> Result<Self, ConfigurationError> {
        let weights = Self {
            representation_index,
            heterozygosity_balance,
            fst_coverage,
            geographic_spread,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Returns the weight of a component.
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::RepresentationIndex => self.representation_index,
            Component::HeterozygosityBalance => self.heterozygosity_balance,
            Component::FstCoverage => self.fst_coverage,
            Component::GeographicSpread => self.geographic_spread,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some(component) = Component::ALL.into_iter().find(|&c| {
            let weight = self.get(c);
            !weight.is_finite() || weight < 0.0
        }) {
            return Err(ConfigurationError::InvalidWeight {
                component,
                weight: self.get(component),
            });
        }

        let sum = Component::ALL.into_iter().map(|c| self.get(c)).sum::<f64>();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigurationError::WeightSum { sum });
        }

        Ok(())
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            representation_index: 0.35,
            heterozygosity_balance: 0.25,
            fst_coverage: 0.20,
            geographic_spread: 0.20,
        }
    }
}

impl TryFrom<[f64; 4]> for Weights {
    type Error = ConfigurationError;

    fn try_from([ri, hb, fc, gs]: [f64; 4]) -> Result<Self, Self::Error> {
        Self::new(ri, hb, fc, gs)
    }
}

impl FromStr for Weights {
    type Err = ConfigurationError;

    /// Parses four comma-separated weights.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let weights = s
            .split(',')
            .map(|w| {
                w.trim()
                    .parse::<f64>()
                    .map_err(|_| ConfigurationError::UnparsableWeight {
                        weight: w.trim().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        <[f64; 4]>::try_from(weights.as_slice())
            .map_err(|_| ConfigurationError::WeightCount {
                count: weights.len(),
            })
            .and_then(|[ri, hb, fc, gs]| Self::new(ri, hb, fc, gs))
    }
}

/// Qualitative rating of a HEIM score.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Rating {
    /// Score of at least 80.
    Excellent,
    /// Score of at least 60.
    Good,
    /// Score of at least 40.
    Fair,
    /// Score of at least 20.
    Poor,
    /// Score below 20.
    Critical,
}

impl Rating {
    /// Returns the rating of a score on the 0-100 scale.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Rating::Excellent,
            s if s >= 60.0 => Rating::Good,
            s if s >= 40.0 => Rating::Fair,
            s if s >= 20.0 => Rating::Poor,
            _ => Rating::Critical,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The sub-component values of a HEIM score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Components {
    /// See [`Component::RepresentationIndex`].
    pub representation_index: Metric,
    /// See [`Component::HeterozygosityBalance`].
    pub heterozygosity_balance: Metric,
    /// See [`Component::FstCoverage`].
    pub fst_coverage: Metric,
    /// See [`Component::GeographicSpread`].
    pub geographic_spread: Metric,
}

impl Components {
    /// Returns a component value.
    pub fn get(&self, component: Component) -> &Metric {
        match component {
            Component::RepresentationIndex => &self.representation_index,
            Component::HeterozygosityBalance => &self.heterozygosity_balance,
            Component::FstCoverage => &self.fst_coverage,
            Component::GeographicSpread => &self.geographic_spread,
        }
    }

    /// Returns the undefined components and the reason each is undefined.
    pub fn undefined(&self) -> Vec<UndefinedComponent> {
        Component::ALL
            .into_iter()
            .filter_map(|component| {
                self.get(component)
                    .reason()
                    .map(|reason| UndefinedComponent {
                        component,
                        reason: reason.to_string(),
                    })
            })
            .collect()
    }
}

/// A HEIM score component that could not be computed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct UndefinedComponent {
    /// The component.
    pub component: Component,
    /// Why it is undefined.
    pub reason: String,
}

impl fmt::Display for UndefinedComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.reason)
    }
}

/// The composite HEIM score.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HeimScore {
    /// All components were defined.
    Score {
        /// Score on the 0-100 scale.
        value: f64,
        /// Qualitative rating.
        rating: Rating,
        /// Component values.
        components: Components,
    },
    /// At least one component was undefined, so no score is given.
    InsufficientData {
        /// Undefined components.
        undefined: Vec<UndefinedComponent>,
        /// Component values, including the undefined ones.
        components: Components,
    },
}

impl HeimScore {
    /// Combines components into a score.
    ///
    /// If any component is undefined, the result is [`HeimScore::InsufficientData`]; an undefined
    /// component is never replaced by a default value or dropped from the weighting.
    pub fn new(components: Components, weights: &Weights) -> Self {
        let undefined = components.undefined();

        if !undefined.is_empty() {
            return Self::InsufficientData {
                undefined,
                components,
            };
        }

        let weighted = Component::ALL
            .into_iter()
            .filter_map(|c| components.get(c).value().map(|v| weights.get(c) * v))
            .sum::<f64>();
        let value = (100.0 * weighted).clamp(0.0, 100.0);

        Self::Score {
            value,
            rating: Rating::from_score(value),
            components,
        }
    }

    /// Returns the component values.
    pub fn components(&self) -> &Components {
        match self {
            HeimScore::Score { components, .. } => components,
            HeimScore::InsufficientData { components, .. } => components,
        }
    }

    /// Returns the score, if all components were defined.
    pub fn value(&self) -> Option<f64> {
        match self {
            HeimScore::Score { value, .. } => Some(*value),
            HeimScore::InsufficientData { .. } => None,
        }
    }
}

/// Mean observed heterozygosity across populations relative to [`MAX_HETEROZYGOSITY`], capped at
/// one.
///
/// Populations with undefined heterozygosity are excluded from the mean. If none are defined, the
/// balance is undefined.
pub fn heterozygosity_balance(heterozygosity: &[Heterozygosity]) -> Metric {
    let mean = nan_mean(heterozygosity.iter().map(|h| h.observed));

    Metric::from_value((mean / MAX_HETEROZYGOSITY).min(1.0), || {
        if heterozygosity.is_empty() {
            "no populations with genotype data"
        } else {
            "no population has defined heterozygosity"
        }
    })
}

/// Fraction of population pairs for which FST is defined.
///
/// Undefined if there are fewer than two populations.
pub fn fst_coverage(fst: &FstMatrix) -> Metric {
    Metric::from_value(fst.coverage(), || {
        format!(
            "no population pairs ({} population(s) with genotype data)",
            fst.populations()
        )
    })
}

/// Fraction of continental groupings with at least one sample.
pub fn geographic_spread(representation: &Representation) -> Metric {
    Metric::Defined(ratio(
        representation.represented_groups() as f64,
        Group::COUNT as f64,
    ))
}
