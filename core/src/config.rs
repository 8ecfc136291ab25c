//! Engine configuration.

use std::fmt;

use crate::{
    group::Group,
    representation::{Formula, ReferenceTable},
    score::{Component, Weights},
};

/// Default fraction of unmapped samples above which the representation index is undefined.
pub const DEFAULT_UNKNOWN_THRESHOLD: f64 = 0.5;

/// Default number of principal components.
pub const DEFAULT_COMPONENTS: usize = 10;

/// Configuration of an [`Engine`](crate::Engine).
///
/// Setters can be chained, and the configuration is validated when creating the engine.
///
/// # Example
///
/// ```
/// use heim_core::{Config, Weights};
///
/// let config = Config::default()
///     .set_weights(Weights::new(0.25, 0.25, 0.25, 0.25)?)
///     .set_components(4)
///     .set_min_sites(10);
///
/// assert!(config.validate().is_ok());
/// # Ok::<(), heim_core::config::ConfigurationError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    weights: Weights,
    unknown_threshold: f64,
    min_sites: usize,
    polymorphism_threshold: f64,
    components: usize,
    formula: Formula,
    reference: ReferenceTable,
}

impl Config {
    /// Returns the number of requested principal components.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Returns the representation index formula.
    pub fn formula(&self) -> Formula {
        self.formula
    }

    /// Returns the minimum number of sites for heterozygosity to be defined.
    pub fn min_sites(&self) -> usize {
        self.min_sites
    }

    /// Returns the threshold that pooled expected heterozygosity must exceed for a site to
    /// contribute to FST.
    pub fn polymorphism_threshold(&self) -> f64 {
        self.polymorphism_threshold
    }

    /// Returns the reference proportions of continental groupings.
    pub fn reference(&self) -> &ReferenceTable {
        &self.reference
    }

    /// Sets the number of requested principal components.
    pub fn set_components(mut self, components: usize) -> Self {
        self.components = components;
        self
    }

    /// Sets the representation index formula.
    pub fn set_formula(mut self, formula: Formula) -> Self {
        self.formula = formula;
        self
    }

    /// Sets the minimum number of sites for heterozygosity to be defined.
    pub fn set_min_sites(mut self, min_sites: usize) -> Self {
        self.min_sites = min_sites;
        self
    }

    /// Sets the threshold that pooled expected heterozygosity must exceed for a site to contribute
    /// to FST.
    pub fn set_polymorphism_threshold(mut self, threshold: f64) -> Self {
        self.polymorphism_threshold = threshold;
        self
    }

    /// Sets the reference proportions of continental groupings.
    pub fn set_reference(mut self, reference: ReferenceTable) -> Self {
        self.reference = reference;
        self
    }

    /// Sets the fraction of unmapped samples above which the representation index is undefined.
    pub fn set_unknown_threshold(mut self, threshold: f64) -> Self {
        self.unknown_threshold = threshold;
        self
    }

    /// Sets the component weights.
    pub fn set_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    /// Returns the fraction of unmapped samples above which the representation index is undefined.
    pub fn unknown_threshold(&self) -> f64 {
        self.unknown_threshold
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// If weights are invalid, if a threshold lies outside its range, if the minimum number of
    /// sites is zero, or if no principal components are requested.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.weights.validate()?;

        if !(0.0..=1.0).contains(&self.unknown_threshold) {
            return Err(ConfigurationError::InvalidThreshold {
                name: "unknown threshold",
                value: self.unknown_threshold,
            });
        }

        if !(0.0..=0.5).contains(&self.polymorphism_threshold) {
            return Err(ConfigurationError::InvalidThreshold {
                name: "polymorphism threshold",
                value: self.polymorphism_threshold,
            });
        }

        if self.min_sites == 0 {
            return Err(ConfigurationError::InvalidMinSites);
        }

        if self.components == 0 {
            return Err(ConfigurationError::NoComponents);
        }

        Ok(())
    }

    /// Returns the component weights.
    pub fn weights(&self) -> &Weights {
        &self.weights
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            unknown_threshold: DEFAULT_UNKNOWN_THRESHOLD,
            min_sites: 1,
            polymorphism_threshold: 0.0,
            components: DEFAULT_COMPONENTS,
            formula: Formula::default(),
            reference: ReferenceTable::default(),
        }
    }
}

/// An error associated with invalid configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigurationError {
    /// A weight is negative or not finite.
    InvalidWeight {
        /// Component of the weight.
        component: Component,
        /// Offending weight.
        weight: f64,
    },
    /// Weights do not sum to one.
    WeightSum {
        /// Sum of weights.
        sum: f64,
    },
    /// Wrong number of weights.
    WeightCount {
        /// Number of weights given.
        count: usize,
    },
    /// A weight could not be parsed as a number.
    UnparsableWeight {
        /// Offending weight.
        weight: String,
    },
    /// A threshold lies outside its allowed range.
    InvalidThreshold {
        /// Name of the threshold.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Minimum number of sites is zero.
    InvalidMinSites,
    /// No principal components requested.
    NoComponents,
    /// A reference proportion is not in (0, 1].
    InvalidReferenceProportion {
        /// Group of the proportion.
        group: Group,
        /// Offending proportion.
        proportion: f64,
    },
    /// A group appears more than once in the reference table.
    DuplicateReferenceGroup {
        /// Duplicated group.
        group: Group,
    },
    /// A group is absent from the reference table.
    MissingReferenceGroup {
        /// Missing group.
        group: Group,
    },
    /// A reference table contains a code that is not a continental grouping.
    UnknownReferenceGroup {
        /// Offending code.
        code: String,
    },
    /// Reference proportions do not sum to one.
    ReferenceSum {
        /// Sum of proportions.
        sum: f64,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::InvalidWeight { component, weight } => {
                write!(f, "invalid weight {weight} for {component}")
            }
            ConfigurationError::WeightSum { sum } => {
                write!(f, "weights must sum to 1 (found sum {sum})")
            }
            ConfigurationError::WeightCount { count } => {
                write!(f, "expected 4 weights (found {count})")
            }
            ConfigurationError::UnparsableWeight { weight } => {
                write!(f, "failed to parse weight '{weight}'")
            }
            ConfigurationError::InvalidThreshold { name, value } => {
                write!(f, "invalid {name} {value}")
            }
            ConfigurationError::InvalidMinSites => {
                f.write_str("minimum number of sites must be at least 1")
            }
            ConfigurationError::NoComponents => {
                f.write_str("number of principal components must be at least 1")
            }
            ConfigurationError::InvalidReferenceProportion { group, proportion } => {
                write!(f, "invalid reference proportion {proportion} for {group}")
            }
            ConfigurationError::DuplicateReferenceGroup { group } => {
                write!(f, "duplicate reference proportion for {group}")
            }
            ConfigurationError::MissingReferenceGroup { group } => {
                write!(f, "missing reference proportion for {group}")
            }
            ConfigurationError::UnknownReferenceGroup { code } => {
                write!(f, "unknown continental grouping '{code}' in reference table")
            }
            ConfigurationError::ReferenceSum { sum } => {
                write!(f, "reference proportions must sum to 1 (found sum {sum})")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_unknown_threshold() {
        let result = Config::default().set_unknown_threshold(1.5).validate();

        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidThreshold {
                name: "unknown threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_polymorphism_threshold() {
        assert!(Config::default()
            .set_polymorphism_threshold(-0.1)
            .validate()
            .is_err());
        assert!(Config::default()
            .set_polymorphism_threshold(0.001)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_zero_min_sites() {
        assert_eq!(
            Config::default().set_min_sites(0).validate(),
            Err(ConfigurationError::InvalidMinSites)
        );
    }

    #[test]
    fn test_zero_components() {
        assert_eq!(
            Config::default().set_components(0).validate(),
            Err(ConfigurationError::NoComponents)
        );
    }
}
