//! Diploid, diallelic genotypes.

use std::fmt;

pub mod matrix;
pub use matrix::{Matrix, StructuralError};

/// A diploid, diallelic genotype, coded as the number of alternative alleles.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Genotype {
    /// Homozygous reference.
    Zero = 0,
    /// Heterozygous.
    One = 1,
    /// Homozygous alternative.
    Two = 2,
}

impl Genotype {
    /// Returns a genotype from its raw representation if possible, otherwise `None`.
    pub fn try_from_raw(raw: usize) -> Option<Self> {
        match raw {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// Returns a genotype from an allele count stored as a float, if it is exactly 0, 1, or 2.
    pub fn try_from_f64(value: f64) -> Option<Self> {
        if value == 0.0 {
            Some(Self::Zero)
        } else if value == 1.0 {
            Some(Self::One)
        } else if value == 2.0 {
            Some(Self::Two)
        } else {
            None
        }
    }

    /// Returns the number of alternative alleles.
    pub fn alleles(self) -> u8 {
        self as u8
    }

    /// Returns `true` if the genotype is heterozygous.
    pub fn is_heterozygous(self) -> bool {
        self == Self::One
    }
}

impl From<Genotype> for f64 {
    fn from(genotype: Genotype) -> Self {
        f64::from(genotype.alleles())
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alleles())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_f64() {
        assert_eq!(Genotype::try_from_f64(1.0), Some(Genotype::One));
        assert_eq!(Genotype::try_from_f64(2.0), Some(Genotype::Two));
        assert_eq!(Genotype::try_from_f64(0.5), None);
        assert_eq!(Genotype::try_from_f64(-1.0), None);
        assert_eq!(Genotype::try_from_f64(f64::NAN), None);
    }

    #[test]
    fn test_try_from_raw() {
        assert_eq!(Genotype::try_from_raw(0), Some(Genotype::Zero));
        assert_eq!(Genotype::try_from_raw(3), None);
    }
}
