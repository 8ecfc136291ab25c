//! Observed and expected heterozygosity.

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    frequency::AlleleFrequencies,
    genotype::{Genotype, Matrix},
    utils::{expected_heterozygosity, is_missing, nan_mean, MISSING},
};

/// Mean heterozygosity of a population across variants.
///
/// Both values are `NaN` when the population has no usable sites. This is distinct from a
/// computed heterozygosity of zero, which occurs when every usable site is monomorphic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Heterozygosity {
    /// Mean fraction of genotyped samples that are heterozygous.
    pub observed: f64,
    /// Mean expected heterozygosity, 2p(1 - p).
    pub expected: f64,
    /// Number of sites with at least one genotyped sample.
    pub sites: usize,
}

impl Heterozygosity {
    /// Calculates heterozygosity for a population.
    ///
    /// `indices` are the sample indices of the population, and `frequencies` its allele
    /// frequencies per variant. If fewer than `min_sites` sites have any genotyped sample, the
    /// result is undefined.
    pub fn calculate(
        matrix: &Matrix,
        indices: &[usize],
        frequencies: &[f64],
        min_sites: usize,
    ) -> Self {
        let observed_per_site = matrix.iter_variants().map(|row| {
            nan_mean(indices.iter().map(|&i| match Genotype::try_from_f64(row[i]) {
                Some(genotype) => f64::from(u8::from(genotype.is_heterozygous())),
                None => MISSING,
            }))
        });

        let sites = frequencies.iter().filter(|p| !is_missing(**p)).count();

        if sites == 0 || sites < min_sites {
            return Self::undefined(sites);
        }

        Self {
            observed: nan_mean(observed_per_site),
            expected: nan_mean(frequencies.iter().map(|&p| expected_heterozygosity(p))),
            sites,
        }
    }

    /// Returns `true` if the heterozygosity could be calculated.
    pub fn is_defined(&self) -> bool {
        !is_missing(self.observed) && !is_missing(self.expected)
    }

    fn undefined(sites: usize) -> Self {
        Self {
            observed: MISSING,
            expected: MISSING,
            sites,
        }
    }
}

/// Calculates heterozygosity for groups of sample indices, one group per population.
///
/// Groups must be in the same order as the populations of `frequencies`.
pub fn calculate<G>(
    matrix: &Matrix,
    groups: &[G],
    frequencies: &AlleleFrequencies,
    min_sites: usize,
) -> Vec<Heterozygosity>
where
    G: AsRef<[usize]> + Sync,
{
    log::debug!("Calculating heterozygosity for {} populations", groups.len());

    groups
        .par_iter()
        .enumerate()
        .map(|(i, group)| {
            Heterozygosity::calculate(
                matrix,
                group.as_ref(),
                frequencies.population(i),
                min_sites,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculate_single(rows: &[[f64; 4]], min_sites: usize) -> Heterozygosity {
        let matrix = Matrix::from_rows(rows).unwrap();
        let groups = [vec![0, 1, 2, 3]];
        let frequencies = AlleleFrequencies::estimate(&matrix, &groups);
        calculate(&matrix, &groups, &frequencies, min_sites)[0]
    }

    #[test]
    fn test_observed_and_expected() {
        let het = calculate_single(&[[0.0, 1.0, 1.0, 2.0], [1.0, 1.0, 0.0, 0.0]], 1);

        // Site 1: p = 0.5, ho = 0.5; site 2: p = 0.25, ho = 0.5
        assert_approx_eq!(het.observed, 0.5);
        assert_approx_eq!(het.expected, (0.5 + 0.375) / 2.0);
        assert_eq!(het.sites, 2);
        assert!(het.is_defined());
    }

    #[test]
    fn test_missing_sites_are_excluded_not_zero() {
        let het = calculate_single(
            &[
                [1.0, 1.0, MISSING, MISSING],
                [MISSING, MISSING, MISSING, MISSING],
            ],
            1,
        );

        assert_approx_eq!(het.observed, 1.0);
        assert_approx_eq!(het.expected, 0.5);
        assert_eq!(het.sites, 1);
    }

    #[test]
    fn test_no_genotyped_sites_is_undefined() {
        let het = calculate_single(&[[MISSING; 4], [MISSING; 4]], 1);

        assert!(het.observed.is_nan());
        assert!(het.expected.is_nan());
        assert_eq!(het.sites, 0);
        assert!(!het.is_defined());
    }

    #[test]
    fn test_monomorphic_is_zero_not_undefined() {
        let het = calculate_single(&[[0.0; 4], [2.0; 4]], 1);

        assert_eq!(het.observed, 0.0);
        assert_eq!(het.expected, 0.0);
        assert!(het.is_defined());
    }

    #[test]
    fn test_too_few_sites_is_undefined() {
        let het = calculate_single(&[[0.0, 1.0, 1.0, 2.0], [MISSING; 4]], 2);

        assert!(!het.is_defined());
        assert_eq!(het.sites, 1);
    }
}
