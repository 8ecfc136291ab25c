//! Allele frequency estimation.

use rayon::prelude::*;

use crate::{
    genotype::Matrix,
    utils::{nan_sum_count, ratio},
};

/// Alternative allele frequencies per population and variant.
///
/// Only non-missing genotypes contribute. A population without any genotyped sample at a variant
/// has a missing (`NaN`) frequency there, never zero.
#[derive(Clone, Debug)]
pub struct AlleleFrequencies {
    variants: usize,
    frequencies: Vec<Vec<f64>>,
    genotyped: Vec<Vec<usize>>,
}

impl AlleleFrequencies {
    /// Estimates frequencies for groups of sample indices, one group per population.
    ///
    /// # Panics
    ///
    /// If any sample index is out of bounds for the matrix.
    pub fn estimate<G>(matrix: &Matrix, groups: &[G]) -> Self
    where
        G: AsRef<[usize]> + Sync,
    {
        log::debug!(
            "Estimating allele frequencies for {} populations at {} variants",
            groups.len(),
            matrix.variants()
        );

        let (frequencies, genotyped) = groups
            .par_iter()
            .map(|group| estimate_population(matrix, group.as_ref()))
            .unzip();

        Self {
            variants: matrix.variants(),
            frequencies,
            genotyped,
        }
    }

    /// Returns the frequency for a population and variant.
    pub fn get(&self, population: usize, variant: usize) -> Option<f64> {
        self.frequencies
            .get(population)
            .and_then(|f| f.get(variant))
            .copied()
    }

    /// Returns the number of genotyped samples per variant for a population.
    pub fn genotyped(&self, population: usize) -> &[usize] {
        &self.genotyped[population]
    }

    /// Returns the frequencies per variant for a population.
    pub fn population(&self, population: usize) -> &[f64] {
        &self.frequencies[population]
    }

    /// Returns the number of populations.
    pub fn populations(&self) -> usize {
        self.frequencies.len()
    }

    /// Returns the number of variants.
    pub fn variants(&self) -> usize {
        self.variants
    }
}

fn estimate_population(matrix: &Matrix, indices: &[usize]) -> (Vec<f64>, Vec<usize>) {
    matrix
        .iter_variants()
        .map(|row| {
            let (alleles, genotyped) = nan_sum_count(indices.iter().map(|&i| row[i]));
            (ratio(alleles, 2.0 * genotyped as f64), genotyped)
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::utils::MISSING;

    #[test]
    fn test_estimate() {
        let matrix = Matrix::from_rows([
            [0.0, 1.0, 2.0, 2.0],
            [MISSING, 1.0, 0.0, 0.0],
            [MISSING, MISSING, 2.0, MISSING],
        ])
        .unwrap();

        let frequencies = AlleleFrequencies::estimate(&matrix, &[vec![0, 1], vec![2, 3]]);

        assert_eq!(frequencies.populations(), 2);
        assert_eq!(frequencies.variants(), 3);
        assert_approx_eq!(frequencies.population(0).to_vec(), vec![0.25, 0.5, MISSING]);
        assert_approx_eq!(frequencies.population(1).to_vec(), vec![1.0, 0.0, 1.0]);
        assert_eq!(frequencies.genotyped(0), &[2, 1, 0]);
        assert_eq!(frequencies.genotyped(1), &[2, 2, 1]);
    }

    #[test]
    fn test_no_genotyped_samples_is_missing_not_zero() {
        let matrix = Matrix::from_rows([[MISSING, 0.0]]).unwrap();

        let frequencies = AlleleFrequencies::estimate(&matrix, &[vec![0], vec![1]]);

        assert!(frequencies.get(0, 0).unwrap().is_nan());
        assert_eq!(frequencies.get(1, 0), Some(0.0));
        assert_eq!(frequencies.get(2, 0), None);
    }
}
