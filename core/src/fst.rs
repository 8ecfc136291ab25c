//! Pairwise genetic differentiation.
//!
//! FST between two populations uses Nei's formulation as a ratio of sums,
//!
//! ```text
//! FST = Σ max(HT - HS, 0) / Σ HT,
//! ```
//!
//! where, per site, HT = 2p(1 - p) for the pooled allele frequency p, and HS is the mean of the
//! within-population expected heterozygosities, both weighted by the number of genotyped samples
//! in each population. Sums run over the sites where both populations have genotyped samples and
//! HT exceeds the polymorphism threshold.

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    frequency::AlleleFrequencies,
    utils::{expected_heterozygosity, is_missing, ratio, MISSING},
};

/// FST for a single pair of populations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PairwiseFst {
    /// FST in [0, 1], or `NaN` if no site was informative.
    pub fst: f64,
    /// Number of informative sites.
    pub sites: usize,
}

impl PairwiseFst {
    /// Calculates FST between two populations from per-variant frequencies and genotyped counts.
    ///
    /// When no site is informative, the FST is `NaN`: no differentiation could be measured, which
    /// is different from having measured none.
    pub fn calculate(
        (p_i, n_i): (&[f64], &[usize]),
        (p_j, n_j): (&[f64], &[usize]),
        threshold: f64,
    ) -> Self {
        let (numerator, denominator, sites) = p_i
            .iter()
            .zip(n_i)
            .zip(p_j.iter().zip(n_j))
            .filter(|((p_i, n_i), (p_j, n_j))| {
                **n_i > 0 && **n_j > 0 && !is_missing(**p_i) && !is_missing(**p_j)
            })
            .filter_map(|((&p_i, &n_i), (&p_j, &n_j))| {
                let (w_i, w_j) = (n_i as f64, n_j as f64);
                let total = w_i + w_j;

                let p_t = (w_i * p_i + w_j * p_j) / total;
                let ht = expected_heterozygosity(p_t);
                let hs = (w_i * expected_heterozygosity(p_i) + w_j * expected_heterozygosity(p_j))
                    / total;

                (ht > threshold).then_some(((ht - hs).max(0.0), ht))
            })
            .fold((0.0, 0.0, 0), |(num, denom, sites), (n, d)| {
                (num + n, denom + d, sites + 1)
            });

        let fst = if sites == 0 {
            MISSING
        } else {
            ratio(numerator, denominator)
        };

        Self { fst, sites }
    }

    /// Returns `true` if the FST could be calculated.
    pub fn is_defined(&self) -> bool {
        !is_missing(self.fst)
    }
}

/// A symmetric matrix of pairwise FST between populations.
///
/// The diagonal is zero by definition and is never computed from data.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FstMatrix {
    values: Vec<Vec<f64>>,
    sites: Vec<Vec<usize>>,
}

impl FstMatrix {
    /// Calculates FST for all pairs of populations.
    ///
    /// Pairs are computed independently, possibly in parallel; the result does not depend on
    /// scheduling.
    pub fn calculate(frequencies: &AlleleFrequencies, threshold: f64) -> Self {
        let n = frequencies.populations();

        let pairs = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect::<Vec<_>>();

        log::debug!("Calculating FST for {} population pairs", pairs.len());

        let results = pairs
            .par_iter()
            .map(|&(i, j)| {
                PairwiseFst::calculate(
                    (frequencies.population(i), frequencies.genotyped(i)),
                    (frequencies.population(j), frequencies.genotyped(j)),
                    threshold,
                )
            })
            .collect::<Vec<_>>();

        let mut values = vec![vec![0.0; n]; n];
        let mut sites = vec![vec![0; n]; n];
        for (&(i, j), pair) in pairs.iter().zip(results) {
            values[i][j] = pair.fst;
            values[j][i] = pair.fst;
            sites[i][j] = pair.sites;
            sites[j][i] = pair.sites;
        }

        Self { values, sites }
    }

    /// Returns the fraction of population pairs for which FST is defined.
    ///
    /// Returns `NaN` if there are no pairs.
    pub fn coverage(&self) -> f64 {
        ratio(self.defined_pairs() as f64, self.pairs() as f64)
    }

    /// Returns the number of pairs for which FST is defined.
    pub fn defined_pairs(&self) -> usize {
        self.iter_pairs().filter(|(_, _, pair)| pair.is_defined()).count()
    }

    /// Returns the FST between two populations.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Returns an iterator over the upper triangle, as `(i, j, fst)` with `i < j`.
    pub fn iter_pairs(&self) -> impl Iterator<Item = (usize, usize, PairwiseFst)> + '_ {
        let n = self.populations();

        (0..n).flat_map(move |i| {
            (i + 1..n).map(move |j| {
                let pair = PairwiseFst {
                    fst: self.values[i][j],
                    sites: self.sites[i][j],
                };
                (i, j, pair)
            })
        })
    }

    /// Returns the number of population pairs.
    pub fn pairs(&self) -> usize {
        let n = self.populations();
        n * n.saturating_sub(1) / 2
    }

    /// Returns the number of populations.
    pub fn populations(&self) -> usize {
        self.values.len()
    }

    /// Returns the matrix rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }
}
