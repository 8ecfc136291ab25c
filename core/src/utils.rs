//! Missing-aware reductions.
//!
//! Missing genotypes are represented as [`MISSING`] (`NaN`) throughout. Every average or sum in
//! the crate goes through the functions here, so that a missing value is never silently treated
//! as zero.

/// The sentinel used for a missing genotype or an undefined statistic.
pub const MISSING: f64 = f64::NAN;

/// Returns `true` if the value is missing.
#[inline]
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Returns the sum and count of the non-missing values.
pub fn nan_sum_count<I>(values: I) -> (f64, usize)
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| !is_missing(*v))
        .fold((0.0, 0), |(sum, n), v| (sum + v, n + 1))
}

/// Returns the sum of the non-missing values, or [`MISSING`] if all values are missing.
pub fn nan_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    match nan_sum_count(values) {
        (_, 0) => MISSING,
        (sum, _) => sum,
    }
}

/// Returns the mean of the non-missing values, or [`MISSING`] if all values are missing.
pub fn nan_mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    match nan_sum_count(values) {
        (_, 0) => MISSING,
        (sum, n) => sum / n as f64,
    }
}

/// Returns the ratio, or [`MISSING`] if the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        MISSING
    } else {
        numerator / denominator
    }
}

/// Expected heterozygosity `2p(1 - p)` for a diallelic site.
///
/// Propagates a missing frequency.
#[inline]
pub fn expected_heterozygosity(p: f64) -> f64 {
    2.0 * p * (1.0 - p)
}
