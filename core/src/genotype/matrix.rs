//! Genotype matrix.

use std::{fmt, slice::ChunksExact};

use super::Genotype;
use crate::utils::{is_missing, MISSING};

/// A validated genotype matrix with variants as rows and samples as columns.
///
/// Entries are alternative allele counts in {0, 1, 2}, or [`MISSING`]. The shape is fixed at
/// construction, and missing entries are kept as missing; nothing in the crate coerces them to a
/// genotype.
#[derive(Clone, Debug)]
pub struct Matrix {
    data: Vec<f64>,
    variants: usize,
    samples: usize,
}

impl Matrix {
    /// Creates a new matrix from row-major data.
    ///
    /// # Errors
    ///
    /// If either dimension is zero, if the data does not match the shape, or if any value is
    /// neither missing nor a valid allele count.
    pub fn new(data: Vec<f64>, variants: usize, samples: usize) -> Result<Self, StructuralError> {
        if samples == 0 {
            return Err(StructuralError::NoSamples);
        }
        if variants == 0 {
            return Err(StructuralError::NoVariants);
        }
        if data.len() != variants * samples {
            return Err(StructuralError::ShapeMismatch {
                variants,
                samples,
                values: data.len(),
            });
        }

        if let Some((i, &value)) = data
            .iter()
            .enumerate()
            .find(|(_, v)| !is_missing(**v) && Genotype::try_from_f64(**v).is_none())
        {
            return Err(StructuralError::InvalidGenotype {
                variant: i / samples,
                sample: i % samples,
                value,
            });
        }

        Ok(Self {
            data,
            variants,
            samples,
        })
    }

    /// Creates a new matrix from rows of variants.
    ///
    /// # Errors
    ///
    /// If rows have differing lengths, in addition to the errors from [`Matrix::new`].
    pub fn from_rows<I, R>(rows: I) -> Result<Self, StructuralError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f64]>,
    {
        let mut data = Vec::new();
        let mut samples = None;
        let mut variants = 0;

        for row in rows {
            let row = row.as_ref();
            match samples {
                None => samples = Some(row.len()),
                Some(expected) if expected != row.len() => {
                    return Err(StructuralError::RaggedRow {
                        variant: variants,
                        expected,
                        actual: row.len(),
                    })
                }
                Some(_) => (),
            }
            data.extend_from_slice(row);
            variants += 1;
        }

        if variants == 0 {
            return Err(StructuralError::NoVariants);
        }

        Self::new(data, variants, samples.unwrap_or(0))
    }

    /// Creates a new matrix from row-major genotype calls, with `None` for missing calls.
    pub fn from_calls<I>(calls: I, variants: usize, samples: usize) -> Result<Self, StructuralError>
    where
        I: IntoIterator<Item = Option<Genotype>>,
    {
        let data = calls
            .into_iter()
            .map(|call| call.map(f64::from).unwrap_or(MISSING))
            .collect();

        Self::new(data, variants, samples)
    }

    /// Creates a new matrix from row-major integer codes, where any negative code is missing.
    pub fn from_codes<I>(codes: I, variants: usize, samples: usize) -> Result<Self, StructuralError>
    where
        I: IntoIterator<Item = i8>,
    {
        let data = codes
            .into_iter()
            .map(|code| if code < 0 { MISSING } else { f64::from(code) })
            .collect();

        Self::new(data, variants, samples)
    }

    /// Returns the entry for a variant and sample, if in bounds.
    pub fn get(&self, variant: usize, sample: usize) -> Option<f64> {
        if variant < self.variants && sample < self.samples {
            Some(self.data[variant * self.samples + sample])
        } else {
            None
        }
    }

    /// Returns the genotype for a variant and sample, or `None` if missing or out of bounds.
    pub fn genotype(&self, variant: usize, sample: usize) -> Option<Genotype> {
        self.get(variant, sample).and_then(Genotype::try_from_f64)
    }

    /// Returns an iterator over variant rows.
    pub fn iter_variants(&self) -> ChunksExact<'_, f64> {
        self.data.chunks_exact(self.samples)
    }

    /// Returns the fraction of entries that are missing.
    pub fn missing_fraction(&self) -> f64 {
        let missing = self.data.iter().filter(|v| is_missing(**v)).count();
        missing as f64 / self.data.len() as f64
    }

    /// Returns the number of samples.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns a row of entries for a variant.
    ///
    /// # Panics
    ///
    /// If the variant is out of bounds.
    pub fn variant(&self, variant: usize) -> &[f64] {
        let start = variant * self.samples;
        &self.data[start..start + self.samples]
    }

    /// Returns the number of variants.
    pub fn variants(&self) -> usize {
        self.variants
    }
}

/// A malformed genotype matrix or sample assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum StructuralError {
    /// Matrix has no samples.
    NoSamples,
    /// Matrix has no variants.
    NoVariants,
    /// Number of values does not match the shape.
    ShapeMismatch {
        /// Number of variants.
        variants: usize,
        /// Number of samples.
        samples: usize,
        /// Number of provided values.
        values: usize,
    },
    /// Rows have differing lengths.
    RaggedRow {
        /// Index of offending variant.
        variant: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },
    /// A value is neither missing nor an allele count.
    InvalidGenotype {
        /// Variant index.
        variant: usize,
        /// Sample index.
        sample: usize,
        /// Offending value.
        value: f64,
    },
    /// Matrix and sample assignment disagree on the number of samples.
    SampleCountMismatch {
        /// Samples in matrix.
        matrix: usize,
        /// Samples in assignment.
        assigned: usize,
    },
    /// A sample is assigned a population more than once.
    DuplicateSample {
        /// Duplicated sample name.
        sample: String,
    },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::NoSamples => f.write_str("genotype matrix has no samples"),
            StructuralError::NoVariants => f.write_str("genotype matrix has no variants"),
            StructuralError::ShapeMismatch {
                variants,
                samples,
                values,
            } => write!(
                f,
                "genotype matrix with {variants} variants and {samples} samples \
                    cannot hold {values} values"
            ),
            StructuralError::RaggedRow {
                variant,
                expected,
                actual,
            } => write!(
                f,
                "variant {variant} has {actual} genotypes, expected {expected}"
            ),
            StructuralError::InvalidGenotype {
                variant,
                sample,
                value,
            } => write!(
                f,
                "invalid genotype {value} for sample {sample} at variant {variant} \
                    (expected 0, 1, 2, or missing)"
            ),
            StructuralError::SampleCountMismatch { matrix, assigned } => write!(
                f,
                "genotype matrix has {matrix} samples, \
                    but {assigned} samples were assigned populations"
            ),
            StructuralError::DuplicateSample { sample } => {
                write!(f, "sample '{sample}' is assigned a population more than once")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_shape() {
        assert_eq!(
            Matrix::new(vec![0.0; 5], 2, 3).unwrap_err(),
            StructuralError::ShapeMismatch {
                variants: 2,
                samples: 3,
                values: 5
            }
        );
        assert_eq!(
            Matrix::new(vec![], 0, 3).unwrap_err(),
            StructuralError::NoVariants
        );
        assert_eq!(
            Matrix::new(vec![], 3, 0).unwrap_err(),
            StructuralError::NoSamples
        );
    }

    #[test]
    fn test_new_rejects_invalid_genotype() {
        let result = Matrix::new(vec![0.0, 1.0, 2.0, 3.0], 2, 2);

        assert!(matches!(
            result,
            Err(StructuralError::InvalidGenotype {
                variant: 1,
                sample: 1,
                ..
            })
        ));
        assert!(Matrix::new(vec![0.0, f64::INFINITY], 1, 2).is_err());
        assert!(Matrix::new(vec![0.0, 0.5], 1, 2).is_err());
    }

    #[test]
    fn test_missing_is_kept() {
        let matrix = Matrix::new(vec![0.0, MISSING, 2.0, 1.0], 2, 2).unwrap();

        assert!(matrix.get(0, 1).unwrap().is_nan());
        assert_eq!(matrix.genotype(0, 1), None);
        assert_eq!(matrix.genotype(1, 1), Some(Genotype::One));
        assert_approx_eq!(matrix.missing_fraction(), 0.25);
    }

    #[test]
    fn test_from_rows() {
        let matrix = Matrix::from_rows([[0.0, 1.0, 2.0], [2.0, 2.0, MISSING]]).unwrap();

        assert_eq!(matrix.variants(), 2);
        assert_eq!(matrix.samples(), 3);
        assert_eq!(matrix.variant(0), &[0.0, 1.0, 2.0]);
        assert_eq!(matrix.iter_variants().count(), 2);
    }

    #[test]
    fn test_from_rows_ragged() {
        let rows: Vec<Vec<f64>> = vec![vec![0.0, 1.0], vec![1.0]];

        assert_eq!(
            Matrix::from_rows(rows).unwrap_err(),
            StructuralError::RaggedRow {
                variant: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_from_codes_negative_is_missing() {
        let matrix = Matrix::from_codes([0, -1, 2, 1], 2, 2).unwrap();

        assert!(matrix.get(0, 1).unwrap().is_nan());
        assert_eq!(matrix.get(1, 0), Some(2.0));
        assert!(Matrix::from_codes([0, 3], 1, 2).is_err());
    }

    #[test]
    fn test_from_calls() {
        let matrix =
            Matrix::from_calls([Some(Genotype::One), None, Some(Genotype::Two)], 1, 3).unwrap();

        assert_eq!(matrix.get(0, 0), Some(1.0));
        assert!(matrix.get(0, 1).unwrap().is_nan());
        assert_eq!(matrix.get(0, 3), None);
    }
}
