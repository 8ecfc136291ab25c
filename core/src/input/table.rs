//! Genotype tables.
//!
//! A genotype table is a tab-separated text file. The first line holds the sample names, and each
//! following line holds the genotypes of one variant as alternative allele counts 0, 1, or 2. Any
//! of `.`, `NA`, `-1`, or an empty field is a missing genotype. Empty lines and lines starting
//! with `#` are skipped; a line of only tabs is a variant with every genotype missing.

use std::{collections::HashSet, fmt, io};

use crate::{
    genotype::{Genotype, Matrix, StructuralError},
    sample::Sample,
    utils::MISSING,
};

/// Fields read as a missing genotype.
const MISSING_FIELDS: &[&str] = &["", ".", "NA", "-1"];

/// A genotype matrix with the names of its samples.
#[derive(Clone, Debug)]
pub struct GenotypeTable {
    samples: Vec<Sample>,
    matrix: Matrix,
}

impl GenotypeTable {
    /// Reads a genotype table.
    ///
    /// # Errors
    ///
    /// If reading fails, or if the table is malformed; see [`Error`] for details.
    pub fn from_reader<R>(reader: R) -> Result<Self, Error>
    where
        R: io::BufRead,
    {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(i, line)| line.map(|line| (i + 1, line)))
            .filter(|line| match line {
                Ok((_, line)) => {
                    let line = line.trim_end_matches('\r');
                    !(line.is_empty() || line.starts_with('#'))
                }
                Err(_) => true,
            });

        let samples = match lines.next().transpose()? {
            Some((_, header)) => parse_header(&header)?,
            None => return Err(Error::Empty),
        };

        let mut data = Vec::new();
        let mut variants = 0;
        for line in lines {
            let (line_number, line) = line?;
            let fields = line.trim_end_matches(['\r', '\n']).split('\t');

            let before = data.len();
            for (column, field) in fields.enumerate() {
                data.push(parse_genotype(field.trim(), line_number, column)?);
            }

            let actual = data.len() - before;
            if actual != samples.len() {
                return Err(Error::RowLength {
                    line: line_number,
                    expected: samples.len(),
                    actual,
                });
            }
            variants += 1;
        }

        log::debug!(
            "Read genotype table with {variants} variants for {} samples",
            samples.len()
        );

        let matrix = Matrix::new(data, variants, samples.len())?;

        Ok(Self { samples, matrix })
    }

    /// Returns the samples and the matrix.
    pub fn into_parts(self) -> (Vec<Sample>, Matrix) {
        (self.samples, self.matrix)
    }

    /// Returns the genotype matrix.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Returns the sample names, in column order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

fn parse_header(header: &str) -> Result<Vec<Sample>, Error> {
    let samples = header
        .trim_end_matches(['\r', '\n'])
        .split('\t')
        .map(|name| Sample::from(name.trim()))
        .collect::<Vec<_>>();

    let mut seen = HashSet::new();
    if let Some(duplicate) = samples.iter().find(|&sample| !seen.insert(sample)) {
        return Err(Error::DuplicateSample {
            sample: duplicate.as_ref().to_string(),
        });
    }

    Ok(samples)
}

fn parse_genotype(field: &str, line: usize, column: usize) -> Result<f64, Error> {
    if MISSING_FIELDS.contains(&field) {
        return Ok(MISSING);
    }

    field
        .parse::<usize>()
        .ok()
        .and_then(Genotype::try_from_raw)
        .map(f64::from)
        .ok_or_else(|| Error::InvalidGenotype {
            line,
            column,
            value: field.to_string(),
        })
}

/// An error associated with reading a genotype table.
#[derive(Debug)]
pub enum Error {
    /// I/O error.
    Io(io::Error),
    /// Table has no header.
    Empty,
    /// A sample name occurs more than once in the header.
    DuplicateSample {
        /// Duplicated sample name.
        sample: String,
    },
    /// A row does not have one field per sample.
    RowLength {
        /// Line number, starting from one.
        line: usize,
        /// Number of samples.
        expected: usize,
        /// Number of fields.
        actual: usize,
    },
    /// A field is neither a genotype nor missing.
    InvalidGenotype {
        /// Line number, starting from one.
        line: usize,
        /// Column, starting from zero.
        column: usize,
        /// Offending field.
        value: String,
    },
    /// The table does not form a valid matrix.
    Structural(StructuralError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{e}"),
            Error::Empty => f.write_str("genotype table is empty"),
            Error::DuplicateSample { sample } => {
                write!(f, "duplicate sample '{sample}' in genotype table header")
            }
            Error::RowLength {
                line,
                expected,
                actual,
            } => write!(
                f,
                "expected {expected} genotypes on line {line} of genotype table, found {actual}"
            ),
            Error::InvalidGenotype {
                line,
                column,
                value,
            } => write!(
                f,
                "invalid genotype '{value}' on line {line}, column {} of genotype table",
                column + 1
            ),
            Error::Structural(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<StructuralError> for Error {
    fn from(e: StructuralError) -> Self {
        Self::Structural(e)
    }
}
