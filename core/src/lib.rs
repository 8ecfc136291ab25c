#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Tools for measuring the equity of population representation in genetic data.
//!
//! This serves as the core library implementation for the `heim` CLI, but can also be used as a
//! free-standing library.
//!
//! # Overview
//!
//! An [`Engine`] analyses a genotype [`Matrix`] together with a [`sample::Map`] assigning samples
//! to populations. The analysis estimates allele frequencies per population, and from those
//! [heterozygosity](heterozygosity) and pairwise [FST](fst); it projects samples onto
//! [principal components](pca), and measures the [representation](representation) of continental
//! groupings relative to global proportions. These are combined into the composite HEIM
//! [score](score).
//!
//! Missing genotypes are represented by `NaN` throughout, and every reduction skips them (see
//! [`utils`]). A metric that cannot be computed is never replaced by a default value: it is
//! reported as undefined, and a HEIM score with any undefined component is reported as
//! insufficient data.
//!
//! # Example
//!
//! ```
//! use heim_core::{sample, Config, Engine, Matrix};
//!
//! // Two variants for four samples in two populations, with one missing genotype
//! let matrix = Matrix::from_rows([
//!     [0.0, 1.0, 2.0, 2.0],
//!     [1.0, f64::NAN, 0.0, 1.0],
//! ])?;
//! let samples = sample::Map::try_from_iter([
//!     ("a", "AFR"),
//!     ("b", "AFR"),
//!     ("c", "EUR"),
//!     ("d", "EUR"),
//! ])?;
//!
//! let engine = Engine::new(Config::default().set_components(2))?;
//! let analysis = engine.analyze(&matrix, &samples)?;
//!
//! let fst = &analysis.fst.as_ref().expect("genotypes analysed").matrix;
//! assert_eq!(fst.get(0, 0), Some(0.0));
//! assert_eq!(fst.get(0, 1), fst.get(1, 0));
//! assert!(analysis.score.value().is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(test)]
#[macro_use]
pub(crate) mod approx;

pub mod config;
pub use config::Config;

pub mod engine;
pub use engine::{Analysis, Engine, Error};

pub mod frequency;
pub use frequency::AlleleFrequencies;

pub mod fst;
pub use fst::FstMatrix;

pub mod genotype;
pub use genotype::{Genotype, Matrix};

pub mod group;
pub use group::Group;

pub mod heterozygosity;
pub use heterozygosity::Heterozygosity;

pub mod input;
pub use input::Input;

pub mod metric;
pub use metric::Metric;

pub mod pca;
pub use pca::PcaResult;

pub mod representation;
pub use representation::{Formula, ReferenceTable, Representation};

pub mod sample;
pub use sample::{Population, Sample};

pub mod score;
pub use score::{HeimScore, Rating, Weights};

pub mod utils;
