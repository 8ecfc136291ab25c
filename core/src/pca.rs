//! Principal component analysis of genotypes.

use nalgebra::DMatrix;
use serde::Serialize;

use crate::{
    genotype::Matrix,
    utils::{is_missing, nan_mean},
};

/// Relative size below which an eigenvalue is treated as zero.
const EIGENVALUE_TOLERANCE: f64 = 1e-10;

/// A principal component.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrincipalComponent {
    /// Variance along the component, as the eigenvalue of the centred sample Gram matrix.
    pub eigenvalue: f64,
    /// Fraction of total variance explained by the component.
    pub variance_explained: f64,
    /// Unit-length loadings, one per variant.
    pub loadings: Vec<f64>,
    /// Coordinates, one per sample.
    pub coordinates: Vec<f64>,
}

/// The result of a principal component analysis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PcaResult {
    /// Components in order of decreasing variance explained.
    pub components: Vec<PrincipalComponent>,
    /// Number of components requested.
    pub requested: usize,
    /// Number of requested components that could not be computed.
    pub shortfall: usize,
}

impl PcaResult {
    /// Returns the coordinates of a sample on each component.
    pub fn sample_coordinates(&self, sample: usize) -> Vec<f64> {
        self.components
            .iter()
            .map(|component| component.coordinates[sample])
            .collect()
    }
}

/// Projects samples onto principal components of the genotype matrix.
///
/// Missing genotypes are imputed by the mean of their variant in a private copy of the data, and
/// each variant is centred. At most `min(requested, samples, variants)` components are returned,
/// and components with no variance are dropped; the result reports the shortfall.
///
/// Component signs are canonical: the loading with the largest absolute value (the first one, on
/// ties) is positive. Identical input gives identical output.
pub fn project(matrix: &Matrix, requested: usize) -> PcaResult {
    let samples = matrix.samples();
    let variants = matrix.variants();

    let centred = centred_samples_by_variants(matrix);
    let gram = &centred * centred.transpose();
    let total_variance = gram.trace();

    let feasible = requested.min(samples).min(variants);

    log::debug!(
        "Decomposing {samples}x{samples} sample Gram matrix for {feasible} principal components"
    );

    let components = if total_variance > 0.0 {
        let eigen = gram.symmetric_eigen();

        let mut order = (0..eigen.eigenvalues.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        order
            .into_iter()
            .take(feasible)
            .map(|k| (eigen.eigenvalues[k], eigen.eigenvectors.column(k).clone_owned()))
            .take_while(|(eigenvalue, _)| *eigenvalue > EIGENVALUE_TOLERANCE * total_variance)
            .map(|(eigenvalue, vector)| {
                let singular_value = eigenvalue.sqrt();

                let mut loadings = (centred.transpose() * &vector / singular_value)
                    .iter()
                    .copied()
                    .collect::<Vec<_>>();
                let mut coordinates = (vector * singular_value).iter().copied().collect::<Vec<_>>();

                canonicalise_sign(&mut loadings, &mut coordinates);

                PrincipalComponent {
                    eigenvalue,
                    variance_explained: eigenvalue / total_variance,
                    loadings,
                    coordinates,
                }
            })
            .collect::<Vec<_>>()
    } else {
        log::warn!("Genotype matrix has no variance, no principal components can be computed");
        Vec::new()
    };

    let shortfall = requested - components.len();
    if shortfall > 0 {
        log::warn!(
            "Computed {} of {requested} requested principal components \
                ({samples} samples, {variants} variants)",
            components.len()
        );
    }

    PcaResult {
        components,
        requested,
        shortfall,
    }
}

/// Returns the mean-imputed, centred matrix with samples as rows and variants as columns.
fn centred_samples_by_variants(matrix: &Matrix) -> DMatrix<f64> {
    let mut centred = DMatrix::zeros(matrix.samples(), matrix.variants());

    for (j, row) in matrix.iter_variants().enumerate() {
        let mean = nan_mean(row.iter().copied());

        // A variant without any calls stays zero, contributing nothing
        if is_missing(mean) {
            continue;
        }

        for (i, &v) in row.iter().enumerate() {
            if !is_missing(v) {
                centred[(i, j)] = v - mean;
            }
        }
    }

    centred
}

fn canonicalise_sign(loadings: &mut [f64], coordinates: &mut [f64]) {
    let largest = loadings
        .iter()
        .copied()
        .fold(0.0_f64, |max, v| if v.abs() > max.abs() { v } else { max });

    if largest < 0.0 {
        loadings.iter_mut().for_each(|v| *v = -*v);
        coordinates.iter_mut().for_each(|v| *v = -*v);
    }
}
