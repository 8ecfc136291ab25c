//! The result of an analysis.

use std::fmt;

use serde::Serialize;

use crate::{
    fst::FstMatrix,
    group::Group,
    heterozygosity::Heterozygosity,
    pca::PcaResult,
    representation::Representation,
    score::{Component, HeimScore},
};

/// Summary of a population in an analysis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PopulationSummary {
    /// Population label.
    pub name: String,
    /// Continental grouping of the label, if any.
    pub group: Option<Group>,
    /// Number of samples.
    pub samples: usize,
    /// Heterozygosity, if genotypes were analysed and the population is known.
    pub heterozygosity: Option<Heterozygosity>,
}

/// Pairwise FST between named populations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FstTable {
    /// Population labels, in matrix order.
    pub populations: Vec<String>,
    /// The FST matrix.
    pub matrix: FstMatrix,
}

/// A metric that could not be computed, and why.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Issue {
    /// What could not be computed.
    pub subject: String,
    /// Why.
    pub reason: String,
}

impl Issue {
    fn new<S, R>(subject: S, reason: R) -> Self
    where
        S: ToString,
        R: ToString,
    {
        Self {
            subject: subject.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.reason)
    }
}

/// The structured result of an analysis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    /// Number of samples.
    pub samples: usize,
    /// Number of variants, if genotypes were analysed.
    pub variants: Option<usize>,
    /// Populations in order of first appearance.
    pub populations: Vec<PopulationSummary>,
    /// Pairwise FST, if genotypes were analysed.
    pub fst: Option<FstTable>,
    /// Principal components, if genotypes were analysed.
    pub pca: Option<PcaResult>,
    /// Representation of continental groupings.
    pub representation: Representation,
    /// The HEIM score.
    pub score: HeimScore,
    /// Warnings raised during the analysis.
    pub warnings: Vec<String>,
    data_quality: Vec<Issue>,
}

impl Analysis {
    pub(super) fn new(
        samples: usize,
        variants: Option<usize>,
        populations: Vec<PopulationSummary>,
        fst: Option<FstTable>,
        pca: Option<PcaResult>,
        representation: Representation,
        score: HeimScore,
    ) -> Self {
        let mut analysis = Self {
            samples,
            variants,
            populations,
            fst,
            pca,
            representation,
            score,
            warnings: Vec::new(),
            data_quality: Vec::new(),
        };

        analysis.data_quality = analysis.collect_issues();
        analysis.warnings = analysis.collect_warnings();

        analysis
    }

    /// Returns every metric that could not be computed, with the reason.
    ///
    /// Issues are listed for populations with undefined heterozygosity, population pairs with
    /// undefined FST, principal components that could not be computed, and undefined HEIM score
    /// components.
    pub fn data_quality(&self) -> &[Issue] {
        &self.data_quality
    }

    fn collect_issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        for population in &self.populations {
            if let Some(het) = population.heterozygosity.filter(|het| !het.is_defined()) {
                let reason = match het.sites {
                    0 => String::from("no genotyped sites"),
                    n => format!("too few genotyped sites ({n})"),
                };
                issues.push(Issue::new(
                    format_args!("heterozygosity of {}", population.name),
                    reason,
                ));
            }
        }

        if let Some(fst) = &self.fst {
            for (i, j, pair) in fst.matrix.iter_pairs() {
                if !pair.is_defined() {
                    issues.push(Issue::new(
                        format_args!(
                            "FST between {} and {}",
                            fst.populations[i], fst.populations[j]
                        ),
                        "no jointly polymorphic sites",
                    ));
                }
            }
        }

        if let Some(pca) = self.pca.as_ref().filter(|pca| pca.shortfall > 0) {
            issues.push(Issue::new(
                "principal components",
                format_args!(
                    "{} of {} requested components could not be computed",
                    pca.shortfall, pca.requested
                ),
            ));
        }

        let components = self.score.components();
        for component in Component::ALL {
            if let Some(reason) = components.get(component).reason() {
                issues.push(Issue::new(component.name(), reason));
            }
        }

        issues
    }

    fn collect_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        warnings.extend(self.representation.warning.iter().cloned());

        if let HeimScore::InsufficientData { undefined, .. } = &self.score {
            warnings.push(format!(
                "HEIM score not computed, insufficient data for {}",
                undefined
                    .iter()
                    .map(|u| u.component.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        warnings
    }
}
