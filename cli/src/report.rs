//! Printing analyses.

use std::io;

use heim_core::{score::Component, Analysis, HeimScore};

/// Writes an analysis as JSON.
pub fn write_json<W>(writer: &mut W, analysis: &Analysis) -> io::Result<()>
where
    W: io::Write,
{
    serde_json::to_writer_pretty(&mut *writer, analysis)?;
    writeln!(writer)
}

/// Writes an analysis as plain text.
///
/// Undefined values are written as `NA` in tables, and with their reason otherwise.
pub fn write_text<W>(writer: &mut W, analysis: &Analysis, precision: usize) -> io::Result<()>
where
    W: io::Write,
{
    let fmt = |v: f64| {
        if v.is_nan() {
            String::from("NA")
        } else {
            format!("{v:.precision$}")
        }
    };

    writeln!(writer, "samples: {}", analysis.samples)?;
    if let Some(variants) = analysis.variants {
        writeln!(writer, "variants: {variants}")?;
    }

    writeln!(writer, "populations:")?;
    for population in &analysis.populations {
        write!(writer, "  {}\t{}", population.name, population.samples)?;
        if let Some(het) = population.heterozygosity {
            write!(writer, "\t{}\t{}", fmt(het.observed), fmt(het.expected))?;
        }
        writeln!(writer)?;
    }

    if let Some(fst) = &analysis.fst {
        writeln!(writer, "fst:")?;
        for (name, row) in fst.populations.iter().zip(fst.matrix.rows()) {
            let row = row.iter().map(|&v| fmt(v)).collect::<Vec<_>>().join("\t");
            writeln!(writer, "  {name}\t{row}")?;
        }
    }

    if let Some(pca) = &analysis.pca {
        writeln!(writer, "pca:")?;
        for (i, component) in pca.components.iter().enumerate() {
            writeln!(
                writer,
                "  PC{}\t{}",
                i + 1,
                fmt(component.variance_explained)
            )?;
        }
    }

    let representation = &analysis.representation;
    writeln!(writer, "representation:")?;
    for group in &representation.groups {
        writeln!(
            writer,
            "  {}\t{}\t{}\t{}",
            group.group,
            group.samples,
            fmt(group.observed),
            fmt(group.expected)
        )?;
    }
    writeln!(
        writer,
        "  unmapped\t{}",
        fmt(representation.unmapped_fraction)
    )?;

    writeln!(writer, "components:")?;
    let components = analysis.score.components();
    for component in Component::ALL {
        writeln!(
            writer,
            "  {}\t{:.precision$}",
            component_key(component),
            components.get(component)
        )?;
    }

    match &analysis.score {
        HeimScore::Score { value, rating, .. } => {
            writeln!(writer, "heim_score: {value:.1} ({rating})")?
        }
        HeimScore::InsufficientData { .. } => writeln!(writer, "heim_score: insufficient data")?,
    }

    let issues = analysis.data_quality();
    if !issues.is_empty() {
        writeln!(writer, "data_quality:")?;
        for issue in issues {
            writeln!(writer, "  {issue}")?;
        }
    }

    Ok(())
}

fn component_key(component: Component) -> &'static str {
    match component {
        Component::RepresentationIndex => "representation_index",
        Component::HeterozygosityBalance => "heterozygosity_balance",
        Component::FstCoverage => "fst_coverage",
        Component::GeographicSpread => "geographic_spread",
    }
}
