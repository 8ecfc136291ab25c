use std::{collections::HashSet, io, num::NonZeroUsize, path::PathBuf};

use anyhow::{Context, Error};

use clap::Parser;
use heim_core::{
    input::{GenotypeTable, Input},
    sample, Engine,
};

use crate::{args::ScoreArgs, report};

/// Compute HEIM equity metrics from genotypes.
#[derive(Debug, Parser)]
pub struct Score {
    /// Input genotype table.
    ///
    /// Tab-separated, with a header line of sample names followed by one line per variant of
    /// alternative allele counts 0, 1, or 2. Missing genotypes may be given as '.', 'NA', '-1', or
    /// left empty. If no file is provided, stdin will be used.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Populations file.
    ///
    /// Each line should contain the name of a sample in the genotype table, followed by a tab- or
    /// comma-delimited population label, or have a header line naming its 'sample_id' and
    /// 'population' columns. Samples in the genotype table that are missing from the file are
    /// assigned an unknown population.
    #[arg(
        short = 'p',
        long,
        value_name = "FILE",
        required_unless_present = "infer_populations"
    )]
    populations: Option<PathBuf>,

    /// Infer populations from sample names.
    ///
    /// A sample name with a continental grouping code prefix, such as 'AFR_001', is assigned
    /// that grouping. Other samples are assigned an unknown population.
    #[arg(long, conflicts_with = "populations")]
    infer_populations: bool,

    /// Minimum number of genotyped sites for heterozygosity.
    ///
    /// Populations with fewer sites with any genotyped sample have undefined heterozygosity.
    #[arg(long, default_value_t = 1, value_name = "INT")]
    min_sites: usize,

    /// Polymorphism threshold for FST.
    ///
    /// Only sites where the pooled expected heterozygosity of a population pair exceeds this
    /// threshold contribute to FST.
    #[arg(long, default_value_t = 0.0, value_name = "FLOAT")]
    polymorphism_threshold: f64,

    /// Number of principal components.
    #[arg(
        short = 'k',
        long,
        default_value_t = heim_core::config::DEFAULT_COMPONENTS,
        value_name = "INT"
    )]
    components: usize,

    #[command(flatten)]
    args: ScoreArgs,

    /// Number of threads to use.
    #[arg(short = 't', long, default_value_t = NonZeroUsize::new(4).unwrap(), value_name = "INT")]
    threads: NonZeroUsize,
}

impl Score {
    pub fn run(self) -> Result<(), Error> {
        let config = self
            .args
            .config()?
            .set_min_sites(self.min_sites)
            .set_polymorphism_threshold(self.polymorphism_threshold)
            .set_components(self.components);
        let engine = Engine::new(config)?;

        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads.get())
            .build_global()
        {
            log::debug!("Failed to configure thread pool: {e}");
        }

        let input = Input::new(self.input)?;
        let table = GenotypeTable::from_reader(input.open()?).with_context(|| match input
            .as_path()
        {
            Some(path) => format!("failed to read genotype table '{}'", path.display()),
            None => String::from("failed to read genotype table from stdin"),
        })?;
        let (names, matrix) = table.into_parts();

        let samples = match &self.populations {
            Some(path) => {
                let populations = sample::Map::from_path(path).with_context(|| {
                    format!("failed to read populations file '{}'", path.display())
                })?;
                warn_unused_samples(&names, &populations);
                sample::Map::align(names, &populations)?
            }
            None => sample::Map::infer(names)?,
        };

        let analysis = engine.analyze(&matrix, &samples)?;

        let mut writer = io::stdout().lock();
        if self.args.json {
            report::write_json(&mut writer, &analysis)?;
        } else {
            report::write_text(&mut writer, &analysis, self.args.precision)?;
        }

        Ok(())
    }
}

fn warn_unused_samples(names: &[sample::Sample], populations: &sample::Map) {
    let names = names.iter().collect::<HashSet<_>>();
    let unused = populations
        .samples()
        .filter(|sample| !names.contains(sample))
        .count();

    if unused > 0 {
        log::warn!("{unused} sample(s) in populations file not found in genotype table");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::error::ErrorKind as ClapErrorKind;

    use crate::tests::{parse_subcmd, try_parse_subcmd};

    #[test]
    fn test_populations_required() {
        let result = try_parse_subcmd::<Score>("heim score genotypes.tsv");

        assert_eq!(
            result.unwrap_err().kind(),
            ClapErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_populations_and_infer_conflict() {
        let result =
            try_parse_subcmd::<Score>("heim score -p pops.tsv --infer-populations genotypes.tsv");

        assert_eq!(result.unwrap_err().kind(), ClapErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_parse_weights() {
        let args = parse_subcmd::<Score>("heim score -p pops.tsv -w 0.4,0.2,0.2,0.2 genotypes.tsv");

        assert_eq!(
            args.args.weights,
            Some(heim_core::Weights::new(0.4, 0.2, 0.2, 0.2).unwrap())
        );
    }

    #[test]
    fn test_invalid_weights() {
        let result = try_parse_subcmd::<Score>("heim score -p pops.tsv -w 0.5,0.5 genotypes.tsv");

        assert_eq!(result.unwrap_err().kind(), ClapErrorKind::ValueValidation);
    }

    #[test]
    fn test_defaults() {
        let args = parse_subcmd::<Score>("heim score --infer-populations genotypes.tsv");

        assert_eq!(args.min_sites, 1);
        assert_eq!(args.components, 10);
        assert_eq!(args.args.unknown_threshold, 0.5);
        assert!(!args.args.relative);
        assert!(!args.args.json);
    }
}
