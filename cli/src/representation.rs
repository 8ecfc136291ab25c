use std::{io, path::PathBuf};

use anyhow::{Context, Error};

use clap::Parser;
use heim_core::{input::Input, sample, Engine};

use crate::{args::ScoreArgs, report};

/// Compute representation metrics from population labels only.
///
/// Without genotypes, heterozygosity balance and FST coverage are undefined, and so the HEIM score
/// is reported as insufficient data.
#[derive(Debug, Parser)]
pub struct Representation {
    /// Input populations file.
    ///
    /// Each line should contain a sample name, optionally followed by a tab- or comma-delimited
    /// population label. Alternatively, a header line such as 'sample_id,population' names the
    /// sample and population columns, which may then be in any order among other columns. If no
    /// file is provided, stdin will be used.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Infer populations from sample names.
    ///
    /// Any population labels in the input are ignored, and a sample name with a continental
    /// grouping code prefix, such as 'AFR_001', is assigned that grouping instead.
    #[arg(long)]
    infer_populations: bool,

    #[command(flatten)]
    args: ScoreArgs,
}

impl Representation {
    pub fn run(self) -> Result<(), Error> {
        let engine = Engine::new(self.args.config()?)?;

        let input = Input::new(self.input)?;
        let mut samples =
            sample::Map::from_reader(input.open()?).context("failed to read populations")?;

        if self.infer_populations {
            samples = sample::Map::infer(samples.samples().cloned())?;
        }

        let analysis = engine.analyze_labels(&samples)?;

        let mut writer = io::stdout().lock();
        if self.args.json {
            report::write_json(&mut writer, &analysis)?;
        } else {
            report::write_text(&mut writer, &analysis, self.args.precision)?;
        }

        Ok(())
    }
}
