//! Arguments shared between subcommands.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Error};

use clap::Args;
use heim_core::{
    config::DEFAULT_UNKNOWN_THRESHOLD, Config, Formula, ReferenceTable, Weights,
};

/// Options for the representation index and the HEIM score.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// HEIM score component weights.
    ///
    /// Four comma-separated weights for representation index, heterozygosity balance, FST
    /// coverage, and geographic spread, in that order. Weights must sum to 1.
    #[arg(short = 'w', long, value_name = "RI,HB,FC,GS")]
    pub weights: Option<Weights>,

    /// Unknown population threshold.
    ///
    /// If the fraction of samples with unknown or unmapped population exceeds this threshold, the
    /// representation index is undefined.
    #[arg(long, default_value_t = DEFAULT_UNKNOWN_THRESHOLD, value_name = "FLOAT")]
    pub unknown_threshold: f64,

    /// Measure representation by relative deviation.
    ///
    /// By default, the representation index is one minus the largest absolute difference between
    /// observed and reference proportions. Using this flag, differences are relative to the
    /// reference proportion.
    #[arg(long)]
    pub relative: bool,

    /// Reference proportions file.
    ///
    /// Each line should contain a continental grouping code (AFR, AMR, EAS, EUR, SAS, OCE, MID)
    /// followed by a tab- or comma-delimited proportion. All seven groupings must be present. By
    /// default, approximate global proportions of the 1000 Genomes superpopulations are used.
    #[arg(long, value_name = "FILE")]
    pub reference: Option<PathBuf>,

    /// Output precision.
    #[arg(long, default_value_t = 3, value_name = "INT")]
    pub precision: usize,

    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ScoreArgs {
    /// Returns the configuration given by the arguments.
    pub fn config(&self) -> Result<Config, Error> {
        let mut config = Config::default().set_unknown_threshold(self.unknown_threshold);

        if let Some(weights) = self.weights {
            config = config.set_weights(weights);
        }

        if self.relative {
            config = config.set_formula(Formula::RelativeDeviation);
        }

        if let Some(path) = &self.reference {
            config = config.set_reference(read_reference(path)?);
        }

        Ok(config)
    }
}

fn read_reference(path: &Path) -> Result<ReferenceTable, Error> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("failed to read reference file '{}'", path.display()))?;

    let proportions = s
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let (code, proportion) = line
                .split_once(['\t', ','])
                .with_context(|| format!("expected code and proportion in line '{line}'"))?;
            let proportion = proportion
                .trim()
                .parse::<f64>()
                .with_context(|| format!("invalid proportion in line '{line}'"))?;

            Ok((code.trim(), proportion))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    ReferenceTable::from_codes(proportions).map_err(Error::from)
}
