//! Continental groupings.

use std::{fmt, str::FromStr};

use serde::Serialize;

/// One of the seven continental groupings used as reference for representation.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Group {
    /// African.
    Afr,
    /// Admixed American.
    Amr,
    /// East Asian.
    Eas,
    /// European.
    Eur,
    /// South Asian.
    Sas,
    /// Oceanian.
    Oce,
    /// Middle Eastern.
    Mid,
}

impl Group {
    /// All groups, in canonical order.
    pub const ALL: [Group; 7] = [
        Group::Afr,
        Group::Amr,
        Group::Eas,
        Group::Eur,
        Group::Sas,
        Group::Oce,
        Group::Mid,
    ];

    /// The number of continental groupings.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the three-letter population code.
    pub fn code(&self) -> &'static str {
        match self {
            Group::Afr => "AFR",
            Group::Amr => "AMR",
            Group::Eas => "EAS",
            Group::Eur => "EUR",
            Group::Sas => "SAS",
            Group::Oce => "OCE",
            Group::Mid => "MID",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Group {
    type Err = UnknownGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        Group::ALL
            .into_iter()
            .find(|group| group.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownGroup(trimmed.to_string()))
    }
}

/// A label that does not name a continental grouping.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownGroup(pub String);

impl fmt::Display for UnknownGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a continental grouping", self.0)
    }
}

impl std::error::Error for UnknownGroup {}
