//! Sample population.

use std::fmt;

use indexmap::IndexSet;

use crate::group::Group;

/// A population for a sample.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Population {
    /// Named population.
    Named(String),
    /// Unknown or unmapped population.
    Unknown,
}

impl Population {
    /// Labels that are read as an unknown population, compared case-insensitively.
    pub const UNKNOWN_LABELS: &'static [&'static str] = &["", ".", "na", "unknown", "unmapped"];

    /// Returns a population from a label.
    ///
    /// Labels in [`Population::UNKNOWN_LABELS`] give [`Population::Unknown`]. A label naming a
    /// continental grouping in any case is stored as the grouping code, so `afr` and `AFR` are the
    /// same population.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();

        if Self::UNKNOWN_LABELS
            .iter()
            .any(|unknown| unknown.eq_ignore_ascii_case(label))
        {
            Self::Unknown
        } else if let Ok(group) = label.parse::<Group>() {
            Self::Named(group.code().to_string())
        } else {
            Self::Named(label.to_string())
        }
    }

    /// Infers a population from a sample identifier prefix, such as `AFR_001`.
    ///
    /// Only prefixes naming a continental grouping are recognised; anything else is unknown.
    pub fn infer_from_sample(sample: &str) -> Self {
        let prefix = sample.split('_').next().unwrap_or_default();

        match prefix.parse::<Group>() {
            Ok(group) => Self::Named(group.code().to_string()),
            Err(_) => Self::Unknown,
        }
    }

    /// Returns the continental grouping named by the population, if any.
    pub fn group(&self) -> Option<Group> {
        match self {
            Population::Named(name) => name.parse().ok(),
            Population::Unknown => None,
        }
    }

    /// Returns `true` if the population is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Population::Unknown)
    }
}

impl<S> From<Option<S>> for Population
where
    S: AsRef<str>,
{
    fn from(population: Option<S>) -> Self {
        match population {
            Some(label) => Self::parse(label.as_ref()),
            None => Self::Unknown,
        }
    }
}

impl From<&str> for Population {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Population::Named(name) => write!(f, "{name}"),
            Population::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// A numeric id for a sample population.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Id(pub usize);

impl From<Id> for usize {
    fn from(id: Id) -> Self {
        id.0
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct Map(IndexSet<Population>);

impl Map {
    pub fn get(&self, name: &Population) -> Option<Id> {
        self.0.get_index_of(name).map(Id)
    }

    pub fn get_by_id(&self, id: Id) -> Option<&Population> {
        self.0.get_index(id.0)
    }

    pub fn get_or_insert(&mut self, name: Population) -> Id {
        self.get(&name).unwrap_or_else(|| self.insert(name))
    }

    pub fn insert(&mut self, name: Population) -> Id {
        Id(self.0.insert_full(name).0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, &Population)> {
        self.0.iter().enumerate().map(|(i, p)| (Id(i), p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
