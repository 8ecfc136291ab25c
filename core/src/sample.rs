//! Samples and their population assignment.

use std::{fs::File, io, path::Path};

use indexmap::{map::Entry, IndexMap};

use crate::genotype::StructuralError;

pub mod population;
pub use population::Population;

/// A sample identifier.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Sample(pub String);

impl AsRef<str> for Sample {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<S> From<S> for Sample
where
    S: ToString,
{
    fn from(sample: S) -> Self {
        Self(sample.to_string())
    }
}

/// A mapping from samples to populations.
///
/// Samples keep the order in which they were added, and this order is assumed to match the sample
/// columns of a genotype matrix. Populations are numbered by first appearance, and every
/// population has at least one sample.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Map {
    samples: IndexMap<Sample, population::Id>,
    populations: population::Map,
}

impl Map {
    /// Header names of the sample column, compared case-insensitively.
    const SAMPLE_COLUMNS: &'static [&'static str] = &["sample_id", "sample", "id", "iid"];

    /// Header names of the population column, compared case-insensitively.
    const POPULATION_COLUMNS: &'static [&'static str] =
        &["population", "ancestry", "pop", "superpopulation"];

    /// Creates a mapping from samples and their populations, in order.
    ///
    /// # Errors
    ///
    /// If a sample occurs more than once.
    pub fn try_from_iter<I, S, P>(iter: I) -> Result<Self, StructuralError>
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<Sample>,
        P: Into<Population>,
    {
        let mut map = Self::default();

        for (sample, population) in iter {
            map.insert(sample.into(), population.into())?;
        }

        Ok(map)
    }

    fn insert(&mut self, sample: Sample, population: Population) -> Result<(), StructuralError> {
        match self.samples.entry(sample) {
            Entry::Occupied(entry) => Err(StructuralError::DuplicateSample {
                sample: entry.key().0.clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(self.populations.get_or_insert(population));
                Ok(())
            }
        }
    }

    /// Creates a mapping of the provided samples in order, looking up their population in
    /// another mapping.
    ///
    /// Samples not in the other mapping are assigned an unknown population.
    ///
    /// # Errors
    ///
    /// If a sample occurs more than once.
    pub fn align<I, S>(samples: I, other: &Map) -> Result<Self, StructuralError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Sample>,
    {
        Self::try_from_iter(samples.into_iter().map(|sample| {
            let sample: Sample = sample.into();
            let population = other
                .get(&sample)
                .cloned()
                .unwrap_or(Population::Unknown);
            (sample, population)
        }))
    }

    /// Reads a mapping from a path, see [`Map::from_reader`].
    pub fn from_path<P>(path: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        File::open(path).and_then(Self::from_reader)
    }

    /// Reads a mapping from a reader.
    ///
    /// Fields are tab- or comma-delimited. If the first line is a header naming a sample column
    /// (`sample_id`, `sample`, `id`, or `iid`) or a population column (`population`, `ancestry`,
    /// `pop`, or `superpopulation`), those columns are used in any order, and other columns are
    /// ignored. A header without sample column gives samples named `SAMPLE_0`, `SAMPLE_1`, and
    /// so on. Without header, each line holds a sample name, optionally followed by a population
    /// label. A sample without label has unknown population.
    ///
    /// # Errors
    ///
    /// If reading fails, if a header has no population column, or if a sample occurs more than
    /// once.
    pub fn from_reader<R>(mut reader: R) -> io::Result<Self>
    where
        R: io::Read,
    {
        let mut s = String::new();
        let _ = reader.read_to_string(&mut s)?;

        Self::from_str(&s)
    }

    fn from_str(s: &str) -> io::Result<Self> {
        let mut lines = s
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split(['\t', ',']).map(str::trim).collect::<Vec<_>>())
            .peekable();

        let columns = match lines.peek() {
            Some(first) => Columns::from_header(first)?,
            None => None,
        };
        if columns.is_some() {
            let _ = lines.next();
        }
        let columns = columns.unwrap_or_default();

        Self::try_from_iter(lines.enumerate().map(|(i, fields)| {
            let sample = match columns.sample {
                Some(column) => Sample::from(fields.get(column).copied().unwrap_or_default()),
                None => Sample(format!("SAMPLE_{i}")),
            };
            let population = fields.get(columns.population).copied();
            (sample, Population::from(population))
        }))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Creates a mapping by inferring populations from sample name prefixes.
    ///
    /// See [`Population::infer_from_sample`].
    ///
    /// # Errors
    ///
    /// If a sample occurs more than once.
    pub fn infer<I, S>(samples: I) -> Result<Self, StructuralError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Sample>,
    {
        Self::try_from_iter(samples.into_iter().map(|sample| {
            let sample: Sample = sample.into();
            let population = Population::infer_from_sample(sample.as_ref());
            (sample, population)
        }))
    }

    /// Returns the population of a sample.
    pub fn get(&self, sample: &Sample) -> Option<&Population> {
        self.samples
            .get(sample)
            .and_then(|&id| self.populations.get_by_id(id))
    }

    /// Returns `true` if the mapping contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns the population for an id.
    pub fn population(&self, id: population::Id) -> Option<&Population> {
        self.populations.get_by_id(id)
    }

    /// Returns the population id of each sample, in sample order.
    pub fn population_ids(&self) -> impl Iterator<Item = population::Id> + '_ {
        self.samples.values().copied()
    }

    /// Returns the indices of the samples in each population, indexed by population id.
    pub fn population_indices(&self) -> Vec<Vec<usize>> {
        let mut indices = vec![Vec::new(); self.populations.len()];
        for (i, id) in self.population_ids().enumerate() {
            indices[id.0].push(i);
        }
        indices
    }

    /// Returns the number of samples in each population, indexed by population id.
    pub fn population_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.populations.len()];
        for id in self.population_ids() {
            sizes[id.0] += 1;
        }
        sizes
    }

    /// Returns the populations with their ids, in order of first appearance.
    pub fn populations(&self) -> impl Iterator<Item = (population::Id, &Population)> {
        self.populations.iter()
    }

    /// Returns the number of populations, including any unknown population.
    pub fn number_of_populations(&self) -> usize {
        self.populations.len()
    }

    /// Returns the samples in order.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.keys()
    }
}

/// Positions of the sample and population fields on the lines of a sample map.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Columns {
    sample: Option<usize>,
    population: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            sample: Some(0),
            population: 1,
        }
    }
}

impl Columns {
    /// Returns the columns named by a header line, or `None` if the line is not a header.
    fn from_header(fields: &[&str]) -> io::Result<Option<Self>> {
        let sample = position(fields, Map::SAMPLE_COLUMNS);

        match (sample, position(fields, Map::POPULATION_COLUMNS)) {
            (_, Some(population)) => Ok(Some(Self { sample, population })),
            (Some(_), None) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "no population column in header '{}', expected one of: {}",
                    fields.join(","),
                    Map::POPULATION_COLUMNS.join(", ")
                ),
            )),
            (None, None) => Ok(None),
        }
    }
}

fn position(fields: &[&str], names: &[&str]) -> Option<usize> {
    fields
        .iter()
        .position(|field| names.iter().any(|name| name.eq_ignore_ascii_case(field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(label: &str) -> Population {
        Population::Named(label.to_string())
    }

    #[test]
    fn test_from_str_tab_and_comma() {
        let map = Map::from_str("s0\tAFR\ns1,EUR\ns2\n\ns3\tAFR\n").unwrap();

        assert_eq!(map.len(), 4);
        assert_eq!(map.number_of_populations(), 3);
        assert_eq!(map.get(&Sample::from("s1")), Some(&named("EUR")));
        assert_eq!(map.get(&Sample::from("s2")), Some(&Population::Unknown));
        assert_eq!(map.population_sizes(), vec![2, 1, 1]);
        assert_eq!(map.population_indices(), vec![vec![0, 3], vec![1], vec![2]]);
    }

    #[test]
    fn test_from_str_skips_header() {
        let map = Map::from_str("sample_id,population\nAFR_1,AFR\n").unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(
            map.samples().collect::<Vec<_>>(),
            vec![&Sample::from("AFR_1")]
        );
    }

    #[test]
    fn test_from_str_header_with_extra_column() {
        let map = Map::from_str("sample_id,population,sex\ns1,AFR,F\ns2,EUR,M\n").unwrap();

        assert_eq!(map.get(&Sample::from("s1")), Some(&named("AFR")));
        assert_eq!(map.get(&Sample::from("s2")), Some(&named("EUR")));
        assert_eq!(map.number_of_populations(), 2);
    }

    #[test]
    fn test_from_str_header_population_first() {
        let map = Map::from_str("Ancestry\tcohort\tIID\nEAS\tx\ts1\nSAS\ty\ts2\n").unwrap();

        assert_eq!(
            map.samples().map(|s| s.0.as_str()).collect::<Vec<_>>(),
            vec!["s1", "s2"]
        );
        assert_eq!(map.get(&Sample::from("s1")), Some(&named("EAS")));
        assert_eq!(map.get(&Sample::from("s2")), Some(&named("SAS")));
    }

    #[test]
    fn test_from_str_header_without_sample_column() {
        let map = Map::from_str("superpopulation\nAFR\nEUR\nEUR\n").unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&Sample::from("SAMPLE_2")), Some(&named("EUR")));
        assert_eq!(map.population_sizes(), vec![1, 2]);
    }

    #[test]
    fn test_from_str_header_without_population_column() {
        let result = Map::from_str("sample_id,label\ns1,AFR\n");

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_from_str_duplicate_sample() {
        let result = Map::from_str("s1\tAFR\ns2\tEUR\ns1\tEAS\n");

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_from_reader() {
        let map = Map::from_reader("a\tEAS\nb\tunknown\n".as_bytes()).unwrap();

        assert_eq!(map.get(&Sample::from("b")), Some(&Population::Unknown));
    }

    #[test]
    fn test_try_from_iter_duplicate_sample() {
        let result = Map::try_from_iter([("a", "AFR"), ("a", "EUR"), ("b", "EUR"), ("c", "EAS")]);

        assert_eq!(
            result,
            Err(StructuralError::DuplicateSample {
                sample: String::from("a")
            })
        );
    }

    #[test]
    fn test_every_population_has_samples() {
        let map = Map::try_from_iter([("a", "afr"), ("b", "AFR"), ("c", "EUR")]).unwrap();

        assert_eq!(map.number_of_populations(), 2);
        assert!(map.population_sizes().iter().all(|&n| n > 0));
    }

    #[test]
    fn test_align() {
        let reference = Map::try_from_iter([("a", "AFR"), ("b", "EUR")]).unwrap();
        let aligned = Map::align(["b", "c", "a"], &reference).unwrap();

        assert_eq!(
            aligned.samples().map(|s| s.0.as_str()).collect::<Vec<_>>(),
            vec!["b", "c", "a"]
        );
        assert_eq!(aligned.get(&Sample::from("c")), Some(&Population::Unknown));
        assert_eq!(aligned.get(&Sample::from("a")), Some(&named("AFR")));
    }

    #[test]
    fn test_align_duplicate_sample() {
        let reference = Map::try_from_iter([("a", "AFR")]).unwrap();

        assert!(Map::align(["a", "a"], &reference).is_err());
    }

    #[test]
    fn test_infer() {
        let map = Map::infer(["AFR_1", "EUR_2", "X"]).unwrap();

        assert_eq!(map.get(&Sample::from("X")), Some(&Population::Unknown));
        assert_eq!(map.number_of_populations(), 3);
    }
}
