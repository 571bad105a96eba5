use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::StringRecord;

use util::HashMap;

use super::Error;

/// One sample of an SDRF table, reduced to the fields a manifest needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
    pub rawfile: String,
    pub experiment: String,
    pub replicate: String,
    pub fraction: Option<u32>,
}

/// A tab-separated SDRF table with its header mapped to column indexes.
///
/// Header names are trimmed but otherwise matched exactly. When a name occurs
/// more than once (SDRF allows repeated `comment[...]` columns), the first one wins.
#[derive(Debug)]
pub struct SdrfTable {
    /// Used in error messages
    source: String,
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl SdrfTable {
    /// Read an SDRF table from a TSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::PathNotFound(path.display().to_string()).into());
        }
        let file = File::open(path).with_context(|| format!("opening SDRF file {:?}", path))?;
        Self::from_reader(file, &path.display().to_string())
            .with_context(|| format!("while reading SDRF file {:?}", path))
    }

    /// Read an SDRF table from any reader. `source` names it in error messages.
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
            .collect();

        let mut index = HashMap::default();
        for (i, h) in headers.iter().enumerate() {
            index.entry(h.clone()).or_insert(i);
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            if record.len() < headers.len() {
                return Err(Error::ShortRow {
                    line,
                    expected: headers.len(),
                    found: record.len(),
                }
                .into());
            }
            rows.push(record);
        }

        log::debug!("Read SDRF with {} columns and {} rows", headers.len(), rows.len());

        Ok(Self {
            source: source.to_owned(),
            headers,
            index,
            rows,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column named `name`, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Index of the column named `name`, or a `MissingField` error.
    pub fn require_column(&self, name: &str) -> Result<usize, Error> {
        self.column(name).ok_or_else(|| Error::MissingField {
            field: name.to_owned(),
            file: self.source.clone(),
        })
    }

    /// Index of the first of `candidates` present in the header.
    pub fn first_column(&self, candidates: &[String]) -> Result<usize, Error> {
        candidates
            .iter()
            .find_map(|c| self.column(c))
            .ok_or_else(|| Error::MissingRawfileColumn {
                expected: candidates.join(", "),
                file: self.source.clone(),
            })
    }

    /// Extract one `SampleRow` per data row, in source order.
    pub fn samples(&self, columns: &SampleColumns) -> Result<Vec<SampleRow>, Error> {
        let mut samples = Vec::with_capacity(self.rows.len());
        for record in &self.rows {
            let line = record.position().map_or(0, |p| p.line());
            let cell = |i: usize| record.get(i).unwrap_or_default().trim();

            let rawfile = cell(columns.rawfile);
            if rawfile.is_empty() {
                return Err(Error::EmptyRawfile { line });
            }

            let fraction = match columns.fraction.map(cell) {
                Some(value) if !value.is_empty() => Some(parse_fraction(value, line)?),
                _ => None,
            };

            samples.push(SampleRow {
                rawfile: rawfile.to_owned(),
                experiment: cell(columns.experiment).to_owned(),
                replicate: cell(columns.replicate).to_owned(),
                fraction,
            });
        }
        Ok(samples)
    }
}

/// Column indexes resolved against an `SdrfTable` header.
#[derive(Debug, Clone, Copy)]
pub struct SampleColumns {
    pub rawfile: usize,
    pub experiment: usize,
    pub replicate: usize,
    pub fraction: Option<usize>,
}

fn parse_fraction(value: &str, line: u64) -> Result<u32, Error> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidFraction {
            line,
            value: value.to_owned(),
        }),
    }
}
