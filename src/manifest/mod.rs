//! # Manifest module
//!
//! Builds FragPipe manifest files from SDRF sample metadata and rewrites the
//! raw file paths of existing manifests.
//!
//! A manifest is a headerless, tab-separated file with one line per raw file:
//!
//! ```text
//! /data/sample1.raw	control	1	1	DDA
//! /data/sample2.raw	treated	1	1	DDA
//! ```
//!
//! The columns are raw file path, experiment, replicate, fraction and data type.

use std::fmt;
use std::str::FromStr;

mod builder;
mod file;
mod relink;
mod sdrf;

pub use builder::{sdrf_to_manifest, ManifestBuilder, ManifestConfig};
pub use file::{read_manifest, render_manifest, ManifestEntry};
pub use relink::{update_rawfile_paths_in_manifest, OnMissing};
pub use sdrf::{SampleColumns, SampleRow, SdrfTable};

/// Default SDRF columns searched (in order) for the raw file reference.
pub const DEFAULT_RAWFILE_FIELDS: &[&str] = &["comment[data file]", "raw_file"];
/// Default SDRF column holding the fraction number.
pub const DEFAULT_FRACTION_FIELD: &str = "comment[fraction identifier]";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unsupported data type \"{0}\"; only DDA is supported")]
    UnsupportedDataType(String),
    #[error("Column \"{field}\" not found in SDRF header of {file}")]
    MissingField { field: String, file: String },
    #[error("No raw file column ({expected}) found in SDRF header of {file}")]
    MissingRawfileColumn { expected: String, file: String },
    #[error("Line {line} has {found} fields but the header declares {expected}")]
    ShortRow {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("Line {line} has an empty raw file reference")]
    EmptyRawfile { line: u64 },
    #[error("Line {line} has invalid fraction \"{value}\"; expected a positive integer")]
    InvalidFraction { line: u64, value: String },
    #[error("Manifest line {line} has no usable raw file path")]
    MalformedManifestLine { line: u64 },
    #[error("Raw file \"{name}\" not found in {dir}")]
    RawfileNotFound { name: String, dir: String },
    #[error("Path not found: {0}")]
    PathNotFound(String),
}

/// Acquisition type written in the last manifest column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataType {
    /// Data-dependent acquisition
    #[default]
    Dda,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Dda => "DDA",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("DDA") {
            Ok(DataType::Dda)
        } else {
            Err(Error::UnsupportedDataType(s.to_owned()))
        }
    }
}
