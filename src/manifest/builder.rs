use std::path::Path;

use anyhow::{Context, Result};

use crate::fs::Fs;

use super::file::{render_manifest, ManifestEntry};
use super::sdrf::{SampleColumns, SdrfTable};
use super::{DataType, DEFAULT_FRACTION_FIELD, DEFAULT_RAWFILE_FIELDS};

/// Which SDRF columns feed which manifest columns.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    pub data_type: DataType,
    /// Column used as the experiment label, e.g. `factor value[condition]`
    pub experiment_field: String,
    /// Column used as the replicate label, e.g. `characteristics[biological replicate]`
    pub replicate_field: String,
    /// Candidate raw file columns; the first one present in the header is used.
    pub rawfile_fields: Vec<String>,
    /// Fraction column; rows without one get fraction 1.
    pub fraction_field: Option<String>,
}

impl ManifestConfig {
    /// Create a config with the default raw file and fraction columns.
    /// Fails if `data_type` is not supported.
    pub fn new(data_type: &str, experiment_field: &str, replicate_field: &str) -> Result<Self> {
        Ok(Self {
            data_type: data_type.parse()?,
            experiment_field: experiment_field.to_owned(),
            replicate_field: replicate_field.to_owned(),
            rawfile_fields: DEFAULT_RAWFILE_FIELDS.iter().map(|s| s.to_string()).collect(),
            fraction_field: Some(DEFAULT_FRACTION_FIELD.to_owned()),
        })
    }
}

/// Converts SDRF tables into manifests according to a `ManifestConfig`.
pub struct ManifestBuilder {
    config: ManifestConfig,
}

impl ManifestBuilder {
    pub fn new(config: ManifestConfig) -> Self {
        Self { config }
    }

    /// Map the configured field names onto `table`'s header.
    fn resolve_columns(&self, table: &SdrfTable) -> Result<SampleColumns> {
        let experiment = table.require_column(&self.config.experiment_field)?;
        let replicate = table.require_column(&self.config.replicate_field)?;
        let rawfile = table.first_column(&self.config.rawfile_fields)?;
        let fraction = self
            .config
            .fraction_field
            .as_deref()
            .and_then(|f| table.column(f));
        log::debug!(
            "Using SDRF columns: raw file {:?}, experiment {:?}, replicate {:?}, fraction {:?}",
            table.headers()[rawfile],
            table.headers()[experiment],
            table.headers()[replicate],
            fraction.map(|i| &table.headers()[i]),
        );
        Ok(SampleColumns {
            rawfile,
            experiment,
            replicate,
            fraction,
        })
    }

    /// One manifest entry per row of `table`, in row order.
    pub fn entries(&self, table: &SdrfTable) -> Result<Vec<ManifestEntry>> {
        let columns = self.resolve_columns(table)?;
        let entries = table
            .samples(&columns)?
            .into_iter()
            .map(|s| ManifestEntry {
                rawfile: s.rawfile,
                experiment: s.experiment,
                replicate: s.replicate,
                fraction: s.fraction.unwrap_or(1),
                data_type: self.config.data_type,
            })
            .collect();
        Ok(entries)
    }

    /// Convert the SDRF at `sdrf_path` and write the manifest to `manifest_path`,
    /// replacing any existing file. Nothing is written unless the whole conversion
    /// succeeds. Returns the number of entries written.
    pub fn build(&self, sdrf_path: &Path, manifest_path: &Path) -> Result<usize> {
        let table = SdrfTable::from_path(sdrf_path)?;
        let entries = self
            .entries(&table)
            .with_context(|| format!("while converting SDRF file {:?}", sdrf_path))?;
        let text = render_manifest(&entries)?;

        let (fs, manifest_path) = Fs::for_parent_of(manifest_path)?;
        fs.write_file(&manifest_path, text)
            .context("while writing manifest")?;

        log::info!(
            "Wrote {} manifest entries to {:?}",
            entries.len(),
            manifest_path
        );
        Ok(entries.len())
    }
}

/// Convert an SDRF file into a FragPipe manifest.
///
/// `data_type` must be "DDA"; `experiment_field` and `replicate_field` name the SDRF
/// columns used for the experiment and replicate labels. The raw file reference is
/// taken from `comment[data file]` (or `raw_file`) and the fraction from
/// `comment[fraction identifier]` when present.
pub fn sdrf_to_manifest<P: AsRef<Path>, Q: AsRef<Path>>(
    sdrf_path: P,
    data_type: &str,
    manifest_filepath: Q,
    experiment_field: &str,
    replicate_field: &str,
) -> Result<usize> {
    let config = ManifestConfig::new(data_type, experiment_field, replicate_field)?;
    ManifestBuilder::new(config).build(sdrf_path.as_ref(), manifest_filepath.as_ref())
}
