use std::io::Read;

use anyhow::Result;
use csv::StringRecord;

use super::DataType;

/// One line of a FragPipe manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub rawfile: String,
    pub experiment: String,
    pub replicate: String,
    pub fraction: u32,
    pub data_type: DataType,
}

impl ManifestEntry {
    fn to_record(&self) -> [String; 5] {
        [
            self.rawfile.clone(),
            self.experiment.clone(),
            self.replicate.clone(),
            self.fraction.to_string(),
            self.data_type.to_string(),
        ]
    }
}

fn writer(buf: &mut Vec<u8>, terminator: csv::Terminator) -> csv::Writer<&mut Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(terminator)
        .has_headers(false)
        .flexible(true)
        .from_writer(buf)
}

/// Render `entries` to manifest text, one tab-separated line per entry.
pub fn render_manifest(entries: &[ManifestEntry]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(entries.len() * 64);
    {
        let mut w = writer(&mut buf, csv::Terminator::Any(b'\n'));
        for entry in entries {
            w.write_record(entry.to_record())?;
        }
        w.flush()?;
    }
    Ok(buf)
}

/// Line terminator used by existing manifest text: CRLF if its first line ends
/// with one, `\n` otherwise.
pub(super) fn line_ending(text: &[u8]) -> csv::Terminator {
    match text.iter().position(|b| *b == b'\n') {
        Some(i) if i > 0 && text[i - 1] == b'\r' => csv::Terminator::CRLF,
        _ => csv::Terminator::Any(b'\n'),
    }
}

/// Render raw manifest records, keeping every field as-is.
pub(super) fn render_records(
    records: &[StringRecord],
    terminator: csv::Terminator,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(records.len() * 64);
    {
        let mut w = writer(&mut buf, terminator);
        for record in records {
            w.write_record(record)?;
        }
        w.flush()?;
    }
    Ok(buf)
}

/// Read every non-blank line of a manifest as a list of fields.
pub fn read_manifest<R: Read>(reader: R) -> Result<Vec<StringRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(false)
        .from_reader(reader);

    let mut records = Vec::new();
    for record in csv_reader.records() {
        records.push(record?);
    }
    Ok(records)
}
