use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::StringRecord;

use util::{path_str, HashMap};

use crate::fs::Fs;

use super::file::{line_ending, read_manifest, render_records};
use super::Error;

/// What to do when a manifest entry's raw file isn't in the search directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnMissing {
    /// Fail without touching the manifest.
    #[default]
    Abort,
    /// Keep the entry's old path and log a warning.
    Skip,
}

/// Base name of a raw file path as written in a manifest.
/// Both separators are accepted, since manifests are often written on another OS.
fn base_name(rawfile: &str) -> &str {
    rawfile.rsplit(['/', '\\']).next().unwrap_or(rawfile)
}

/// Files directly inside `dir`, by file name, with absolute paths.
fn list_rawfiles(fs: &Fs, dir: &Path) -> Result<HashMap<OsString, PathBuf>> {
    let dir = std::path::absolute(dir)?;
    let mut files = HashMap::default();
    for entry in fs.read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        // follows symlinks, so links to raw files count too:
        if path.is_file() {
            files.insert(entry.file_name(), path);
        }
    }
    Ok(files)
}

/// Point the raw file column of the manifest at `manifest_filepath` to the files of the
/// same name in `rawfile_directory`.
///
/// Matching is on the exact file name (extension included, case-sensitive) and only
/// looks at the top level of `rawfile_directory`. All other columns, and the order of
/// entries, are left alone, and the manifest keeps its line endings (CRLF or `\n`,
/// judged by the first line). The manifest is only rewritten if every entry could be
/// handled according to `on_missing`. Returns the number of entries that were relinked.
pub fn update_rawfile_paths_in_manifest<P: AsRef<Path>, Q: AsRef<Path>>(
    manifest_filepath: P,
    rawfile_directory: Q,
    on_missing: OnMissing,
) -> Result<usize> {
    let (manifest_path, rawfile_dir) = (manifest_filepath.as_ref(), rawfile_directory.as_ref());
    let (fs, manifest_path) = Fs::for_parent_of(manifest_path)?;

    if !fs.exists(&manifest_path) {
        return Err(Error::PathNotFound(path_str(&manifest_path)?.to_owned()).into());
    }
    if !fs.is_dir(rawfile_dir)? {
        return Err(Error::PathNotFound(path_str(rawfile_dir)?.to_owned()).into());
    }

    let text = std::fs::read(&manifest_path)
        .with_context(|| format!("reading manifest {:?}", manifest_path))?;
    let terminator = line_ending(&text);
    let mut records = read_manifest(text.as_slice())
        .with_context(|| format!("while reading manifest {:?}", manifest_path))?;
    let available = list_rawfiles(&fs, rawfile_dir)
        .with_context(|| format!("while listing raw files in {:?}", rawfile_dir))?;
    log::debug!("Found {} files in {:?}", available.len(), rawfile_dir);

    let mut relinked = 0;
    for record in records.iter_mut() {
        let line = record.position().map_or(0, |p| p.line());
        let name = match record.get(0).map(base_name) {
            Some(name) if !name.is_empty() => name,
            _ => return Err(Error::MalformedManifestLine { line }.into()),
        };

        match available.get(OsStr::new(name)) {
            Some(found) => {
                *record = replace_first_field(record, path_str(found)?);
                relinked += 1;
            }
            None => match on_missing {
                OnMissing::Abort => {
                    return Err(Error::RawfileNotFound {
                        name: name.to_owned(),
                        dir: path_str(rawfile_dir)?.to_owned(),
                    }
                    .into())
                }
                OnMissing::Skip => {
                    log::warn!(
                        "Raw file {name:?} not found in {:?}; keeping path {:?}",
                        rawfile_dir,
                        &record[0]
                    );
                }
            },
        }
    }

    let text = render_records(&records, terminator)?;
    fs.write_file(&manifest_path, text)
        .context("while rewriting manifest")?;
    log::info!(
        "Updated {relinked} of {} raw file paths in {:?}",
        records.len(),
        manifest_path
    );
    Ok(relinked)
}

fn replace_first_field(record: &StringRecord, first: &str) -> StringRecord {
    let mut new = StringRecord::with_capacity(record.as_slice().len() + first.len(), record.len());
    new.push_field(first);
    for field in record.iter().skip(1) {
        new.push_field(field);
    }
    new
}
