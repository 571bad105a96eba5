use std::path::Path;

use anyhow::Result;

use crate::fs::Fs;

/// Intermediate files FragPipe leaves next to the raw files.
pub const TEMP_FILE_SUFFIXES: &[&str] = &[".mzBIN", "_uncalibrated.mzML"];

/// Check whether `output_dir` holds the results of a FragPipe search:
/// either a FragPipe log file or a `combined_protein.tsv`.
pub fn search_results_exist<P: AsRef<Path>>(output_dir: P) -> bool {
    let output_dir = output_dir.as_ref();
    if !output_dir.is_dir() {
        return false;
    }
    let fs = Fs::new(output_dir, true);

    if matches!(fs.find_latest_log_file(output_dir), Ok(Some(_))) {
        return true;
    }
    let mut buf = std::path::PathBuf::with_capacity(256);
    if fs.exists(fs.combined_protein(&mut buf)) {
        log::debug!(
            "FragPipe search results found in {:?}, but no log file found.",
            output_dir
        );
        return true;
    }
    false
}

/// Delete FragPipe's temporary files (`.mzBIN`, `_uncalibrated.mzML`) anywhere below
/// `rawfile_dir`. Returns the number of files deleted.
pub fn clean_up_rawfile_directory<P: AsRef<Path>>(rawfile_dir: P) -> Result<usize> {
    let rawfile_dir = rawfile_dir.as_ref();
    if !rawfile_dir.exists() {
        log::warn!("Raw directory {:?} does not exist.", rawfile_dir);
        return Ok(0);
    }
    if !rawfile_dir.is_dir() {
        log::warn!("Raw directory {:?} is not a directory.", rawfile_dir);
        return Ok(0);
    }

    let fs = Fs::new(rawfile_dir, false);
    let mut temp_files = Vec::new();
    fs.find_files_with_suffix(rawfile_dir, TEMP_FILE_SUFFIXES, &mut temp_files)?;
    log::debug!(
        "Trying to remove {} temporary FragPipe files in {:?}.",
        temp_files.len(),
        rawfile_dir
    );
    if temp_files.is_empty() {
        return Ok(0);
    }

    for file in &temp_files {
        fs.delete_file(file)?;
    }
    log::info!(
        "Deleted {} temporary FragPipe files in {:?}.",
        temp_files.len(),
        rawfile_dir
    );
    Ok(temp_files.len())
}
