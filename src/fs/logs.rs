//! Utility functions for finding the log files FragPipe leaves in its output dir.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::Fs;

/// Length of "log_YYYY-MM-DD_HH-MM-SS.txt".
const LOG_NAME_LEN: usize = 27;

/// True if `name` looks like a log file written by FragPipe.
pub fn is_fragpipe_log_name(name: &str) -> bool {
    name.len() == LOG_NAME_LEN && name.starts_with("log_") && name.ends_with(".txt")
}

impl Fs {
    /// Find the most recent FragPipe log file in `dir`, if there is one.
    /// Timestamps sort lexicographically, so the greatest name is the latest.
    pub fn find_latest_log_file(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let mut latest: Option<PathBuf> = None;
        for entry in self.read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_fragpipe_log_name(name) || !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if latest.as_ref().map_or(true, |l| path > *l) {
                latest = Some(path);
            }
        }
        Ok(latest)
    }
}
