use std::path::{Path, PathBuf};

use super::Fs;

/// Name of the file FragPipe's stdout is redirected to while it runs.
pub const REDIRECT_LOG: &str = "fragpipe_stdout_redirect.log";
/// Summary table FragPipe writes when a search completes.
pub const COMBINED_PROTEIN: &str = "combined_protein.tsv";

/// Utility fns for making common paths inside the whitelisted dir.
/// When running FragPipe, the prefix is the final output directory.
impl Fs {
    /// $OUTPUT/fragpipe_stdout_redirect.log
    pub fn redirect_log<'a>(&self, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(&self.prefix, REDIRECT_LOG, buf)
    }

    /// $OUTPUT/combined_protein.tsv
    pub fn combined_protein<'a>(&self, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(&self.prefix, COMBINED_PROTEIN, buf)
    }

    /// $OUTPUT/log_YYYY-MM-DD_HH-MM-SS.txt
    pub fn log_file<'a>(&self, timestamp: &str, buf: &'a mut PathBuf) -> &'a Path {
        buf.clear();
        buf.push(&self.prefix);
        buf.push(format!("log_{timestamp}.txt"));
        &*buf
    }

    fn parts2<'a, T, U>(&self, p1: T, p2: U, buf: &'a mut PathBuf) -> &'a Path
    where
        T: AsRef<Path>,
        U: AsRef<Path>,
    {
        buf.clear();
        buf.push(p1);
        buf.push(p2);
        &*buf
    }
}
