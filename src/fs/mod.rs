use std::path::{Path, PathBuf};
use std::{fs, io};

use anyhow::{Context, Result};

use util::{path_str, PathEncodingError};

/// Utility fns
mod ops;

/// Defines fns for creating common paths below the whitelisted prefix
mod paths;

/// Locating FragPipe log files
mod logs;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Path is neither file nor dir: {0}")]
    UnknownPathType(String),
    #[error("Specified directory \"{0}\" is not a directory")]
    NotDirectory(String),
    #[error("Can't perform IO operation: \"{0}\" is not whitelisted")]
    NotWhitelisted(String),
    #[error("Path has no parent directory: {0}")]
    NoParent(String),
}

/// All file operations in the crate should go through this struct.
///
/// All destructive operations check that the path in question is a child of the
/// single whitelisted prefix (the output dir, the manifest's dir, or the raw file dir,
/// depending on the operation), otherwise they will not be performed.
/// FragPipe itself is of course free to write wherever it likes.
#[derive(Debug)]
pub struct Fs {
    /// The directory we are allowed to modify
    prefix: PathBuf,
    /// if true, prevents all destructive operations
    dry_run: bool,
}

impl Fs {
    /// Create a new `Fs` with the given whitelisted directory.
    pub fn new(prefix: &Path, dry_run: bool) -> Self {
        Self {
            prefix: prefix.to_path_buf(),
            dry_run,
        }
    }

    /// Create an `Fs` whitelisting the (existing) parent directory of `file`.
    /// Returns it along with the absolute path of `file`.
    pub fn for_parent_of(file: &Path) -> Result<(Self, PathBuf)> {
        let name = file
            .file_name()
            .ok_or_else(|| Error::NoParent(file.display().to_string()))?;
        let parent = match file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let parent = parent
            .canonicalize()
            .with_context(|| format!("resolving directory of {:?}", file))?;
        let abs = parent.join(name);
        Ok((Self::new(&parent, false), abs))
    }

    /// The whitelisted directory.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Check whether the whitelisted dir exists, and create it if not.
    /// Afterwards the prefix is absolute, even in a dry run.
    pub fn ensure_prefix_dir_exists(&mut self) -> Result<()> {
        if !self.prefix.exists() {
            if self.dry_run {
                log::info!("Dry run. Not creating directory {:?}", self.prefix);
                // can't canonicalize a dir that doesn't exist:
                self.prefix = std::path::absolute(&self.prefix)?;
                return Ok(());
            }
            log::info!("Directory {:?} doesn't exist. Creating.", self.prefix);
            fs::create_dir_all(&self.prefix).context("creating output directory")?;
        } else if !self.prefix.is_dir() {
            return Err(Error::NotDirectory(path_str(&self.prefix)?.to_owned()).into());
        } else {
            log::debug!("Directory {:?} already exists. Not creating.", self.prefix);
        }

        self.prefix = self.prefix.canonicalize()?;
        Ok(())
    }

    /// Check if path exists on disk.
    pub fn exists<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.exists() || path.is_symlink()
    }

    /// Check if path exists and is a directory.
    pub fn is_dir<T: AsRef<Path>>(&self, path: T) -> Result<bool> {
        let path = path.as_ref();
        if path.is_dir() || (path.is_symlink() && path.canonicalize()?.is_dir()) {
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Create a directory (uses `std::fs::create_dir_all`, so an entire tree of dirs can be created).
    pub fn create_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::create_dir_all(path).context("creating dir")?;
        Ok(())
    }

    /// Create a file, and return a writable `File` handle.
    pub fn create_file<T: AsRef<Path>>(&self, path: T) -> Result<fs::File> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        let f = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        Ok(f)
    }

    /// Write an entire buffer to a file, replacing its contents.
    pub fn write_file<T: AsRef<Path>, B: AsRef<[u8]>>(&self, path: T, contents: B) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::write(path, contents).with_context(|| format!("writing file {:?}", path))?;
        Ok(())
    }

    /// Delete a file.
    pub fn delete_file<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::remove_file(path).with_context(|| format!("deleting file {:?}", path))?;
        Ok(())
    }

    /// Delete a directory, which must be empty.
    pub fn delete_empty_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::remove_dir(path).with_context(|| format!("deleting dir {:?}", path))?;
        Ok(())
    }

    /// Rename a file within the whitelisted dir.
    pub fn rename<T: AsRef<Path>, U: AsRef<Path>>(&self, src: T, tgt: U) -> Result<()> {
        let (src, tgt) = (src.as_ref(), tgt.as_ref());
        self.check_whitelist(src)?;
        self.check_whitelist(tgt)?;
        fs::rename(src, tgt).with_context(|| format!("renaming {:?} to {:?}", src, tgt))?;
        Ok(())
    }

    /// Move everything in `src_dir` into `tgt_dir`, merging directories and replacing
    /// existing files, then remove `src_dir`.
    pub fn merge_dir_into<T: AsRef<Path>, U: AsRef<Path>>(&self, src_dir: T, tgt_dir: U) -> Result<()> {
        let (src_dir, tgt_dir) = (src_dir.as_ref(), tgt_dir.as_ref());
        self.check_whitelist(tgt_dir)?;
        ops::merge_move(src_dir, tgt_dir)
            .with_context(|| format!("moving contents of {:?} to {:?}", src_dir, tgt_dir))?;
        Ok(())
    }

    /// List entries in a directory
    pub fn read_dir<T: AsRef<Path>>(&self, path: T) -> Result<fs::ReadDir, io::Error> {
        fs::read_dir(path)
    }

    /// Recursively collect all files below `dir` whose names end with one of `suffixes`.
    pub fn find_files_with_suffix<T: AsRef<Path>>(
        &self,
        dir: T,
        suffixes: &[&str],
        found: &mut Vec<PathBuf>,
    ) -> Result<()> {
        for entry in self.read_dir(dir.as_ref())? {
            let entry = entry?;
            let ty = entry.file_type()?;
            let path = entry.path();
            if ty.is_dir() {
                self.find_files_with_suffix(&path, suffixes, found)?;
            } else if let Some(name) = entry.file_name().to_str() {
                if suffixes.iter().any(|s| name.ends_with(s)) {
                    found.push(path);
                }
            }
        }
        Ok(())
    }

    fn is_whitelisted<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        if path.starts_with(&self.prefix) {
            return true;
        }
        false
    }

    fn check_whitelist(&self, path: &Path) -> Result<()> {
        if self.dry_run || !self.is_whitelisted(path) {
            Err(Error::NotWhitelisted(path.to_str().ok_or(PathEncodingError)?.to_owned()).into())
        } else {
            Ok(())
        }
    }
}
