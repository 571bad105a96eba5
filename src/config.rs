//! FragPipe's command-line flags, optionally loaded from a TOML file.
//!
//! The flag names are a compatibility contract with a particular FragPipe release
//! (the defaults match FragPipe v23). If a release renames them, point `fpr run`
//! at a file like this with `--cli-config`:
//!
//! ```toml
//! [fragpipe]
//! headless = "--headless"
//! workflow = "--workflow"
//! manifest = "--manifest"
//! workdir = "--workdir"
//! ram = "--ram"
//! threads = "--threads"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Root of a CLI config file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fragpipe: ToolCli,
}

/// Flag names passed to the FragPipe executable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolCli {
    /// Selects headless (non-GUI) execution
    pub headless: String,
    /// Precedes the workflow file path
    pub workflow: String,
    /// Precedes the manifest file path
    pub manifest: String,
    /// Precedes the directory FragPipe writes results to
    pub workdir: String,
    /// Precedes the memory limit in GB
    pub ram: String,
    /// Precedes the thread count
    pub threads: String,
}

impl Default for ToolCli {
    fn default() -> Self {
        Self {
            headless: "--headless".to_owned(),
            workflow: "--workflow".to_owned(),
            manifest: "--manifest".to_owned(),
            workdir: "--workdir".to_owned(),
            ram: "--ram".to_owned(),
            threads: "--threads".to_owned(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
