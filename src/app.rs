use std::path::Path;

use anyhow::{Context, Result};

use crate::exec::{self, RunConfig};
use crate::manifest::{self, ManifestBuilder, ManifestConfig, OnMissing};
use crate::settings::{Action, Settings};
use crate::ui::Ui;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No FragPipe search results found in {0}")]
    NoResults(String),
}

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let ui = Ui::new(&settings);
        Self { settings, ui }
    }

    /// Run the app, using settings to determine which command to run.
    pub fn run(mut self) -> Result<()> {
        self.ui.start_timer();
        match &self.settings.action {
            Action::Manifest {
                sdrf,
                output,
                config,
            } => self.build_manifest(sdrf, output, config)?,
            Action::Relink {
                manifest,
                rawfile_dir,
                on_missing,
            } => self.relink(manifest, rawfile_dir, *on_missing)?,
            Action::Run(config) => self.run_fragpipe(config)?,
            Action::Check { output } => self.check(output)?,
            Action::Clean { rawfile_dir } => self.clean(rawfile_dir)?,
        }
        self.ui.print_elapsed("Command")?;
        Ok(())
    }
}

// MANIFESTS ///////////////////
impl App {
    fn build_manifest(&self, sdrf: &Path, output: &Path, config: &ManifestConfig) -> Result<()> {
        self.ui.progress("Converting SDRF file", sdrf);
        let n = ManifestBuilder::new(config.clone())
            .build(sdrf, output)
            .with_context(|| format!("while creating manifest {:?}", output))?;
        self.ui.done();
        self.ui
            .status("WROTE", &format!("{n} manifest entries to {}", output.display()));
        Ok(())
    }

    fn relink(&self, manifest_path: &Path, rawfile_dir: &Path, on_missing: OnMissing) -> Result<()> {
        self.ui.progress("Searching for raw files in", rawfile_dir);
        let n = manifest::update_rawfile_paths_in_manifest(manifest_path, rawfile_dir, on_missing)
            .with_context(|| format!("while updating raw file paths in {:?}", manifest_path))?;
        self.ui.done();
        self.ui.status(
            "UPDATED",
            &format!("{n} raw file paths in {}", manifest_path.display()),
        );
        Ok(())
    }
}

// RUNNING /////////////////////
impl App {
    fn run_fragpipe(&self, config: &RunConfig) -> Result<()> {
        if !config.dry_run {
            self.ui.status("RUN", &format!("FragPipe from {}", config.fragpipe_dir.display()));
        }
        let outcome = match exec::run_fragpipe(config) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.ui.failure("FAILED", "FragPipe run did not complete.");
                return Err(e.context("while running FragPipe"));
            }
        };

        if config.dry_run {
            eprintln!("Dry run. Would run:\n{}", outcome.command);
            return Ok(());
        }

        self.ui.status(
            "COMPLETED",
            &format!(
                "FragPipe in {}. Results in {}",
                util::format_minutes(outcome.elapsed),
                outcome.output_dir.display()
            ),
        );
        if let Some(log_file) = &outcome.log_file {
            self.ui.status("LOG", &log_file.display().to_string());
        }
        Ok(())
    }

    fn check(&self, output: &Path) -> Result<()> {
        if exec::search_results_exist(output) {
            self.ui
                .status("FOUND", &format!("FragPipe results in {}", output.display()));
            Ok(())
        } else {
            Err(Error::NoResults(output.display().to_string()).into())
        }
    }

    fn clean(&self, rawfile_dir: &Path) -> Result<()> {
        let prompt = format!(
            "Delete FragPipe temporary files ({}) in {}?",
            exec::TEMP_FILE_SUFFIXES.join(", "),
            rawfile_dir.display()
        );
        if !self.ui.confirm(&prompt)? {
            return Ok(());
        }
        let n = exec::clean_up_rawfile_directory(rawfile_dir)?;
        self.ui
            .status("DELETED", &format!("{n} temporary files in {}", rawfile_dir.display()));
        Ok(())
    }
}
