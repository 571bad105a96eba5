use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::args::{Args, ArgsAction};
use crate::config::{Config, ToolCli};
use crate::exec::RunConfig;
use crate::manifest::{ManifestConfig, OnMissing};

/// What the user asked us to do, with defaults filled in.
#[derive(Debug)]
pub enum Action {
    Manifest {
        sdrf: PathBuf,
        output: PathBuf,
        config: ManifestConfig,
    },
    Relink {
        manifest: PathBuf,
        rawfile_dir: PathBuf,
        on_missing: OnMissing,
    },
    Run(RunConfig),
    Check {
        output: PathBuf,
    },
    Clean {
        rawfile_dir: PathBuf,
    },
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in.
#[derive(Debug)]
pub struct Settings {
    pub yes: bool,
    pub verbose: u8,
    pub action: Action,
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let action = match args.action {
            ArgsAction::Manifest {
                sdrf,
                output,
                data_type,
                experiment_field,
                replicate_field,
                rawfile_fields,
                fraction_field,
            } => {
                let mut config = ManifestConfig::new(&data_type, &experiment_field, &replicate_field)?;
                if !rawfile_fields.is_empty() {
                    config.rawfile_fields = rawfile_fields;
                }
                if fraction_field.is_some() {
                    config.fraction_field = fraction_field;
                }
                Action::Manifest {
                    sdrf: sdrf.into(),
                    output: output.into(),
                    config,
                }
            }
            ArgsAction::Relink {
                manifest,
                rawfile_dir,
                skip_missing,
            } => Action::Relink {
                manifest: manifest.into(),
                rawfile_dir: rawfile_dir.into(),
                on_missing: if skip_missing {
                    OnMissing::Skip
                } else {
                    OnMissing::Abort
                },
            },
            ArgsAction::Run {
                fragpipe_dir,
                workflow,
                manifest,
                output,
                ram,
                threads,
                temp_dir,
                cli_config,
                dry_run,
            } => {
                let mut config = RunConfig::new(fragpipe_dir, workflow, manifest, output);
                config.ram = ram;
                config.threads = threads;
                config.temp_dir = temp_dir.map(PathBuf::from);
                config.cli = load_cli(cli_config.as_deref().map(Path::new))?;
                config.dry_run = dry_run;
                config.echo_output = args.verbose > 0;
                Action::Run(config)
            }
            ArgsAction::Check { output } => Action::Check {
                output: output.into(),
            },
            ArgsAction::Clean { rawfile_dir } => Action::Clean {
                rawfile_dir: rawfile_dir.into(),
            },
        };

        Ok(Self {
            yes: args.yes,
            verbose: args.verbose,
            action,
        })
    }
}

fn load_cli(path: Option<&Path>) -> Result<ToolCli> {
    match path {
        Some(path) => {
            log::debug!("Loading FragPipe CLI flags from {:?}", path);
            Ok(Config::from_file(path)?.fragpipe)
        }
        None => Ok(ToolCli::default()),
    }
}
