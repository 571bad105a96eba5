/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// FragPipe command-line flag configuration
pub mod config;
/// Running FragPipe
pub mod exec;
/// Filesystem operations
mod fs;
/// SDRF to manifest conversion
pub mod manifest;
/// Interpreted command-line settings
mod settings;
/// Text UI
mod ui;

// exported for tests:
pub use app::App;
pub use args::{Args, ArgsAction};
pub use settings::{Action, Settings};

pub use exec::{clean_up_rawfile_directory, run_fragpipe, search_results_exist, RunConfig, RunOutcome};
pub use manifest::{sdrf_to_manifest, update_rawfile_paths_in_manifest, OnMissing};

/// Run the command-line app.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    simple_logging::log_to_stderr(log_level);

    // INTERPRET SETTINGS ///////////////
    let settings: Settings = args.try_into()?;

    // RUN THE THING /////////////////
    let app = App::new(settings);
    app.run()?;

    Ok(())
}
