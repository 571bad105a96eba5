/// Runs FragPipe headless
mod fragpipe;
pub use fragpipe::{build_command, executable_path, run_fragpipe, RunConfig, RunOutcome};

/// Inspecting and cleaning up after FragPipe runs
mod results;
pub use results::{clean_up_rawfile_directory, search_results_exist, TEMP_FILE_SUFFIXES};

/// Run a subprocess
mod run_cmd;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path not found: {0}")]
    PathNotFound(String),
    #[error("Unsupported operating system: {0}")]
    UnsupportedPlatform(String),
    #[error("Child process {0} was not captured")]
    StreamNotCaptured(&'static str),
    #[error("Thread reading child {0} panicked")]
    StreamThreadPanicked(&'static str),
    #[error("FragPipe {}; a partial log may be found at {log}\nError output:\n{stderr}", describe_exit(.code))]
    ExternalTool {
        /// Exit code, or `None` if the process was killed by a signal
        code: Option<i32>,
        /// Everything the process wrote to stderr
        stderr: String,
        log: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_owned(),
    }
}
