use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;

use util::{format_minutes, path_str, Timer};

use crate::config::ToolCli;
use crate::fs::Fs;

use super::run_cmd::run_cmd;
use super::Error;

/// Everything needed for one headless FragPipe run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// FragPipe installation directory (contains `bin/fragpipe`)
    pub fragpipe_dir: PathBuf,
    pub workflow_path: PathBuf,
    pub manifest_path: PathBuf,
    /// Where results end up; created if missing
    pub output_dir: PathBuf,
    /// Memory limit in GB; 0 lets FragPipe decide
    pub ram: u32,
    /// Thread count; `None` (or 0) lets FragPipe decide
    pub threads: Option<u32>,
    /// If set, FragPipe writes to a fresh directory in here and the results are moved
    /// to `output_dir` afterwards. Useful on systems with path length limits.
    pub temp_dir: Option<PathBuf>,
    /// Flag names understood by the installed FragPipe version
    pub cli: ToolCli,
    /// Validate and print the command, but don't run it
    pub dry_run: bool,
    /// Copy FragPipe's stdout and stderr to ours while it runs
    pub echo_output: bool,
}

impl RunConfig {
    pub fn new<P, Q, R, S>(fragpipe_dir: P, workflow_path: Q, manifest_path: R, output_dir: S) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
        R: Into<PathBuf>,
        S: Into<PathBuf>,
    {
        Self {
            fragpipe_dir: fragpipe_dir.into(),
            workflow_path: workflow_path.into(),
            manifest_path: manifest_path.into(),
            output_dir: output_dir.into(),
            ram: 0,
            threads: None,
            temp_dir: None,
            cli: ToolCli::default(),
            dry_run: false,
            echo_output: false,
        }
    }
}

/// Result of a successful (or dry) run.
#[derive(Debug)]
pub struct RunOutcome {
    /// The command line that was (or would have been) run
    pub command: String,
    pub output_dir: PathBuf,
    /// FragPipe's log file, or the one made from its stdout
    pub log_file: Option<PathBuf>,
    pub elapsed: Duration,
    pub stderr: String,
}

/// Location of the FragPipe launcher inside an installation directory.
pub fn executable_path(fragpipe_dir: &Path) -> Result<PathBuf, Error> {
    let name = if cfg!(windows) {
        "fragpipe.bat"
    } else if cfg!(unix) {
        "fragpipe"
    } else {
        return Err(Error::UnsupportedPlatform(std::env::consts::OS.to_owned()));
    };
    Ok(fragpipe_dir.join("bin").join(name))
}

/// Build the headless FragPipe command line.
/// `workflow`, `manifest` and `workdir` should already be absolute.
pub fn build_command(
    executable: &Path,
    workflow: &Path,
    manifest: &Path,
    workdir: &Path,
    config: &RunConfig,
) -> Command {
    let cli = &config.cli;
    let mut cmd = Command::new(executable);
    cmd.arg(&cli.headless)
        .arg(&cli.workflow)
        .arg(workflow)
        .arg(&cli.manifest)
        .arg(manifest)
        .arg(&cli.workdir)
        .arg(workdir)
        .arg(&cli.ram)
        .arg(config.ram.to_string());
    if let Some(threads) = config.threads.filter(|t| *t > 0) {
        cmd.arg(&cli.threads).arg(threads.to_string());
    }
    cmd
}

fn display_command(cmd: &Command) -> String {
    let mut s = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        s.push(' ');
        s.push_str(&arg.to_string_lossy());
    }
    s
}

fn require_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::PathNotFound(path_str(path)?.to_owned()).into());
    }
    Ok(path.canonicalize()?)
}

/// Run FragPipe in headless mode and wait for it to finish.
///
/// All inputs are checked before anything is launched. FragPipe's stdout goes to
/// `fragpipe_stdout_redirect.log` in the output directory; if FragPipe doesn't write
/// a log file of its own, that file becomes `log_<timestamp>.txt`, otherwise it is
/// deleted. A nonzero exit status is returned as `Error::ExternalTool`. If FragPipe
/// can't be started at all, the redirect log is removed and no log file is left.
///
/// Tested with FragPipe v23.
pub fn run_fragpipe(config: &RunConfig) -> Result<RunOutcome> {
    let exe = executable_path(&config.fragpipe_dir)?;
    require_path(&exe).context("FragPipe executable not found; please check the FragPipe directory")?;
    let workflow = require_path(&config.workflow_path).context("while checking workflow file")?;
    let manifest = require_path(&config.manifest_path).context("while checking manifest file")?;

    let mut out_fs = Fs::new(&config.output_dir, config.dry_run);
    out_fs
        .ensure_prefix_dir_exists()
        .context("while preparing output directory")?;
    log::info!("Running FragPipe with output directory {:?}", out_fs.prefix());

    if config.dry_run {
        let cmd = build_command(&exe, &workflow, &manifest, out_fs.prefix(), config);
        return Ok(RunOutcome {
            command: display_command(&cmd),
            output_dir: out_fs.prefix().to_path_buf(),
            log_file: None,
            elapsed: Duration::ZERO,
            stderr: String::new(),
        });
    }

    let staging = match &config.temp_dir {
        Some(root) => Some(Staging::create(root).context("while creating temporary directory")?),
        None => None,
    };
    let workdir = staging.as_ref().map_or(out_fs.prefix(), |s| s.path());
    let mut cmd = build_command(&exe, &workflow, &manifest, workdir, config);
    let command = display_command(&cmd);

    // the redirect log always lives in the final output dir, never in staging:
    let mut pathbuf = PathBuf::with_capacity(256);
    let redirect_log = out_fs.redirect_log(&mut pathbuf).to_path_buf();
    let log_handle = out_fs.create_file(&redirect_log)?;

    let timer = Timer::now();
    let result = run_cmd(&mut cmd, log_handle, config.echo_output);
    let elapsed = timer.elapsed().unwrap_or_default();

    if let Some(staging) = staging {
        staging.finish(&out_fs);
    }

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            // no exit status, so no log worth keeping:
            if let Err(del) = out_fs.delete_file(&redirect_log) {
                log::error!("Failed to remove {:?}: {del:?}", redirect_log);
            }
            return Err(e);
        }
    };

    // only look for FragPipe's own log once staged files have been moved:
    let log_file = match finalize_log(&out_fs, &redirect_log) {
        Ok(path) => Some(path),
        Err(e) => {
            log::error!("Failed to finalize FragPipe log file: {e:?}");
            None
        }
    };

    if !output.status.success() {
        let log = log_file.as_deref().unwrap_or(redirect_log.as_path());
        log::error!("FragPipe failed with {}", output.status);
        return Err(Error::ExternalTool {
            code: output.status.code(),
            stderr: output.stderr,
            log: path_str(log)?.to_owned(),
        }
        .into());
    }

    log::info!("FragPipe completed successfully in {}.", format_minutes(elapsed));
    if !output.stderr.is_empty() {
        log::debug!("FragPipe stderr output:\n{}", output.stderr);
    }

    Ok(RunOutcome {
        command,
        output_dir: out_fs.prefix().to_path_buf(),
        log_file,
        elapsed,
        stderr: output.stderr,
    })
}

/// Keep FragPipe's newest log file and drop the redirect log; if FragPipe didn't write
/// one, promote the redirect log to a timestamped log file.
fn finalize_log(fs: &Fs, redirect_log: &Path) -> Result<PathBuf> {
    if let Some(latest) = fs.find_latest_log_file(fs.prefix())? {
        fs.delete_file(redirect_log)?;
        return Ok(latest);
    }
    log::debug!(
        "No FragPipe log file found in {:?}. Using redirected stdout as the log file.",
        fs.prefix()
    );
    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let mut buf = PathBuf::with_capacity(256);
    let official = fs.log_file(&timestamp, &mut buf);
    fs.rename(redirect_log, official)?;
    Ok(official.to_path_buf())
}

/// A fresh directory inside the user's temp dir that FragPipe writes to.
struct Staging {
    dir: TempDir,
    /// the user-supplied temp dir
    root_fs: Fs,
    /// whether we created the root and should remove it again
    created_root: bool,
}

impl Staging {
    fn create(root: &Path) -> Result<Self> {
        let root_fs = Fs::new(root, false);
        let created_root = !root_fs.exists(root);
        if created_root {
            root_fs.create_dir(root)?;
        }
        let dir = tempfile::Builder::new().prefix("fragpipe-").tempdir_in(root)?;
        log::debug!("Using temporary directory {:?} for FragPipe output.", dir.path());
        Ok(Self {
            dir,
            root_fs,
            created_root,
        })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Move everything into `out_fs`'s directory and clean up. Errors are logged,
    /// since they shouldn't hide the outcome of the run itself.
    fn finish(self, out_fs: &Fs) {
        if let Err(e) = out_fs.merge_dir_into(self.dir.path(), out_fs.prefix()) {
            log::error!("Failed to move files from temp directory: {e:?}");
        }
        drop(self.dir);
        if self.created_root {
            let root = self.root_fs.prefix();
            if self.root_fs.delete_empty_dir(root).is_err() {
                log::debug!(
                    "Temporary directory {:?} could not be removed because it is not empty.",
                    root
                );
            }
        }
    }
}
