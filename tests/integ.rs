use anyhow::Result;
use fragpipe_runner::{App, Args, ArgsAction};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const CONDITION: &str = "factor value[condition]";
const REPLICATE: &str = "characteristics[biological replicate]";

const SDRF: &str = "source name\tcomment[data file]\tcomment[fraction identifier]\tfactor value[condition]\tcharacteristics[biological replicate]\n\
    ctl_1\tctl_1.raw\t1\tcontrol\t1\n\
    ctl_2\tctl_2.raw\t1\tcontrol\t2\n\
    trt_1\ttrt_1.raw\t1\ttreated\t1\n";

fn basic_args(action: ArgsAction) -> Args {
    Args {
        yes: true,
        verbose: 1,
        action,
    }
}

fn stringify(path: &Path) -> String {
    path.to_str().unwrap().to_owned()
}

fn run_app(action: ArgsAction) -> Result<()> {
    let settings = basic_args(action).try_into()?;
    App::new(settings).run()
}

fn manifest_action(sdrf: &Path, output: &Path) -> ArgsAction {
    ArgsAction::Manifest {
        sdrf: stringify(sdrf),
        output: stringify(output),
        data_type: "DDA".to_owned(),
        experiment_field: CONDITION.to_owned(),
        replicate_field: REPLICATE.to_owned(),
        rawfile_fields: Vec::with_capacity(0),
        fraction_field: None,
    }
}

#[test]
fn test_manifest_then_relink() -> Result<()> {
    let dir = tempdir()?;
    let sdrf = dir.path().join("study.sdrf.tsv");
    std::fs::write(&sdrf, SDRF)?;
    let manifest = dir.path().join("study.fp-manifest");

    run_app(manifest_action(&sdrf, &manifest))?;

    let before = std::fs::read_to_string(&manifest)?;
    assert_eq!(
        before,
        "ctl_1.raw\tcontrol\t1\t1\tDDA\nctl_2.raw\tcontrol\t2\t1\tDDA\ntrt_1.raw\ttreated\t1\t1\tDDA\n"
    );

    let raw_dir = dir.path().join("raw");
    std::fs::create_dir(&raw_dir)?;
    for name in ["ctl_1.raw", "ctl_2.raw", "trt_1.raw", "unrelated.raw"] {
        std::fs::write(raw_dir.join(name), "")?;
    }

    run_app(ArgsAction::Relink {
        manifest: stringify(&manifest),
        rawfile_dir: stringify(&raw_dir),
        skip_missing: false,
    })?;

    let after = std::fs::read_to_string(&manifest)?;
    let before_lines: Vec<&str> = before.lines().collect();
    let after_lines: Vec<&str> = after.lines().collect();
    assert_eq!(after_lines.len(), before_lines.len(), "Row count unchanged");

    let abs_raw = std::path::absolute(&raw_dir)?;
    for (old, new) in before_lines.iter().zip(&after_lines) {
        let (old_path, old_rest) = old.split_once('\t').unwrap();
        let (new_path, new_rest) = new.split_once('\t').unwrap();
        assert_eq!(old_rest, new_rest, "Only the path column changed");
        assert_eq!(PathBuf::from(new_path), abs_raw.join(old_path));
    }

    Ok(())
}

#[test]
fn test_manifest_missing_field_writes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let sdrf = dir.path().join("study.sdrf.tsv");
    std::fs::write(&sdrf, SDRF)?;
    let manifest = dir.path().join("study.fp-manifest");

    let mut action = manifest_action(&sdrf, &manifest);
    if let ArgsAction::Manifest {
        experiment_field, ..
    } = &mut action
    {
        *experiment_field = "factor value[dose]".to_owned();
    }

    let err = run_app(action).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<fragpipe_runner::manifest::Error>(),
        Some(fragpipe_runner::manifest::Error::MissingField { .. })
    ));
    assert!(!manifest.exists(), "No manifest was written");
    Ok(())
}

#[test]
fn test_check_command() -> Result<()> {
    let dir = tempdir()?;
    let check = || ArgsAction::Check {
        output: stringify(dir.path()),
    };
    assert!(run_app(check()).is_err(), "Empty dir has no results");

    std::fs::write(dir.path().join("combined_protein.tsv"), "")?;
    run_app(check())?;
    Ok(())
}

#[test]
fn test_clean_command() -> Result<()> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("a.raw"), "")?;
    std::fs::write(dir.path().join("a.mzBIN"), "")?;

    run_app(ArgsAction::Clean {
        rawfile_dir: stringify(dir.path()),
    })?;

    assert!(dir.path().join("a.raw").exists());
    assert!(!dir.path().join("a.mzBIN").exists());
    Ok(())
}

#[cfg(unix)]
mod runner {
    use super::*;
    use fragpipe_runner::exec::Error;
    use fragpipe_runner::{run_fragpipe, RunConfig};
    use std::os::unix::fs::PermissionsExt;
    use std::sync::{LazyLock, Mutex, MutexGuard};

    // writing an executable while another test forks can fail with ETXTBSY,
    // so only one test at a time creates and runs a fake FragPipe:
    static SPAWN_LOCK: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    fn lock() -> MutexGuard<'static, ()> {
        SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install a fake FragPipe under `root/fragpipe` that records its arguments in
    /// `<workdir>/args.txt`, prints a line to stdout, then runs `body`.
    fn fake_fragpipe(root: &Path, body: &str) -> Result<PathBuf> {
        let install = root.join("fragpipe");
        let bin = install.join("bin");
        std::fs::create_dir_all(&bin)?;
        let script = format!(
            "#!/bin/sh\n\
             args=\"$*\"\n\
             workdir=\"\"\n\
             while [ $# -gt 0 ]; do\n\
               if [ \"$1\" = \"--workdir\" ]; then workdir=\"$2\"; fi\n\
               shift\n\
             done\n\
             echo \"$args\" > \"$workdir/args.txt\"\n\
             echo \"FragPipe stdout line\"\n\
             {body}\n"
        );
        let exe = bin.join("fragpipe");
        std::fs::write(&exe, script)?;
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755))?;
        Ok(install)
    }

    /// Workflow and manifest inputs in `root`.
    fn inputs(root: &Path) -> Result<(PathBuf, PathBuf)> {
        let workflow = root.join("lfq.workflow");
        let manifest = root.join("lfq.fp-manifest");
        std::fs::write(&workflow, "workflow.input.data-type.im-ms=false\n")?;
        std::fs::write(&manifest, "a.raw\tA\t1\t1\tDDA\n")?;
        Ok((workflow, manifest))
    }

    fn config(root: &Path, body: &str) -> Result<RunConfig> {
        let install = fake_fragpipe(root, body)?;
        let (workflow, manifest) = inputs(root)?;
        Ok(RunConfig::new(
            install,
            workflow,
            manifest,
            root.join("results/run1"),
        ))
    }

    fn log_files(dir: &Path) -> Result<Vec<String>> {
        let mut logs = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.starts_with("log_") && name.ends_with(".txt") {
                logs.push(name);
            }
        }
        Ok(logs)
    }

    #[test]
    fn test_run_success_promotes_stdout_to_log() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let mut config = config(dir.path(), "echo done > \"$workdir/combined_protein.tsv\"")?;
        config.ram = 8;
        config.threads = Some(4);

        let outcome = run_fragpipe(&config)?;

        let output = dir.path().join("results/run1").canonicalize()?;
        assert_eq!(outcome.output_dir, output);
        assert!(output.join("combined_protein.tsv").exists());
        assert!(!output.join("fragpipe_stdout_redirect.log").exists());

        let args = std::fs::read_to_string(output.join("args.txt"))?;
        let workflow = dir.path().join("lfq.workflow").canonicalize()?;
        let manifest = dir.path().join("lfq.fp-manifest").canonicalize()?;
        assert_eq!(
            args.trim_end(),
            format!(
                "--headless --workflow {} --manifest {} --workdir {} --ram 8 --threads 4",
                workflow.display(),
                manifest.display(),
                output.display()
            )
        );

        let logs = log_files(&output)?;
        assert_eq!(logs.len(), 1, "Exactly one log file");
        assert_eq!(logs[0].len(), 27);
        assert_eq!(outcome.log_file, Some(output.join(&logs[0])));
        assert_eq!(
            std::fs::read_to_string(output.join(&logs[0]))?,
            "FragPipe stdout line\n"
        );
        assert!(fragpipe_runner::search_results_exist(&output));
        Ok(())
    }

    #[test]
    fn test_run_keeps_fragpipe_log() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let config = config(
            dir.path(),
            "echo real log > \"$workdir/log_2024-05-01_12-30-00.txt\"",
        )?;

        let outcome = run_fragpipe(&config)?;

        let output = outcome.output_dir;
        assert_eq!(log_files(&output)?, vec!["log_2024-05-01_12-30-00.txt"]);
        assert!(!output.join("fragpipe_stdout_redirect.log").exists());
        Ok(())
    }

    #[test]
    fn test_run_failure_reports_exit_code_and_stderr() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let config = config(dir.path(), "echo 'Out of memory' >&2\nexit 1")?;

        let err = run_fragpipe(&config).unwrap_err();

        match err.downcast_ref::<Error>() {
            Some(Error::ExternalTool { code, stderr, .. }) => {
                assert_eq!(*code, Some(1));
                assert_eq!(stderr, "Out of memory\n");
            }
            other => panic!("unexpected error {other:?}"),
        }
        // a log is left behind even on failure:
        let output = dir.path().join("results/run1");
        assert_eq!(log_files(&output)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_workflow_launches_nothing() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let marker = dir.path().join("launched");
        let mut config = config(dir.path(), &format!("touch {}", marker.display()))?;
        config.workflow_path = dir.path().join("missing.workflow");

        let err = run_fragpipe(&config).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::PathNotFound(p)) if p.ends_with("missing.workflow")
        ));
        assert!(!marker.exists(), "FragPipe was not launched");
        assert!(!dir.path().join("results").exists(), "Output dir not created");
        Ok(())
    }

    #[test]
    fn test_missing_manifest_launches_nothing() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let marker = dir.path().join("launched");
        let mut config = config(dir.path(), &format!("touch {}", marker.display()))?;
        config.manifest_path = dir.path().join("missing.fp-manifest");

        let err = run_fragpipe(&config).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::PathNotFound(p)) if p.ends_with("missing.fp-manifest")
        ));
        assert!(!marker.exists(), "FragPipe was not launched");
        assert!(!dir.path().join("results").exists(), "Output dir not created");
        Ok(())
    }

    #[test]
    fn test_killed_by_signal() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let config = config(dir.path(), "echo 'dying' >&2\nkill -9 $$")?;

        let err = run_fragpipe(&config).unwrap_err();

        match err.downcast_ref::<Error>() {
            Some(Error::ExternalTool { code, stderr, .. }) => {
                assert_eq!(*code, None);
                assert_eq!(stderr, "dying\n");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("terminated by a signal"));
        Ok(())
    }

    #[test]
    fn test_unstartable_fragpipe_leaves_no_results() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let config = config(dir.path(), "")?;
        let exe = config.fragpipe_dir.join("bin/fragpipe");
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o644))?;

        assert!(run_fragpipe(&config).is_err());

        let output = dir.path().join("results/run1");
        assert!(log_files(&output)?.is_empty(), "No log for a run that never started");
        assert!(!output.join("fragpipe_stdout_redirect.log").exists());
        assert!(!fragpipe_runner::search_results_exist(&output));
        Ok(())
    }

    #[test]
    fn test_dry_run_command_has_absolute_workdir() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let mut config = config(dir.path(), "")?;
        config.dry_run = true;

        let outcome = run_fragpipe(&config)?;

        let output = dir.path().join("results/run1");
        assert!(!output.exists(), "Output dir not created");
        assert!(outcome.output_dir.is_absolute());
        assert!(outcome
            .command
            .contains(&format!("--workdir {}", outcome.output_dir.display())));
        Ok(())
    }

    #[test]
    fn test_missing_executable() -> Result<()> {
        let dir = tempdir()?;
        let (workflow, manifest) = inputs(dir.path())?;
        let config = RunConfig::new(dir.path().join("nowhere"), workflow, manifest, dir.path());

        let err = run_fragpipe(&config).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::PathNotFound(p)) if p.ends_with("fragpipe")
        ));
        Ok(())
    }

    #[test]
    fn test_run_with_temp_dir() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let mut config = config(
            dir.path(),
            "mkdir -p \"$workdir/psm\"\necho psm > \"$workdir/psm/psm.tsv\"",
        )?;
        let temp_root = dir.path().join("scratch");
        config.temp_dir = Some(temp_root.clone());

        let output = dir.path().join("results/run1");
        std::fs::create_dir_all(output.join("psm"))?;
        std::fs::write(output.join("psm/psm.tsv"), "stale")?;

        run_fragpipe(&config)?;

        assert_eq!(std::fs::read_to_string(output.join("psm/psm.tsv"))?, "psm\n");
        let args = std::fs::read_to_string(output.join("args.txt"))?;
        assert!(
            !args.contains(&format!("--workdir {}", output.canonicalize()?.display())),
            "FragPipe wrote to the staging dir"
        );
        assert!(!temp_root.exists(), "Temp root we created was removed");
        Ok(())
    }

    #[test]
    fn test_dry_run() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        let marker = dir.path().join("launched");
        let install = fake_fragpipe(dir.path(), &format!("touch {}", marker.display()))?;
        let (workflow, manifest) = inputs(dir.path())?;
        let output = dir.path().join("out");

        run_app(ArgsAction::Run {
            fragpipe_dir: stringify(&install),
            workflow: stringify(&workflow),
            manifest: stringify(&manifest),
            output: stringify(&output),
            ram: 0,
            threads: None,
            temp_dir: None,
            cli_config: None,
            dry_run: true,
        })?;

        assert!(!marker.exists(), "FragPipe was not launched");
        assert!(!output.exists(), "Output dir not created");
        Ok(())
    }

    #[test]
    fn test_run_command_with_cli_config() -> Result<()> {
        let _lock = lock();
        let dir = tempdir()?;
        // the fake tool only understands --workdir, so keep it and rename the rest:
        let cli_config = dir.path().join("fragpipe-cli.toml");
        std::fs::write(&cli_config, "[fragpipe]\nheadless = \"--no-gui\"\nram = \"--memory\"\n")?;
        let install = fake_fragpipe(dir.path(), "")?;
        let (workflow, manifest) = inputs(dir.path())?;
        let output = dir.path().join("out");

        run_app(ArgsAction::Run {
            fragpipe_dir: stringify(&install),
            workflow: stringify(&workflow),
            manifest: stringify(&manifest),
            output: stringify(&output),
            ram: 4,
            threads: None,
            temp_dir: None,
            cli_config: Some(stringify(&cli_config)),
            dry_run: false,
        })?;

        let args = std::fs::read_to_string(output.join("args.txt"))?;
        assert!(args.starts_with("--no-gui --workflow "));
        assert!(args.trim_end().ends_with("--memory 4"));
        Ok(())
    }
}
