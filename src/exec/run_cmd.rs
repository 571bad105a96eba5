use std::fs::File;
use std::io::{self, stderr, stdout, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{Context, Result};

use super::Error;

/// What's left of a child process once it has exited.
#[derive(Debug)]
pub struct CmdOutput {
    pub status: ExitStatus,
    pub stderr: String,
}

/// Run a subprocess to completion, writing its stdout to `stdout_log` and capturing
/// its stderr. If `echo` is set, both streams are also copied to our own stdout/stderr.
/// Based on:
/// <https://stackoverflow.com/questions/66060139/how-to-tee-stdout-stderr-from-a-subprocess-in-rust>
pub fn run_cmd(cmd: &mut Command, stdout_log: File, echo: bool) -> Result<CmdOutput> {
    log::debug!("Running command {:?}", cmd);
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| {
            format!(
                "failed to execute child process {:?} {:?}",
                cmd.get_program(),
                cmd.get_args().collect::<Vec<_>>(),
            )
        })?;

    let child_out = child.stdout.take().ok_or(Error::StreamNotCaptured("stdout"))?;
    let child_err = child.stderr.take().ok_or(Error::StreamNotCaptured("stderr"))?;

    let thread_out = thread::spawn(move || communicate(child_out, stdout_log, echo.then(stdout)));
    let thread_err =
        thread::spawn(move || communicate(child_err, Vec::new(), echo.then(stderr)));

    let out = thread_out.join();
    let err = thread_err.join();
    let status = child.wait().context("failed to wait on child process")?;

    out.map_err(|_| Error::StreamThreadPanicked("stdout"))?
        .context("while writing child stdout to log file")?;
    let err_bytes = err
        .map_err(|_| Error::StreamThreadPanicked("stderr"))?
        .context("while reading child stderr")?;

    log::debug!("Process finished with {status}");
    Ok(CmdOutput {
        status,
        stderr: String::from_utf8_lossy(&err_bytes).into_owned(),
    })
}

/// Copy everything from `stream` into `sink` (and `echo`, if given); return the sink.
fn communicate<R: Read, W: Write, E: Write>(
    mut stream: R,
    mut sink: W,
    mut echo: Option<E>,
) -> io::Result<W> {
    let mut buf = [0u8; 1024];
    loop {
        let num_read = stream.read(&mut buf)?;
        if num_read == 0 {
            break;
        }

        let buf = &buf[..num_read];
        sink.write_all(buf)?;
        if let Some(echo) = echo.as_mut() {
            echo.write_all(buf)?;
        }
    }
    sink.flush()?;

    Ok(sink)
}
