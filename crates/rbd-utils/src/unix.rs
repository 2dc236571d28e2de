use crate::{runner::CommandRunner, Arg, CommandOutput};
use duct::cmd;
use std::{io, os::unix::process::ExitStatusExt, path::Path};
use tracing::warn;

/// Runs the cluster tools as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRunner;

impl CommandRunner for OsRunner {
  fn run(&self, program: &Path, args: &[Arg]) -> io::Result<CommandOutput> {
    // duct treats a relative `Path` as relative to the working directory,
    // a bare command name must go through as an OsStr to get a PATH lookup.
    let output = cmd(program.as_os_str(), args.iter().cloned())
      .stdout_capture()
      .stderr_capture()
      .unchecked()
      .run()?;

    if let Some(signal) = output.status.signal() {
      warn!(
        "{} was terminated by signal {}",
        program.display(),
        signal
      );
    }

    Ok(CommandOutput {
      status: output.status.code(),
      stdout: output.stdout,
      stderr: output.stderr,
    })
  }
}
