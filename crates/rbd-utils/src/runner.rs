use crate::{Arg, Args, RbdError, ToolPaths};
use std::{fmt, io, path::Path, sync::Arc};
use tracing::{debug, error};

/// The two cluster management executables this crate drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
  Rbd,
  Rados,
}

impl Tool {
  pub const fn name(self) -> &'static str {
    match self {
      Tool::Rbd => "rbd",
      Tool::Rados => "rados",
    }
  }
}

impl fmt::Display for Tool {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Everything captured from a finished child process. `status` is `None`
/// when the process was terminated by a signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  pub status: Option<i32>,
  pub stdout: Vec<u8>,
  pub stderr: Vec<u8>,
}

impl CommandOutput {
  pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
    CommandOutput {
      status: Some(0),
      stdout: stdout.into(),
      stderr: Vec::new(),
    }
  }

  pub fn exited(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
    CommandOutput {
      status: Some(code),
      stdout: Vec::new(),
      stderr: stderr.into(),
    }
  }
}

/// Runs a program to completion and captures its output. Implementations
/// must not interpret the arguments through a shell.
pub trait CommandRunner: Send + Sync {
  fn run(&self, program: &Path, args: &[Arg]) -> io::Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
  #[inline]
  fn run(&self, program: &Path, args: &[Arg]) -> io::Result<CommandOutput> {
    (**self).run(program, args)
  }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
  #[inline]
  fn run(&self, program: &Path, args: &[Arg]) -> io::Result<CommandOutput> {
    (**self).run(program, args)
  }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
  #[inline]
  fn run(&self, program: &Path, args: &[Arg]) -> io::Result<CommandOutput> {
    (**self).run(program, args)
  }
}

/// A single tool call: which tool, with what arguments, and which exit
/// status (if any) the tool uses to say "no such entity".
#[derive(Debug, Clone)]
pub struct Invocation {
  tool: Tool,
  args: Args,
  absent_status: Option<i32>,
}

impl Invocation {
  pub fn new(tool: Tool, args: Args) -> Self {
    Invocation {
      tool,
      args,
      absent_status: None,
    }
  }

  /// Treat exit status `code` as [`Outcome::NotFound`] rather than a failure.
  pub fn absent_on(mut self, code: i32) -> Self {
    self.absent_status = Some(code);
    self
  }

  #[inline]
  pub fn tool(&self) -> Tool {
    self.tool
  }

  #[inline]
  pub fn args(&self) -> &Args {
    &self.args
  }
}

#[derive(Debug)]
pub enum Failure {
  Exited { code: Option<i32>, stderr: String },
  Spawn(io::Error),
}

impl Failure {
  pub fn into_error(self, context: &'static str) -> RbdError {
    match self {
      Failure::Exited { code, stderr } => {
        error!(stderr = %stderr, code = ?code, "{}", context);
        RbdError::Execution {
          context,
          code,
          stderr,
        }
      }
      Failure::Spawn(source) => {
        error!(error = %source, "{}", context);
        RbdError::Spawn { context, source }
      }
    }
  }
}

#[derive(Debug)]
pub enum Outcome {
  Success(Vec<u8>),
  NotFound,
  Failure(Failure),
}

impl Outcome {
  /// Standard output of a successful run. An absent entity is reported as
  /// [`RbdError::NotFound`].
  pub fn into_stdout(self, context: &'static str) -> crate::Result<Vec<u8>> {
    match self {
      Outcome::Success(stdout) => Ok(stdout),
      Outcome::NotFound => Err(RbdError::NotFound { context }),
      Outcome::Failure(failure) => Err(failure.into_error(context)),
    }
  }

  /// Like [`Outcome::into_stdout`], but an absent entity is `Ok(None)`.
  pub fn into_found(self, context: &'static str) -> crate::Result<Option<Vec<u8>>> {
    match self {
      Outcome::NotFound => Ok(None),
      outcome => outcome.into_stdout(context).map(Some),
    }
  }
}

pub fn invoke<R>(runner: &R, paths: &ToolPaths, invocation: &Invocation) -> Outcome
where
  R: CommandRunner + ?Sized,
{
  let program = paths.path(invocation.tool);
  debug!(
    tool = %invocation.tool,
    cmd = %program.display(),
    args = ?invocation.args,
    "running command"
  );

  match runner.run(program, &invocation.args) {
    Ok(output) => classify(output, invocation.absent_status),
    Err(e) => Outcome::Failure(Failure::Spawn(e)),
  }
}

fn classify(output: CommandOutput, absent_status: Option<i32>) -> Outcome {
  match output.status {
    Some(0) => Outcome::Success(output.stdout),
    Some(code) if absent_status == Some(code) => Outcome::NotFound,
    code => Outcome::Failure(Failure::Exited {
      code,
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }),
  }
}
