use crate::{runner::CommandRunner, Arg, CommandOutput};
use std::{
  collections::VecDeque,
  io,
  path::{Path, PathBuf},
  sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::info;

/// One recorded call to a [`FakeRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCall {
  pub program: PathBuf,
  pub args: Vec<String>,
}

struct FakeRunnerInner {
  log: Vec<FakeCall>,
  responses: VecDeque<io::Result<CommandOutput>>,
}

/// Runner that never spawns anything. Responses are replayed in the order
/// they were queued; once the queue is drained every call succeeds with
/// empty output.
pub struct FakeRunner(Mutex<FakeRunnerInner>);

impl Default for FakeRunner {
  fn default() -> Self {
    Self::new()
  }
}

impl FakeRunner {
  pub fn new() -> Self {
    let inner = FakeRunnerInner {
      log: Vec::new(),
      responses: VecDeque::new(),
    };

    Self(Mutex::new(inner))
  }

  fn inner(&self) -> MutexGuard<'_, FakeRunnerInner> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn push_output(&self, output: CommandOutput) {
    self.inner().responses.push_back(Ok(output));
  }

  pub fn push_error(&self, error: io::Error) {
    self.inner().responses.push_back(Err(error));
  }

  pub fn succeed_with(&self, stdout: impl Into<Vec<u8>>) {
    self.push_output(CommandOutput::success(stdout));
  }

  pub fn fail_with(&self, code: i32, stderr: impl Into<Vec<u8>>) {
    self.push_output(CommandOutput::exited(code, stderr));
  }

  pub fn reset_log(&self) {
    self.inner().log.clear();
  }

  pub fn get_log(&self) -> Vec<FakeCall> {
    self.inner().log.clone()
  }
}

impl CommandRunner for FakeRunner {
  fn run(&self, program: &Path, args: &[Arg]) -> io::Result<CommandOutput> {
    let mut inner = self.inner();
    let call = FakeCall {
      program: program.to_owned(),
      args: args.iter().map(|a| a.to_string()).collect(),
    };
    info!(
      "Fake runner: {} {}",
      call.program.display(),
      call.args.join(" ")
    );
    inner.log.push(call);

    inner
      .responses
      .pop_front()
      .unwrap_or_else(|| Ok(CommandOutput::success(Vec::new())))
  }
}
