use crate::{RbdError, Result, Tool};
use std::path::{Path, PathBuf};
use tracing::debug;
use which::which;

const DEFAULT_RBD_COMMAND: &str = "rbd";
const DEFAULT_RADOS_COMMAND: &str = "rados";

/// Location of the two cluster tools. The defaults are bare command names,
/// left for the OS to look up on `PATH` when the command is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
  rbd: PathBuf,
  rados: PathBuf,
}

impl Default for ToolPaths {
  fn default() -> Self {
    ToolPaths {
      rbd: DEFAULT_RBD_COMMAND.into(),
      rados: DEFAULT_RADOS_COMMAND.into(),
    }
  }
}

impl ToolPaths {
  /// Resolve both tools to absolute paths up front, so a missing install is
  /// reported at startup instead of on the first volume operation.
  pub fn detect() -> Result<Self> {
    let rbd = locate(Tool::Rbd)?;
    let rados = locate(Tool::Rados)?;

    Ok(ToolPaths { rbd, rados })
  }

  pub fn with_rbd(mut self, path: impl Into<PathBuf>) -> Self {
    self.rbd = path.into();
    self
  }

  pub fn with_rados(mut self, path: impl Into<PathBuf>) -> Self {
    self.rados = path.into();
    self
  }

  #[inline]
  pub fn path(&self, tool: Tool) -> &Path {
    match tool {
      Tool::Rbd => &self.rbd,
      Tool::Rados => &self.rados,
    }
  }
}

fn locate(tool: Tool) -> Result<PathBuf> {
  let path = which(tool.name()).map_err(|source| RbdError::ToolNotFound { tool, source })?;
  debug!("Detected {} at {}", tool, path.display());
  Ok(path)
}
