cfg_if::cfg_if! {
  if #[cfg(unix)] {
    mod unix;
    pub use unix::OsRunner;
  } else {
    compile_error!("Only cfg(unix) is supported at this time")
  }
}

mod arguments;
mod client;
mod config;
mod decode;
mod fake;
mod image;
mod monitor;
mod runner;
mod status;
mod volume;

pub use arguments::{Arg, Args};
pub use client::RbdClient;
pub use config::ToolPaths;
pub use decode::{decode_json, decode_mapping_table, decode_text, parse_pools};
pub use fake::{FakeCall, FakeRunner};
pub use image::{MappedDevice, RbdImage, RbdImageInfo};
pub use monitor::{parse_monitor_addresses, parse_monitor_addresses_with, Resolver, SystemResolver};
pub use runner::{invoke, CommandOutput, CommandRunner, Failure, Invocation, Outcome, Tool};
pub use status::{has_watchers, StatusDocument};
pub use volume::{invert, volume_id};

use static_assertions::assert_impl_all;
use std::{io, result, str::Utf8Error};
use thiserror::Error;

pub type Result<T> = result::Result<T, RbdError>;

#[derive(Debug, Error)]
pub enum RbdError {
  /// The tool ran and exited unsuccessfully. `stderr` is the captured error
  /// stream, untouched.
  #[error("{context}: {stderr}")]
  Execution {
    context: &'static str,
    code: Option<i32>,
    stderr: String,
  },

  /// The tool could not be started at all.
  #[error("{context}: {source}")]
  Spawn {
    context: &'static str,
    #[source]
    source: io::Error,
  },

  /// The tool reported the entity as absent on an operation that requires it.
  #[error("{context}: entity not found")]
  NotFound { context: &'static str },

  #[error("{context}: {source}")]
  Decode {
    context: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("{context}: {source}")]
  Utf8 {
    context: &'static str,
    #[source]
    source: Utf8Error,
  },

  #[error("Unable to parse rbd showmapped: expected an object or an array")]
  MappingTable,

  #[error("Unable to parse RBD status watchers")]
  Watchers,

  #[error("Invalid monitor address {address}: {reason}")]
  InvalidAddress {
    address: String,
    reason: &'static str,
  },

  #[error("Unable to resolve monitor host {host}: {source}")]
  Resolution {
    host: String,
    #[source]
    source: io::Error,
  },

  #[error("Unable to locate {tool} executable: {source}")]
  ToolNotFound {
    tool: Tool,
    #[source]
    source: which::Error,
  },
}

impl RbdError {
  pub fn is_execution_failure(&self) -> bool {
    matches!(
      self,
      RbdError::Execution { .. } | RbdError::Spawn { .. } | RbdError::NotFound { .. }
    )
  }

  pub fn is_decode_failure(&self) -> bool {
    matches!(
      self,
      RbdError::Decode { .. }
        | RbdError::Utf8 { .. }
        | RbdError::MappingTable
        | RbdError::Watchers
    )
  }

  pub fn is_resolution_failure(&self) -> bool {
    matches!(
      self,
      RbdError::InvalidAddress { .. } | RbdError::Resolution { .. }
    )
  }

  /// Captured error stream of a failed command, if any.
  pub fn stderr(&self) -> Option<&str> {
    match self {
      RbdError::Execution { stderr, .. } => Some(stderr),
      _ => None,
    }
  }
}

assert_impl_all!(OsRunner: CommandRunner, Send, Sync);
assert_impl_all!(FakeRunner: CommandRunner, Send, Sync);
assert_impl_all!(SystemResolver: Resolver, Send, Sync);
assert_impl_all!(RbdClient<OsRunner>: Send, Sync);
