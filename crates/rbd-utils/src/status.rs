use crate::{RbdError, Result};
use serde_json::{Map, Value};

/// Decoded output of `rbd status`. Only `watchers` is interpreted.
pub type StatusDocument = Map<String, Value>;

const WATCHERS_KEY: &str = "watchers";

// The watchers field changed shape between cluster releases without any
// version marker. Originally it was a map:
//
//   {"watchers": {"watcher": ...}}
//
// later releases emit an array:
//
//   {"watchers": [{...}, {...}]}
enum Watchers<'a> {
  Keyed(&'a Map<String, Value>),
  Listed(&'a [Value]),
}

impl<'a> Watchers<'a> {
  fn from_status(status: &'a StatusDocument) -> Result<Self> {
    match status.get(WATCHERS_KEY) {
      Some(Value::Object(keyed)) => Ok(Watchers::Keyed(keyed)),
      Some(Value::Array(listed)) => Ok(Watchers::Listed(listed)),
      _ => Err(RbdError::Watchers),
    }
  }

  fn is_empty(&self) -> bool {
    match self {
      Watchers::Keyed(keyed) => keyed.is_empty(),
      Watchers::Listed(listed) => listed.is_empty(),
    }
  }
}

/// Whether any client currently holds the image open.
pub fn has_watchers(status: &StatusDocument) -> Result<bool> {
  Watchers::from_status(status).map(|w| !w.is_empty())
}
