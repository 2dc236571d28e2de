use smallvec::SmallVec;
use std::{ffi::OsString, fmt, ops::Deref, sync::Arc};

const FORMAT_OPT: &str = "--format";
const JSON_ARG: &str = "json";

#[derive(Clone)]
enum Repr {
  Static(&'static str),
  Shared(Arc<str>),
}

/// A single command line argument. Static flags are borrowed, caller
/// supplied values (pools, images, devices) are shared.
#[derive(Clone)]
pub struct Arg(Repr);

impl Arg {
  pub fn owned(value: &str) -> Self {
    Arg(Repr::Shared(value.into()))
  }

  #[inline]
  pub fn as_str(&self) -> &str {
    match &self.0 {
      Repr::Static(s) => s,
      Repr::Shared(s) => s,
    }
  }
}

impl fmt::Debug for Arg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    <str as fmt::Debug>::fmt(self.as_str(), f)
  }
}

impl fmt::Display for Arg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    <str as fmt::Display>::fmt(self.as_str(), f)
  }
}

impl From<&'static str> for Arg {
  fn from(value: &'static str) -> Self {
    Arg(Repr::Static(value))
  }
}

impl From<String> for Arg {
  fn from(value: String) -> Self {
    Arg(Repr::Shared(value.into()))
  }
}

impl From<&String> for Arg {
  fn from(value: &String) -> Self {
    Arg::owned(value)
  }
}

impl From<Arg> for OsString {
  fn from(value: Arg) -> Self {
    OsString::from(value.as_str())
  }
}

impl Eq for Arg {}

impl PartialEq for Arg {
  #[inline]
  fn eq(&self, other: &Arg) -> bool {
    self.as_str() == other.as_str()
  }
}

impl<'a> PartialEq<&'a str> for Arg {
  #[inline]
  fn eq(&self, other: &&'a str) -> bool {
    self.as_str() == *other
  }
}

/// The argument vector handed to one of the cluster tools. Arguments are
/// passed to the child process verbatim, there is no shell in between.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Args(SmallVec<[Arg; 8]>);

impl Args {
  pub fn new() -> Self {
    Args(SmallVec::new())
  }

  pub fn push(&mut self, arg: impl Into<Arg>) {
    self.0.push(arg.into());
  }

  /// Append a single argument.
  pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
    self.push(arg);
    self
  }

  /// Append a flag followed by its value.
  pub fn opt(self, name: &'static str, value: impl Into<Arg>) -> Self {
    self.arg(name).arg(value)
  }

  /// Ask the tool for machine readable output (`--format json`).
  pub fn json(self) -> Self {
    self.opt(FORMAT_OPT, JSON_ARG)
  }

  #[inline]
  pub fn as_slice(&self) -> &[Arg] {
    &self.0
  }
}

impl fmt::Debug for Args {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.0.iter()).finish()
  }
}

impl Deref for Args {
  type Target = [Arg];

  #[inline]
  fn deref(&self) -> &Self::Target {
    &self.0
  }
}
