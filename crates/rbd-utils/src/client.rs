use crate::{
  decode::{decode_json, decode_mapping_table, decode_text, parse_pools},
  invoke,
  status::{has_watchers, StatusDocument},
  volume::invert,
  Arg, Args, CommandRunner, Invocation, MappedDevice, OsRunner, RbdImage, RbdImageInfo, Result,
  Tool, ToolPaths,
};
use std::collections::BTreeMap;

const POOL_OPT: &str = "--pool";

// `rbd info` exits with this status when the image does not exist.
const IMAGE_ABSENT_STATUS: i32 = 2;

/// Volume operations against the cluster, one tool invocation each.
///
/// Every call blocks until the child process exits. Nothing is retried,
/// cached or locked; serialising operations on the same image is up to the
/// caller.
#[derive(Debug, Clone)]
pub struct RbdClient<R = OsRunner> {
  paths: ToolPaths,
  runner: R,
}

impl RbdClient<OsRunner> {
  pub fn new(paths: ToolPaths) -> Self {
    Self::with_runner(paths, OsRunner)
  }
}

impl Default for RbdClient<OsRunner> {
  fn default() -> Self {
    Self::new(ToolPaths::default())
  }
}

impl<R: CommandRunner> RbdClient<R> {
  pub fn with_runner(paths: ToolPaths, runner: R) -> Self {
    RbdClient { paths, runner }
  }

  #[inline]
  pub fn paths(&self) -> &ToolPaths {
    &self.paths
  }

  #[inline]
  pub fn runner(&self) -> &R {
    &self.runner
  }

  fn run(&self, tool: Tool, args: Args, context: &'static str) -> Result<Vec<u8>> {
    invoke(&self.runner, &self.paths, &Invocation::new(tool, args)).into_stdout(context)
  }

  /// Names of all pools on the cluster.
  pub fn list_pools(&self) -> Result<Vec<String>> {
    let out = self.run(Tool::Rados, Args::new().arg("lspools"), "Unable to get pools")?;
    parse_pools(&out)
  }

  pub fn list_images(&self, pool: &str) -> Result<Vec<RbdImage>> {
    let args = Args::new()
      .arg("ls")
      .opt("-p", Arg::owned(pool))
      .arg("-l")
      .json();
    let out = self.run(Tool::Rbd, args, "Unable to get rbd images")?;

    let mut images: Vec<RbdImage> = decode_json("Unable to parse rbd ls", &out)?;
    for image in &mut images {
      image.pool = pool.to_owned();
    }

    Ok(images)
  }

  /// Details about a single image, `None` if it does not exist.
  pub fn image_info(&self, pool: &str, image: &str) -> Result<Option<RbdImageInfo>> {
    let args = Args::new()
      .arg("info")
      .opt("-p", Arg::owned(pool))
      .arg(Arg::owned(image))
      .json();
    let invocation = Invocation::new(Tool::Rbd, args).absent_on(IMAGE_ABSENT_STATUS);

    let outcome = invoke(&self.runner, &self.paths, &invocation);
    let out = match outcome.into_found("Unable to get rbd info")? {
      Some(out) => out,
      None => return Ok(None),
    };

    let mut info: RbdImageInfo = decode_json("Unable to parse rbd info", &out)?;
    info.pool = pool.to_owned();

    Ok(Some(info))
  }

  /// Images currently mapped on the local host, as reported by the tool.
  pub fn mapped_entries(&self) -> Result<Vec<MappedDevice>> {
    let out = self.run(
      Tool::Rbd,
      Args::new().arg("showmapped").json(),
      "Unable to get RBD map",
    )?;
    decode_mapping_table(&out)
  }

  /// Local device path of every mapped image, keyed by volume id.
  pub fn mapped_devices(&self) -> Result<BTreeMap<String, String>> {
    self.mapped_entries().map(invert)
  }

  pub fn create<I>(
    &self,
    pool: &str,
    image: &str,
    size_gb: u64,
    object_size: &str,
    features: I,
  ) -> Result<()>
  where
    I: IntoIterator,
    I::Item: AsRef<str>,
  {
    let mut args = Args::new()
      .arg("create")
      .opt(POOL_OPT, Arg::owned(pool))
      .opt("--object-size", Arg::owned(object_size))
      .opt("--size", format!("{}G", size_gb));

    for feature in features {
      args.push("--image-feature");
      args.push(Arg::owned(feature.as_ref()));
    }
    args.push(Arg::owned(image));

    self.run(Tool::Rbd, args, "Unable to create RBD").map(drop)
  }

  pub fn remove(&self, pool: &str, image: &str) -> Result<()> {
    let args = Args::new()
      .arg("rm")
      .opt(POOL_OPT, Arg::owned(pool))
      .arg("--no-progress")
      .arg(Arg::owned(image));

    self.run(Tool::Rbd, args, "Error deleting RBD").map(drop)
  }

  /// Map the image on the local host and return the new device path.
  pub fn map(&self, pool: &str, image: &str) -> Result<String> {
    let args = Args::new()
      .arg("map")
      .opt(POOL_OPT, Arg::owned(pool))
      .arg(Arg::owned(image));

    let out = self.run(Tool::Rbd, args, "Unable to map RBD")?;
    Ok(decode_text("Unable to map RBD", &out)?.trim().to_owned())
  }

  pub fn unmap(&self, device: &str) -> Result<()> {
    let args = Args::new().arg("unmap").arg(Arg::owned(device));

    self.run(Tool::Rbd, args, "Unable to unmap RBD").map(drop)
  }

  pub fn status(&self, pool: &str, image: &str) -> Result<StatusDocument> {
    let args = Args::new()
      .arg("status")
      .opt(POOL_OPT, Arg::owned(pool))
      .arg(Arg::owned(image))
      .json();

    let out = self.run(Tool::Rbd, args, "Unable to get RBD status")?;
    decode_json("Unable to parse rbd status", &out)
  }

  pub fn has_watchers(&self, pool: &str, image: &str) -> Result<bool> {
    has_watchers(&self.status(pool, image)?)
  }
}
