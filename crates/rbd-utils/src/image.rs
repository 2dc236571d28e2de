use serde::Deserialize;

/// One entry of `rbd ls -l`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RbdImage {
  #[serde(rename = "image")]
  pub name: String,
  pub size: u64,
  pub format: u32,
  /// Not part of the tool output, filled in from the pool that was listed.
  #[serde(skip)]
  pub pool: String,
}

/// Low level details about an image, as reported by `rbd info`.
///
/// Fields that a particular tool version does not report are left at their
/// zero value; format 1 images, for example, carry no feature list.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RbdImageInfo {
  pub name: String,
  pub size: u64,
  pub objects: u64,
  pub order: u32,
  pub object_size: u64,
  pub block_name_prefix: String,
  pub format: u32,
  pub features: Vec<String>,
  #[serde(skip)]
  pub pool: String,
}

/// A kernel mapping of an image on the local host.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MappedDevice {
  pub device: String,
  pub pool: String,
  /// Image name.
  pub name: String,
  #[serde(default, deserialize_with = "snapshot_name")]
  pub snap: Option<String>,
}

impl MappedDevice {
  pub fn volume_id(&self) -> String {
    crate::volume_id(&self.pool, &self.name)
  }
}

// The tool prints "-" for a mapping of the image head rather than a snapshot.
fn snapshot_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let snap = Option::<String>::deserialize(deserializer)?;
  Ok(snap.filter(|s| !s.is_empty() && s != "-"))
}
