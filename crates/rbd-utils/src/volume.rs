use crate::MappedDevice;
use std::collections::BTreeMap;

/// Cluster wide volume identifier, `<pool>.<image>`.
///
/// No escaping is performed, so names containing `.` can collide.
pub fn volume_id(pool: &str, image: &str) -> String {
  format!("{}.{}", pool, image)
}

/// Re-key a mapping table by volume id. Entries that produce the same id
/// overwrite each other, the last one wins.
pub fn invert<I>(entries: I) -> BTreeMap<String, String>
where
  I: IntoIterator<Item = MappedDevice>,
{
  entries
    .into_iter()
    .map(|entry| (entry.volume_id(), entry.device))
    .collect()
}
