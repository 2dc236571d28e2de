use crate::{MappedDevice, RbdError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::from_utf8;

/// Split the plain text output of `rados lspools` into pool names. Blank
/// and whitespace only lines are skipped.
pub fn parse_pools(out: &[u8]) -> Result<Vec<String>> {
  let text = decode_text("Unable to parse rados lspools", out)?;

  Ok(
    text
      .lines()
      .filter(|line| !line.trim().is_empty())
      .map(str::to_owned)
      .collect(),
  )
}

/// Plain text tool output. Names must come back byte for byte, so invalid
/// UTF-8 is an error rather than replaced.
pub fn decode_text<'a>(context: &'static str, out: &'a [u8]) -> Result<&'a str> {
  from_utf8(out).map_err(|source| RbdError::Utf8 { context, source })
}

pub fn decode_json<T: DeserializeOwned>(context: &'static str, out: &[u8]) -> Result<T> {
  serde_json::from_slice(out).map_err(|source| RbdError::Decode { context, source })
}

/// Decode `rbd showmapped --format json`.
///
/// Older tools print an object keyed by mapping id, newer ones print an
/// array. Keys are discarded either way and document order is kept.
pub fn decode_mapping_table(out: &[u8]) -> Result<Vec<MappedDevice>> {
  const CONTEXT: &str = "Unable to parse rbd showmapped";

  let entries = match decode_json::<Value>(CONTEXT, out)? {
    Value::Object(keyed) => keyed.into_iter().map(|(_, v)| v).collect::<Vec<_>>(),
    Value::Array(listed) => listed,
    _ => return Err(RbdError::MappingTable),
  };

  entries
    .into_iter()
    .map(|entry| {
      serde_json::from_value(entry).map_err(|source| RbdError::Decode {
        context: CONTEXT,
        source,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{RbdImage, RbdImageInfo};
  use test_case::test_case;

  #[test_case("a\nb\n\nc\n", &["a", "b", "c"] ; "blank lines skipped")]
  #[test_case("", &[] ; "no pools")]
  #[test_case("rbd\r\n.mgr\r\n", &["rbd", ".mgr"] ; "crlf")]
  #[test_case("last", &["last"] ; "no trailing newline")]
  #[test_case("a\n  \nb\n\t\n", &["a", "b"] ; "whitespace lines skipped")]
  fn pools(out: &str, expected: &[&str]) {
    assert_eq!(parse_pools(out.as_bytes()).unwrap(), expected);
  }

  #[test_case(b"ok\n\xff\xfebad\n" ; "invalid bytes in a name")]
  #[test_case(b"\xc3\n" ; "truncated sequence")]
  fn pools_invalid_utf8(out: &[u8]) {
    let err = parse_pools(out).unwrap_err();

    assert!(err.is_decode_failure());
    assert!(err.to_string().starts_with("Unable to parse rados lspools: "));
  }

  #[test]
  fn image_list() {
    let out = br#"[
      {"image": "vol1", "id": "1a2b3c", "size": 1073741824, "format": 2},
      {"image": "vol2", "size": 8589934592, "format": 1, "lock_type": "exclusive"}
    ]"#;

    let images: Vec<RbdImage> = decode_json("Unable to parse rbd ls", out).unwrap();

    assert_eq!(images.len(), 2);
    assert_eq!(images[0].name, "vol1");
    assert_eq!(images[0].size, 1 << 30);
    assert_eq!(images[1].format, 1);
    assert_eq!(images[1].pool, "");
  }

  #[test]
  fn image_info() {
    let out = br#"{
      "name": "vol1",
      "id": "5e3f1b2a9c",
      "size": 10737418240,
      "objects": 2560,
      "order": 22,
      "object_size": 4194304,
      "snapshot_count": 0,
      "block_name_prefix": "rbd_data.5e3f1b2a9c",
      "format": 2,
      "features": ["layering", "exclusive-lock"],
      "op_features": [],
      "flags": []
    }"#;

    let info: RbdImageInfo = decode_json("Unable to parse rbd info", out).unwrap();

    assert_eq!(info.objects, 2560);
    assert_eq!(info.order, 22);
    assert_eq!(info.object_size, 4 << 20);
    assert_eq!(info.block_name_prefix, "rbd_data.5e3f1b2a9c");
    assert_eq!(info.features, vec!["layering", "exclusive-lock"]);
  }

  #[test]
  fn format_one_image_has_no_features() {
    let out = br#"{"name": "old", "size": 1024, "objects": 1, "order": 22,
      "object_size": 4194304, "block_name_prefix": "rb.0.1", "format": 1}"#;

    let info: RbdImageInfo = decode_json("Unable to parse rbd info", out).unwrap();

    assert_eq!(info.format, 1);
    assert!(info.features.is_empty());
  }

  #[test]
  fn malformed_json_is_a_decode_failure() {
    let err = decode_json::<Vec<RbdImage>>("Unable to parse rbd ls", b"rbd: listing images failed")
      .unwrap_err();

    assert!(err.is_decode_failure());
    assert!(err.to_string().starts_with("Unable to parse rbd ls: "));
  }

  #[test]
  fn keyed_mapping_table() {
    let out = br#"{
      "0": {"pool": "rbd", "name": "vol1", "snap": "-", "device": "/dev/rbd0"},
      "1": {"pool": "kube", "name": "vol2", "snap": "daily", "device": "/dev/rbd1"}
    }"#;

    let entries = decode_mapping_table(out).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].device, "/dev/rbd0");
    assert_eq!(entries[0].snap, None);
    assert_eq!(entries[1].pool, "kube");
    assert_eq!(entries[1].snap.as_deref(), Some("daily"));
  }

  #[test]
  fn listed_mapping_table() {
    let out = br#"[
      {"id": "0", "pool": "rbd", "namespace": "", "name": "vol1", "snap": "-", "device": "/dev/rbd0"}
    ]"#;

    let entries = decode_mapping_table(out).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].volume_id(), "rbd.vol1");
  }

  #[test]
  fn empty_mapping_table() {
    assert!(decode_mapping_table(b"{}").unwrap().is_empty());
    assert!(decode_mapping_table(b"[]").unwrap().is_empty());
  }

  #[test_case(b"\"nope\"" ; "string")]
  #[test_case(b"null" ; "null")]
  #[test_case(b"{\"0\": \"/dev/rbd0\"}" ; "entry of wrong type")]
  #[test_case(b"{\"0\": {\"pool\": \"rbd\"}}" ; "entry missing fields")]
  fn bad_mapping_table(out: &[u8]) {
    assert!(decode_mapping_table(out).unwrap_err().is_decode_failure());
  }
}
