use crate::{RbdError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
  io,
  net::{IpAddr, ToSocketAddrs},
};
use tracing::debug;

const BRACKETS: &[char] = &['[', ']'];

static IPV6_WITH_PORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[.*\]:\d+$").unwrap());

/// Host name resolution used for monitor addresses that are not IP literals.
pub trait Resolver {
  fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolves through the system resolver (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
  fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
    Ok((host, 0).to_socket_addrs()?.map(|addr| addr.ip()).collect())
  }
}

/// Parse monitor addresses into IP addresses, resolving host names.
///
/// Accepted forms are `IPv4`, `IPv4:port`, `[IPv6]`, `[IPv6]:port`, `host` and
/// `host:port`. Ports are dropped. A bare IPv6 literal cannot be told apart
/// from `host:port` and is rejected. The first failure aborts the whole batch.
pub fn parse_monitor_addresses<I>(addrs: I) -> Result<Vec<IpAddr>>
where
  I: IntoIterator,
  I::Item: AsRef<str>,
{
  parse_monitor_addresses_with(&SystemResolver, addrs)
}

pub fn parse_monitor_addresses_with<R, I>(resolver: &R, addrs: I) -> Result<Vec<IpAddr>>
where
  R: Resolver + ?Sized,
  I: IntoIterator,
  I::Item: AsRef<str>,
{
  let mut mon_ips = Vec::new();

  for mon in addrs {
    let mon = mon.as_ref();
    let mut host = if has_port(mon) {
      split_host(mon)?
    } else {
      mon
    };

    if host.starts_with('[') {
      host = host.trim_matches(BRACKETS);
    }

    match host.parse::<IpAddr>() {
      Ok(ip) => mon_ips.push(ip),
      Err(_) => {
        let ips = resolver
          .lookup(host)
          .map_err(|source| RbdError::Resolution {
            host: host.to_owned(),
            source,
          })?;
        debug!("Resolved monitor {} to {:?}", host, ips);
        mon_ips.extend(ips);
      }
    }
  }

  Ok(mon_ips)
}

fn has_port(addr: &str) -> bool {
  if addr.starts_with('[') {
    IPV6_WITH_PORT.is_match(addr)
  } else {
    addr.contains(':')
  }
}

// Split `host:port` or `[host]:port` and return the host, brackets removed.
fn split_host(addr: &str) -> Result<&str> {
  let invalid = |reason| RbdError::InvalidAddress {
    address: addr.to_owned(),
    reason,
  };

  let colon = addr.rfind(':').ok_or_else(|| invalid("missing port"))?;
  let host = &addr[..colon];

  if host.starts_with('[') {
    match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
      Some(inner) if !inner.contains(BRACKETS) => Ok(inner),
      _ => Err(invalid("unexpected bracket")),
    }
  } else if host.contains(':') {
    Err(invalid("too many colons"))
  } else if host.contains(BRACKETS) {
    Err(invalid("unexpected bracket"))
  } else {
    Ok(host)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::{
    collections::HashMap,
    net::{Ipv4Addr, Ipv6Addr},
  };
  use test_case::test_case;

  struct StaticResolver(HashMap<&'static str, Vec<IpAddr>>);

  impl StaticResolver {
    fn new() -> Self {
      let mut hosts = HashMap::new();
      hosts.insert(
        "mon1.example",
        vec![
          IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
          IpAddr::V6("fd00::10".parse().unwrap()),
        ],
      );
      hosts.insert("mon2.example", vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 11))]);
      StaticResolver(hosts)
    }
  }

  impl Resolver for StaticResolver {
    fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
      self
        .0
        .get(host)
        .cloned()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such host"))
    }
  }

  fn parse(addrs: &[&str]) -> Result<Vec<String>> {
    parse_monitor_addresses_with(&StaticResolver::new(), addrs)
      .map(|ips| ips.into_iter().map(|ip| ip.to_string()).collect())
  }

  #[test_case(&["10.0.0.1"], &["10.0.0.1"] ; "ipv4")]
  #[test_case(&["10.0.0.1:6789"], &["10.0.0.1"] ; "ipv4 with port")]
  #[test_case(&["[::1]:6789"], &["::1"] ; "ipv6 with port")]
  #[test_case(&["[fd00::1]:3300"], &["fd00::1"] ; "ipv6 msgr2 port")]
  #[test_case(&["[::1]"], &["::1"] ; "bracketed ipv6 without port")]
  #[test_case(&["mon1.example"], &["192.168.1.10", "fd00::10"] ; "host keeps resolver order")]
  #[test_case(&["mon2.example:6789"], &["192.168.1.11"] ; "host with port")]
  #[test_case(
    &["10.0.0.1", "mon1.example", "10.0.0.1:6789"],
    &["10.0.0.1", "192.168.1.10", "fd00::10", "10.0.0.1"]
    ; "input order kept and no dedup")]
  #[test_case(&[], &[] ; "empty")]
  fn normalizes(addrs: &[&str], expected: &[&str]) {
    assert_eq!(parse(addrs).unwrap(), expected);
  }

  #[test]
  fn typed_addresses() {
    let ips = parse_monitor_addresses_with(&StaticResolver::new(), vec!["10.0.0.1:6789", "[::1]:6789"]).unwrap();

    assert_eq!(
      ips,
      vec![
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        IpAddr::V6(Ipv6Addr::LOCALHOST)
      ]
    );
  }

  // A bare IPv6 literal contains ':' and is taken for host:port, which then
  // has too many colons.
  #[test_case(&["::1"] ; "bare ipv6")]
  #[test_case(&["fd00::1:6789"] ; "bare ipv6 with port")]
  #[test_case(&["10.0.0.1", "[::1]:6789]:1"] ; "nested brackets")]
  fn rejects_invalid(addrs: &[&str]) {
    let err = parse(addrs).unwrap_err();

    assert!(matches!(err, RbdError::InvalidAddress { .. }));
    assert!(err.is_resolution_failure());
  }

  #[test]
  fn resolution_failure_discards_partial_results() {
    let err = parse(&["10.0.0.1", "mon1.example", "unknown.example:6789"]).unwrap_err();

    match err {
      RbdError::Resolution { host, .. } => assert_eq!(host, "unknown.example"),
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn ipv6_port_pattern() {
    assert!(has_port("[::1]:6789"));
    assert!(!has_port("[::1]"));
    assert!(!has_port("[::1]:"));
    assert!(has_port("10.0.0.1:6789"));
    assert!(!has_port("10.0.0.1"));
  }

  #[test]
  fn system_resolver_passes_literals_through() {
    let ips = parse_monitor_addresses(&["127.0.0.1:6789"]).unwrap();

    assert_eq!(ips, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
  }
}
