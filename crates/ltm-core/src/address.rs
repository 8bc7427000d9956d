//! Node address classification and normalization
//!
//! A node is backed by one of two remote object types depending on its
//! address: a static IPv4/IPv6 literal, or a domain name resolved by the
//! load balancer. Reads turn the remote representation back into the
//! address a user wrote, dropping any route domain suffix (`%<id>`).

use regex::Regex;
use std::net::{IpAddr, Ipv6Addr};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::traits::RemoteNode;

/// IPv4 dotted quad at the start, or anything containing ':' (IPv6)
static STATIC_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([0-9]{1,3}\.){3}[0-9]{1,3})|(.*:.*)$").expect("static address pattern is valid")
});

// xxx.xxx.xxx.xxx(%x)
static ROUTE_DOMAIN_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:[0-9]{1,3}\.){3}[0-9]{1,3})(?:%[0-9]+)?").expect("route domain pattern is valid")
});

/// Which kind of remote object backs a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// Literal IPv4 or IPv6 address
    Static,
    /// Fully-qualified domain name
    Fqdn,
}

impl std::fmt::Display for AddressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressKind::Static => f.write_str("static"),
            AddressKind::Fqdn => f.write_str("fqdn"),
        }
    }
}

/// Classify a node address
pub fn classify(address: &str) -> AddressKind {
    if STATIC_ADDRESS_RE.is_match(address) {
        AddressKind::Static
    } else {
        AddressKind::Fqdn
    }
}

/// Recover the user-facing address from a remote node
///
/// A non-empty FQDN name always wins. Otherwise the IPv4 literal is
/// extracted from the raw address with the route domain suffix removed,
/// falling back to an IPv6 literal, returned as written minus its suffix.
///
/// # Errors
///
/// `Error::DataShape` when the raw address holds no IP literal; the
/// caller must not record an empty address in its place.
pub fn normalize_address(node: &RemoteNode) -> Result<String> {
    if !node.fqdn.name.is_empty() {
        return Ok(node.fqdn.name.clone());
    }

    if let Some(ipv4) = ROUTE_DOMAIN_ADDRESS_RE
        .captures(&node.address)
        .and_then(|caps| caps.get(1))
    {
        return Ok(ipv4.as_str().to_string());
    }

    // IPv6 nodes carry the same optional %<id> suffix
    let literal = strip_route_domain(&node.address);
    if literal.parse::<Ipv6Addr>().is_ok() {
        return Ok(literal.to_string());
    }

    Err(Error::data_shape(format!(
        "Unable to parse address {:?} of node {}",
        node.address,
        display_name(node)
    )))
}

/// Whether two node addresses name the same endpoint
///
/// Route domain suffixes are ignored, IP literals compare by value
/// (`2001:DB8:0::10` equals `2001:db8::10`) and domain names compare
/// case-insensitively.
pub fn same_address(a: &str, b: &str) -> bool {
    let (a, b) = (strip_route_domain(a), strip_route_domain(b));
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        (Err(_), Err(_)) => a
            .trim_end_matches('.')
            .eq_ignore_ascii_case(b.trim_end_matches('.')),
        _ => false,
    }
}

fn strip_route_domain(address: &str) -> &str {
    address
        .split_once('%')
        .map_or(address, |(literal, _)| literal)
}

fn display_name(node: &RemoteNode) -> &str {
    if node.full_path.is_empty() {
        &node.name
    } else {
        &node.full_path
    }
}
