//! Address parsing and formatting utilities.

use std::net::{IpAddr, Ipv6Addr};

/// Error type for address parsing.
#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),
}

pub type Result<T> = std::result::Result<T, AddrError>;

/// Parse an IP address from string.
pub fn parse_addr(s: &str) -> Result<IpAddr> {
    s.parse()
        .map_err(|_| AddrError::InvalidAddress(s.to_string()))
}

/// Parse an address with an optional port.
///
/// Accepts the forms `1.2.3.4`, `1.2.3.4:53`, `2001:db8::1`, and
/// `[2001:db8::1]:53`. A bare IPv6 address never has a port: the colons
/// belong to the address, bracket it to attach one.
pub fn parse_host_port(s: &str) -> Result<(IpAddr, Option<u16>)> {
    if let Some(rest) = s.strip_prefix('[') {
        // Bracketed IPv6, optionally followed by :port.
        let (addr_str, tail) = rest
            .split_once(']')
            .ok_or_else(|| AddrError::InvalidAddress(s.to_string()))?;
        let addr: Ipv6Addr = addr_str
            .parse()
            .map_err(|_| AddrError::InvalidAddress(addr_str.to_string()))?;
        let port = match tail.strip_prefix(':') {
            Some(port_str) => Some(parse_port(port_str)?),
            None if tail.is_empty() => None,
            None => return Err(AddrError::InvalidAddress(s.to_string())),
        };
        return Ok((IpAddr::V6(addr), port));
    }

    if s.matches(':').count() > 1 {
        // Unbracketed IPv6, no port possible.
        return Ok((parse_addr(s)?, None));
    }

    match s.split_once(':') {
        Some((addr_str, port_str)) => Ok((parse_addr(addr_str)?, Some(parse_port(port_str)?))),
        None => Ok((parse_addr(s)?, None)),
    }
}

fn parse_port(s: &str) -> Result<u16> {
    s.parse().map_err(|_| AddrError::InvalidPort(s.to_string()))
}

/// Collapse an IPv4-mapped IPv6 address to its IPv4 form.
///
/// Dual-stack listeners hand out `::ffff:a.b.c.d` peers; sets keyed by
/// IPv4 want the embedded address.
pub fn canonical_addr(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => addr,
        },
        IpAddr::V4(_) => addr,
    }
}

/// Raw network-order octets of an address: 4 bytes for IPv4, 16 for IPv6.
pub fn addr_octets(addr: IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}
