//! Kernel IP set membership operations.
//!
//! This module builds and sends the nfnetlink messages that add and remove
//! addresses from named kernel IP sets (the sets `iptables -m set` matches
//! against). Requests are fire-and-forget datagrams: the kernel is not
//! asked for an ACK, matching how packet-path producers feed sets.
//!
//! # Example
//!
//! ```ignore
//! use nlset::Ipset;
//!
//! let ipset = Ipset::new()?.timeout_support(true);
//!
//! // Ban for ten minutes (the set must be created with the timeout option).
//! ipset.add("blocklist", "203.0.113.7".parse()?, 600).await?;
//!
//! // Lift the ban.
//! ipset.del("blocklist", "203.0.113.7".parse()?).await?;
//! ```

pub mod retry;

use std::net::IpAddr;

use tracing::debug;

use crate::netlink::attr::NLA_F_NET_BYTEORDER;
use crate::netlink::message::{NLM_F_REPLACE, NLM_F_REQUEST, NfGenMsg};
use crate::netlink::{Error, MessageBuilder, NetlinkSocket, Result};

pub use retry::{ErrorClass, RetryPolicy, classify};

/// nfnetlink subsystem id for IP set management.
pub const NFNL_SUBSYS_IPSET: u8 = 6;

/// Protocol version spoken with the kernel's set manager.
pub const IPSET_PROTOCOL: u8 = 6;

/// Kernel name slot size: 31 name bytes plus NUL terminator.
pub const IPSET_MAXNAMELEN: usize = 32;

/// Message buffer cap. The largest message this module emits (31-byte
/// name, IPv6 address, timeout) stays under 100 bytes; 256 leaves slack.
pub const MSG_CAPACITY: usize = 256;

// Attribute types, top level.
const IPSET_ATTR_PROTOCOL: u16 = 1;
const IPSET_ATTR_SETNAME: u16 = 2;
const IPSET_ATTR_DATA: u16 = 7;

// Attribute types, inside DATA.
const IPSET_ATTR_IP: u16 = 1;
const IPSET_ATTR_TIMEOUT: u16 = 6;

// Attribute types, inside IP.
const IPSET_ATTR_IPADDR_IPV4: u16 = 1;
const IPSET_ATTR_IPADDR_IPV6: u16 = 2;

/// Membership operation on a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Add an entry (IPSET_CMD_ADD).
    Add,
    /// Delete an entry (IPSET_CMD_DEL).
    Del,
}

impl Operation {
    /// Command code within the ipset subsystem.
    pub fn code(self) -> u16 {
        match self {
            Operation::Add => 9,
            Operation::Del => 10,
        }
    }

    /// Full netlink message type: subsystem id in the high byte.
    pub fn msg_type(self) -> u16 {
        ((NFNL_SUBSYS_IPSET as u16) << 8) | self.code()
    }

    /// Whether the operation may carry a per-entry timeout.
    ///
    /// Deletion never does; a timeout on removal is meaningless.
    pub fn carries_timeout(self) -> bool {
        matches!(self, Operation::Add)
    }
}

/// Build one add/del request for `(set_name, addr, timeout)`.
///
/// `addr` must be 4 (IPv4) or 16 (IPv6) raw bytes; the length alone
/// selects the address family. `timeout` is in seconds and is only encoded
/// for [`Operation::Add`] when positive. Validation happens before any
/// byte is written, so failures have no side effects.
///
/// Exposed for inspection and testing; [`Ipset`] drives it for real sends.
pub fn build_entry_message(
    op: Operation,
    set_name: &str,
    addr: &[u8],
    timeout: Option<u32>,
) -> Result<Vec<u8>> {
    let family = match addr.len() {
        4 => libc::AF_INET as u8,
        16 => libc::AF_INET6 as u8,
        len => return Err(Error::InvalidAddress { len }),
    };

    // Name plus terminator must fit the kernel's fixed slot.
    if set_name.len() >= IPSET_MAXNAMELEN {
        return Err(Error::NameTooLong {
            name: set_name.to_string(),
            len: set_name.len(),
        });
    }
    if set_name.as_bytes().contains(&0) {
        return Err(Error::InvalidSetName {
            name: set_name.to_string(),
        });
    }

    let mut builder = MessageBuilder::new(
        op.msg_type(),
        NLM_F_REQUEST | NLM_F_REPLACE,
        MSG_CAPACITY,
    );
    builder.append_bytes(NfGenMsg::new(family).as_bytes())?;

    builder.append_attr_u8(IPSET_ATTR_PROTOCOL, IPSET_PROTOCOL)?;
    builder.append_attr_str(IPSET_ATTR_SETNAME, set_name)?;

    let data = builder.nest_start(IPSET_ATTR_DATA)?;
    let ip = builder.nest_start(IPSET_ATTR_IP)?;
    let addr_kind = if family == libc::AF_INET as u8 {
        IPSET_ATTR_IPADDR_IPV4
    } else {
        IPSET_ATTR_IPADDR_IPV6
    };
    builder.append_attr(addr_kind | NLA_F_NET_BYTEORDER, addr)?;
    builder.nest_end(ip);

    if op.carries_timeout() {
        if let Some(secs) = timeout.filter(|&secs| secs > 0) {
            builder.append_attr_u32_be(IPSET_ATTR_TIMEOUT | NLA_F_NET_BYTEORDER, secs)?;
        }
    }
    builder.nest_end(data);

    Ok(builder.finish())
}

/// Handle for manipulating kernel IP sets.
///
/// Owns its netfilter socket; create once and share (`&self` methods,
/// datagram sends need no serialization). Dropping it closes the socket.
pub struct Ipset {
    socket: NetlinkSocket,
    retry: RetryPolicy,
    timeout_support: bool,
}

impl Ipset {
    /// Create a handle with its own netfilter socket.
    ///
    /// Per-entry timeouts start disabled; enable them with
    /// [`timeout_support`](Self::timeout_support) when the target sets were
    /// created with the timeout option.
    pub fn new() -> Result<Self> {
        Ok(Self::from_socket(NetlinkSocket::netfilter()?))
    }

    /// Create a handle over an existing socket.
    pub fn from_socket(socket: NetlinkSocket) -> Self {
        Self {
            socket,
            retry: RetryPolicy::default(),
            timeout_support: false,
        }
    }

    /// Declare whether the target sets support per-entry timeouts.
    ///
    /// When off, timeouts passed to [`add`](Self::add) are dropped rather
    /// than sent: the kernel rejects a TIMEOUT attribute on a set created
    /// without timeout support.
    pub fn timeout_support(mut self, enabled: bool) -> Self {
        self.timeout_support = enabled;
        self
    }

    /// Replace the retry policy for transient send failures.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether per-entry timeouts are enabled on this handle.
    pub fn has_timeout_support(&self) -> bool {
        self.timeout_support
    }

    /// Add `addr` to `set_name`, expiring after `timeout` seconds.
    ///
    /// A zero `timeout` means no expiry. The timeout is also dropped when
    /// this handle has timeout support disabled.
    pub async fn add(&self, set_name: &str, addr: IpAddr, timeout: u32) -> Result<()> {
        match addr {
            IpAddr::V4(v4) => self.add_bytes(set_name, &v4.octets(), timeout).await,
            IpAddr::V6(v6) => self.add_bytes(set_name, &v6.octets(), timeout).await,
        }
    }

    /// Remove `addr` from `set_name`.
    pub async fn del(&self, set_name: &str, addr: IpAddr) -> Result<()> {
        match addr {
            IpAddr::V4(v4) => self.del_bytes(set_name, &v4.octets()).await,
            IpAddr::V6(v6) => self.del_bytes(set_name, &v6.octets()).await,
        }
    }

    /// Add a raw 4- or 16-byte address to `set_name`.
    pub async fn add_bytes(&self, set_name: &str, addr: &[u8], timeout: u32) -> Result<()> {
        let timeout = gate_timeout(self.timeout_support, timeout);
        self.send_entry(Operation::Add, set_name, addr, timeout)
            .await?;
        Ok(())
    }

    /// Remove a raw 4- or 16-byte address from `set_name`.
    pub async fn del_bytes(&self, set_name: &str, addr: &[u8]) -> Result<()> {
        self.send_entry(Operation::Del, set_name, addr, None).await?;
        Ok(())
    }

    /// Build and transmit one request, returning the bytes sent.
    async fn send_entry(
        &self,
        op: Operation,
        set_name: &str,
        addr: &[u8],
        timeout: Option<u32>,
    ) -> Result<usize> {
        let msg = build_entry_message(op, set_name, addr, timeout)?;

        let mut attempts: u32 = 0;
        loop {
            match self.socket.send_to_kernel(&msg).await {
                Ok(sent) => {
                    debug!(set = set_name, op = ?op, bytes = sent, "ipset request sent");
                    return Ok(sent);
                }
                Err(err) => match classify(&err) {
                    ErrorClass::Transient => {
                        attempts += 1;
                        if attempts >= self.retry.max_attempts {
                            return Err(Error::RetriesExhausted {
                                attempts,
                                source: err,
                            });
                        }
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                    ErrorClass::Fatal => return Err(Error::SendFailed(err)),
                },
            }
        }
    }
}

/// Apply the timeout-support gate: a timeout is only forwarded when the
/// capability is enabled and the value is positive.
fn gate_timeout(enabled: bool, secs: u32) -> Option<u32> {
    if enabled && secs > 0 { Some(secs) } else { None }
}
