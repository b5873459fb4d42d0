//! Minimal netlink encoding and transport layer.
//!
//! Just enough of the netlink protocol to speak to the netfilter
//! subsystem: header mirrors, aligned TLV attribute encoding with nested
//! backpatching, and an async kernel-bound datagram socket. Parsing
//! ([`MessageIter`], [`AttrIter`]) covers reading back what this crate
//! encodes; there is no receive path.

pub mod attr;
mod builder;
mod error;
pub mod message;
mod socket;

pub use attr::{AttrIter, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use error::{Error, Result};
pub use message::{MessageIter, NFNETLINK_V0, NLMSG_HDRLEN, NfGenMsg, NlMsgHdr};
pub use socket::NetlinkSocket;
