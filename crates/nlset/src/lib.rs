//! Kernel IP set membership management over netlink.
//!
//! This crate speaks directly to the kernel's IP set subsystem (the sets
//! created with `ipset create` and matched by `iptables -m set`) over a
//! raw NETLINK_NETFILTER socket: no shelling out, no libipset. It builds
//! the nested-TLV add/delete messages itself and sends them fire-and-forget,
//! which is what packet-path producers (intrusion blockers, DNS filters)
//! want on their hot path.
//!
//! # Example
//!
//! ```ignore
//! use nlset::Ipset;
//!
//! #[tokio::main]
//! async fn main() -> nlset::Result<()> {
//!     let ipset = Ipset::new()?.timeout_support(true);
//!
//!     ipset.add("blocklist", "203.0.113.7".parse().unwrap(), 600).await?;
//!     ipset.del("allowlist", "2001:db8::7".parse().unwrap()).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Sending needs CAP_NET_ADMIN. Message building does not; see
//! [`ipset::build_entry_message`] for offline encoding.

pub mod ipset;
pub mod netlink;
pub mod util;

// Re-export common types at crate root for convenience
pub use ipset::{Ipset, Operation, RetryPolicy};
pub use netlink::{Error, Result};
