//! Low-level async netlink socket operations.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result};

/// Async raw socket on the netfilter netlink family.
///
/// Owned by whoever constructs it; there is no process-global socket and no
/// lazy initialization. Creation needs CAP_NET_ADMIN.
pub struct NetlinkSocket {
    /// The underlying async file descriptor.
    fd: AsyncFd<Socket>,
}

impl NetlinkSocket {
    /// Create a socket bound to NETLINK_NETFILTER.
    pub fn netfilter() -> Result<Self> {
        let mut socket =
            Socket::new(protocols::NETLINK_NETFILTER).map_err(Error::SocketCreation)?;
        socket.set_non_blocking(true).map_err(Error::SocketCreation)?;

        // Bind with port 0; the kernel assigns one.
        let addr = SocketAddr::new(0, 0);
        socket.bind(&addr).map_err(Error::SocketCreation)?;

        let fd = AsyncFd::new(socket).map_err(Error::SocketCreation)?;

        Ok(Self { fd })
    }

    /// Send one finished message as a datagram addressed to the kernel.
    ///
    /// Waits for writability and performs a single send; not-ready states
    /// are absorbed by the readiness loop, every other outcome (including
    /// EINTR) is returned to the caller for classification.
    pub async fn send_to_kernel(&self, msg: &[u8]) -> io::Result<usize> {
        // Destination port 0, no multicast groups: the kernel itself.
        let kernel = SocketAddr::new(0, 0);

        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send_to(msg, &kernel, 0)) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}
