//! Error types for netlink and IP set operations.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or sending IP set requests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Address payload is neither 4 (IPv4) nor 16 (IPv6) bytes.
    #[error("invalid address length {len}: expected 4 (IPv4) or 16 (IPv6) bytes")]
    InvalidAddress {
        /// The rejected payload length.
        len: usize,
    },

    /// Set name does not fit the kernel's 32-byte name slot.
    #[error("set name '{name}' is {len} bytes: the kernel allows at most 31 plus terminator")]
    NameTooLong {
        /// The rejected set name.
        name: String,
        /// Its length in bytes.
        len: usize,
    },

    /// Set name contains a NUL byte and would be truncated kernel-side.
    #[error("set name {name:?} contains a NUL byte")]
    InvalidSetName {
        /// The rejected set name.
        name: String,
    },

    /// An append would overflow the message buffer capacity.
    #[error("message needs {needed} bytes but the buffer is capped at {capacity}")]
    MessageTooLarge {
        /// Aligned length the buffer would have needed.
        needed: usize,
        /// Configured capacity.
        capacity: usize,
    },

    /// The netlink socket could not be created.
    #[error("netlink socket creation failed: {0}")]
    SocketCreation(#[source] io::Error),

    /// The kernel rejected the send with a non-transient error.
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    /// Transient send errors persisted past the retry budget.
    #[error("send still failing after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Attempts made before giving up.
        attempts: u32,
        /// The last transient error observed.
        #[source]
        source: io::Error,
    },

    /// Message or header was shorter than its fixed-size layout.
    #[error("truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected length.
        expected: usize,
        /// Actual bytes available.
        actual: usize,
    },

    /// Invalid message framing.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute payload.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),
}

impl Error {
    /// Check if this is a permission error (EPERM, EACCES).
    ///
    /// Socket creation and sends on NETLINK_NETFILTER need CAP_NET_ADMIN;
    /// callers use this to suggest running privileged.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Io(e) | Self::SocketCreation(e) | Self::SendFailed(e) => {
                matches!(
                    e.raw_os_error(),
                    Some(code) if code == libc::EPERM || code == libc::EACCES
                )
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_detection() {
        let err = Error::SocketCreation(io::Error::from_raw_os_error(libc::EPERM));
        assert!(err.is_permission_denied());

        let err = Error::SendFailed(io::Error::from_raw_os_error(libc::EACCES));
        assert!(err.is_permission_denied());

        let err = Error::SendFailed(io::Error::from_raw_os_error(libc::ENOBUFS));
        assert!(!err.is_permission_denied());

        assert!(!Error::InvalidAddress { len: 5 }.is_permission_denied());
    }

    #[test]
    fn error_messages() {
        let err = Error::InvalidAddress { len: 5 };
        assert_eq!(
            err.to_string(),
            "invalid address length 5: expected 4 (IPv4) or 16 (IPv6) bytes"
        );

        let err = Error::MessageTooLarge {
            needed: 300,
            capacity: 256,
        };
        assert_eq!(
            err.to_string(),
            "message needs 300 bytes but the buffer is capped at 256"
        );
    }
}
