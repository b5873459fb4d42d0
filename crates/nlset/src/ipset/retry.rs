//! Bounded retry for transient send failures.

use std::io;
use std::time::Duration;

/// Classification of a raw transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to resolve on its own shortly; worth retrying.
    Transient,
    /// Will not get better by waiting; must be surfaced.
    Fatal,
}

/// Classify a send error as transient or fatal.
///
/// Only would-block and interrupted-call conditions are transient.
/// Everything else, permission errors and exhausted kernel buffers
/// included, is fatal: retrying those would spin without progress.
pub fn classify(err: &io::Error) -> ErrorClass {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => ErrorClass::Transient,
        _ => ErrorClass::Fatal,
    }
}

/// Retry strategy for transient send failures.
///
/// A fixed short pause between attempts and a hard cap on how many are
/// made. The defaults match the cadence the kernel path expects: transient
/// conditions clear within microseconds, so fifty 10µs pauses bound the
/// worst case well under a millisecond.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum send attempts before giving up.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            backoff: Duration::from_micros(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that fails on the first transient error.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn would_block_and_interrupted_are_transient() {
        for kind in [io::ErrorKind::WouldBlock, io::ErrorKind::Interrupted] {
            let err = io::Error::from(kind);
            assert_eq!(classify(&err), ErrorClass::Transient);
        }
    }

    #[test]
    fn raw_errnos_map_to_expected_classes() {
        let eagain = io::Error::from_raw_os_error(libc::EAGAIN);
        assert_eq!(classify(&eagain), ErrorClass::Transient);

        let eintr = io::Error::from_raw_os_error(libc::EINTR);
        assert_eq!(classify(&eintr), ErrorClass::Transient);
    }

    #[test]
    fn everything_else_is_fatal() {
        for errno in [libc::EPERM, libc::EACCES, libc::ENOBUFS, libc::EINVAL] {
            let err = io::Error::from_raw_os_error(errno);
            assert_eq!(classify(&err), ErrorClass::Fatal, "errno {errno}");
        }
    }

    #[test]
    fn default_policy_bounds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 50);
        assert_eq!(policy.backoff, Duration::from_micros(10));

        assert_eq!(RetryPolicy::no_retry().max_attempts, 1);
    }
}
