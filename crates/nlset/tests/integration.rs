//! Integration tests that touch a real netfilter socket.
//!
//! Sending to the IP set subsystem needs CAP_NET_ADMIN, so these are
//! gated behind the `integration` feature and skip themselves when not
//! running as root:
//!
//! ```bash
//! sudo cargo test --test integration --features integration
//! ```
//!
//! Requests are fire-and-forget, so sends succeed at the socket level even
//! when the named set does not exist; create `nlset-itest` with
//! `ipset create nlset-itest hash:ip timeout 0` first to observe entries
//! landing (`ipset list nlset-itest`).

use nlset::{Ipset, RetryPolicy};

fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

macro_rules! require_root {
    () => {
        if !is_root() {
            eprintln!("skipping: requires root");
            return;
        }
    };
}

#[tokio::test]
async fn socket_creation_is_explicit_and_owned() {
    require_root!();

    // Two handles, two independent sockets; no shared global state.
    let a = Ipset::new().expect("first socket");
    let b = Ipset::new().expect("second socket");
    drop(a);

    // The surviving handle still works after the other closed.
    b.add_bytes("nlset-itest", &[198, 51, 100, 1], 0)
        .await
        .expect("send after sibling drop");
}

#[tokio::test]
async fn add_then_del_v4() {
    require_root!();

    let ipset = Ipset::new().unwrap().timeout_support(true);
    ipset
        .add("nlset-itest", "198.51.100.2".parse().unwrap(), 60)
        .await
        .expect("add");
    ipset
        .del("nlset-itest", "198.51.100.2".parse().unwrap())
        .await
        .expect("del");
}

#[tokio::test]
async fn add_v6_fire_and_forget() {
    require_root!();

    let ipset = Ipset::new().unwrap().retry_policy(RetryPolicy::no_retry());
    ipset
        .add("nlset-itest6", "2001:db8::2".parse().unwrap(), 0)
        .await
        .expect("v6 add");
}
