//! ipset command - kernel IP set membership management.

use std::net::IpAddr;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use nlset::Ipset;
use nlset::ipset::{Operation, build_entry_message};
use nlset::util::addr::{addr_octets, canonical_addr, parse_host_port};

#[derive(Parser)]
#[command(name = "ipset", version, about = "Kernel IP set membership tool")]
struct Cli {
    /// Target sets were created with per-entry timeout support.
    #[arg(long, global = true)]
    timeouts: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an address to a set.
    #[command(visible_alias = "a")]
    Add {
        /// Set name (at most 31 characters).
        set: String,
        /// IPv4 or IPv6 address; `[addr]:port` forms are accepted, the
        /// port is ignored.
        address: String,
        /// Entry timeout in seconds (0 = no expiry; needs --timeouts).
        #[arg(long, default_value_t = 0)]
        timeout: u32,
    },

    /// Remove an address from a set.
    #[command(visible_alias = "d")]
    Del {
        /// Set name (at most 31 characters).
        set: String,
        /// IPv4 or IPv6 address.
        address: String,
    },

    /// Print the wire encoding of a request without sending it.
    Encode {
        /// Operation to encode.
        op: OpArg,
        /// Set name (at most 31 characters).
        set: String,
        /// IPv4 or IPv6 address.
        address: String,
        /// Entry timeout in seconds (ignored for del).
        #[arg(long, default_value_t = 0)]
        timeout: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OpArg {
    Add,
    Del,
}

impl From<OpArg> for Operation {
    fn from(op: OpArg) -> Self {
        match op {
            OpArg::Add => Operation::Add,
            OpArg::Del => Operation::Del,
        }
    }
}

/// Parse a CLI address argument, collapsing IPv4-mapped forms.
fn resolve_addr(s: &str) -> anyhow::Result<IpAddr> {
    let (addr, port) = parse_host_port(s).with_context(|| format!("cannot parse '{s}'"))?;
    if let Some(port) = port {
        tracing::warn!(port, "address carries a port, ignoring it");
    }
    Ok(canonical_addr(addr))
}

fn print_hex(msg: &[u8]) {
    for chunk in msg.chunks(16) {
        let line: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("{}", line.join(" "));
    }
    println!("{} bytes", msg.len());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Add {
            set,
            address,
            timeout,
        } => {
            let addr = resolve_addr(&address)?;
            let ipset = Ipset::new()?.timeout_support(cli.timeouts);
            ipset
                .add(&set, addr, timeout)
                .await
                .with_context(|| format!("adding {addr} to '{set}'"))?;
        }

        Command::Del { set, address } => {
            let addr = resolve_addr(&address)?;
            let ipset = Ipset::new()?.timeout_support(cli.timeouts);
            ipset
                .del(&set, addr)
                .await
                .with_context(|| format!("removing {addr} from '{set}'"))?;
        }

        Command::Encode {
            op,
            set,
            address,
            timeout,
        } => {
            let addr = resolve_addr(&address)?;
            let octets = addr_octets(addr);
            let msg = build_entry_message(op.into(), &set, &octets, (timeout > 0).then_some(timeout))?;
            print_hex(&msg);
        }
    }

    Ok(())
}
