//! `keyroutectl`: offline diagnostics for the keyroute selector.
//!
//! Runs the same ring construction and selection code the RPC client uses,
//! without dialing anything.
//!
//! # Usage
//!
//! ```text
//! keyroutectl select -s OrderService -a 10.0.0.1:8080,10.0.0.2:8080 -p 42
//! keyroutectl ring -a 10.0.0.1:8080,10.0.0.2:8080,10.0.0.3:8080
//! keyroutectl diff -b a:1,b:2,c:3 --after a:1,c:3 -n 100000
//! keyroutectl -c keyroute.toml --digest blake3 ring -a a:1,b:2
//! ```

mod config;
mod telemetry;

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keyroute_balance::{BalanceConfig, ConsistentHashLoadBalance, LoadBalance};
use keyroute_ring::HashRing;
use keyroute_types::{Address, AddressSnapshot, RpcRequest};
use tracing::{debug, info};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "keyroutectl",
    version,
    about = "Inspect consistent-hash address selection"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the number of virtual nodes per address.
    #[arg(long, global = true)]
    replicas: Option<u32>,

    /// Override the digest algorithm (`md5` or `blake3`).
    #[arg(long, global = true)]
    digest: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the address a call would be routed to.
    Select {
        /// Service interface name.
        #[arg(short, long)]
        service: String,

        /// Method name (does not affect routing).
        #[arg(short, long, default_value = "invoke")]
        method: String,

        /// Service group.
        #[arg(short, long, default_value = "")]
        group: String,

        /// Service version.
        #[arg(short = 'v', long = "service-version", default_value = "")]
        service_version: String,

        /// Call parameter. Can be specified multiple times.
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Service addresses, comma separated or repeated.
        #[arg(short, long = "addr", value_delimiter = ',', required = true)]
        addrs: Vec<String>,
    },

    /// Print virtual-node counts and ring share per address.
    Ring {
        /// Service addresses, comma separated or repeated.
        #[arg(short, long = "addr", value_delimiter = ',', required = true)]
        addrs: Vec<String>,
    },

    /// Show how many keys move between two memberships.
    Diff {
        /// Addresses before the change.
        #[arg(short, long, value_delimiter = ',', required = true)]
        before: Vec<String>,

        /// Addresses after the change.
        #[arg(long, value_delimiter = ',', required = true)]
        after: Vec<String>,

        /// Number of sample keys.
        #[arg(short = 'n', long, default_value = "10000")]
        keys: usize,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init(&config.log.level);

    if let Some(replicas) = cli.replicas {
        config.balance.replicas = replicas;
    }
    if let Some(digest) = cli.digest {
        config.balance.digest = digest;
    }
    debug!(?config, "loaded configuration");

    let output = match cli.command {
        Commands::Select {
            service,
            method,
            group,
            service_version,
            params,
            addrs,
        } => {
            let mut request = RpcRequest::new(service, method)
                .with_group(group)
                .with_version(service_version);
            request.parameters = params;
            cmd_select(&config.balance, &request, &addrs)?
        }
        Commands::Ring { addrs } => cmd_ring(&config.balance, &addrs)?,
        Commands::Diff {
            before,
            after,
            keys,
        } => cmd_diff(&config.balance, &before, &after, keys)?,
    };

    print!("{output}");
    Ok(())
}

// -----------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------

fn cmd_select(config: &BalanceConfig, request: &RpcRequest, addrs: &[String]) -> Result<String> {
    let balancer =
        ConsistentHashLoadBalance::new(config).context("invalid balance configuration")?;
    let snapshot = AddressSnapshot::new(addrs);

    let address = balancer
        .select_service_address(&snapshot, request)
        .context("selection failed")?;
    info!(
        service = %request.rpc_service_name(),
        key = %request.selection_key(),
        %address,
        "selected address"
    );

    Ok(format!("{address}\n"))
}

fn cmd_ring(config: &BalanceConfig, addrs: &[String]) -> Result<String> {
    let ring = build_ring(config, addrs)?;
    let counts = ring.vnode_counts();
    let shares = ring.shares();

    let mut out = String::new();
    writeln!(
        out,
        "{} addresses, {} virtual nodes ({} replicas, {})",
        ring.address_count(),
        ring.vnode_count(),
        ring.replicas(),
        ring.algorithm()
    )?;
    for (address, share) in &shares {
        let vnodes = counts.get(address).copied().unwrap_or(0);
        writeln!(out, "{address:<24} {vnodes:>6} {:>7.2}%", share * 100.0)?;
    }
    Ok(out)
}

fn cmd_diff(
    config: &BalanceConfig,
    before: &[String],
    after: &[String],
    keys: usize,
) -> Result<String> {
    let old = build_ring(config, before).context("invalid --before membership")?;
    let new = build_ring(config, after).context("invalid --after membership")?;

    let sample: Vec<String> = (0..keys).map(|i| format!("key[{i}]")).collect();
    let moved = HashRing::diff(&old, &new, sample.iter().map(String::as_str));

    let mut flows: BTreeMap<(&Address, &Address), usize> = BTreeMap::new();
    for m in &moved {
        *flows.entry((&m.from, &m.to)).or_insert(0) += 1;
    }

    let ratio = if keys == 0 {
        0.0
    } else {
        moved.len() as f64 / keys as f64
    };

    let mut out = String::new();
    writeln!(
        out,
        "{} of {} keys moved ({:.2}%)",
        moved.len(),
        keys,
        ratio * 100.0
    )?;
    for ((from, to), count) in &flows {
        writeln!(out, "  {from} -> {to}: {count}")?;
    }
    Ok(out)
}

fn build_ring(config: &BalanceConfig, addrs: &[String]) -> Result<HashRing> {
    let algorithm = config.validate().context("invalid balance configuration")?;
    let snapshot = AddressSnapshot::new(addrs);
    let ring = HashRing::build_with(
        snapshot.addresses(),
        snapshot.token(),
        config.replicas,
        algorithm,
    )?;
    Ok(ring)
}
