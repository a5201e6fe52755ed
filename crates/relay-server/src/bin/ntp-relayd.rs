// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Time relay daemon.
//!
//! Run with:
//!   RUST_LOG=info ntp-relayd --port 1123
//!
//! Filter to session-level events:
//!   RUST_LOG=relay_server=debug ntp-relayd --config /etc/ntp-relay.toml

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use relay_server::config::RelayConfig;
use relay_server::server::RelayServer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(author, version, about = "Relay upstream-corrected time to TCP clients", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to listen on (overrides the configuration file)
    #[arg(short, long)]
    listen: Option<String>,

    /// Port to listen on (overrides the configuration file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream NTP server; repeat for several (replaces the configured list)
    #[arg(short, long = "upstream")]
    upstreams: Vec<String>,

    /// Seconds between sync rounds (overrides the configuration file)
    #[arg(long)]
    sync_interval: Option<f64>,

    /// Seconds between status log lines; 0 disables them
    #[arg(long, default_value_t = 60)]
    status_interval: u64,

    /// Log status as JSON instead of a summary line
    #[arg(long)]
    status_json: bool,
}

impl Args {
    fn into_config(self) -> Result<RelayConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::load(path)?,
            None => RelayConfig::default(),
        };
        if let Some(host) = self.listen {
            config.network.host = host;
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if !self.upstreams.is_empty() {
            config.sync.upstream_servers = self.upstreams;
        }
        if let Some(secs) = self.sync_interval {
            config.sync.interval = Duration::try_from_secs_f64(secs)?;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let args = Args::parse();
    let status_interval = Duration::from_secs(args.status_interval);
    let status_json = args.status_json;

    let server = RelayServer::builder().config(args.into_config()?).build()?;
    let addr = server.start().await?;
    info!(%addr, "ntp-relayd ready");

    let mut ticker = (!status_interval.is_zero()).then(|| {
        tokio::time::interval_at(tokio::time::Instant::now() + status_interval, status_interval)
    });

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    error!(error = %e, "couldn't listen for shutdown signal");
                }
                info!("shutdown requested");
                break;
            }
            _ = async {
                match ticker.as_mut() {
                    Some(t) => { t.tick().await; }
                    None => std::future::pending::<()>().await,
                }
            } => {
                let status = server.status();
                if status_json {
                    info!(status = %status.to_json(), "relay status");
                } else {
                    info!("{status}");
                }
            }
        }
    }

    server.stop().await?;
    Ok(())
}
