// Chaingate - Contract-directed reverse proxy
// Copyright (C) 2025 Chaingate Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Chaingate Proxy Server
//!
//! A dynamic reverse proxy that forwards client requests to an upstream
//! origin whose domain is resolved at runtime from a BNB Smart Chain
//! registry contract. The domain can change on-chain without
//! redeploying the proxy.

use clap::Parser;
use chaingate_common::env::{CHAINGATE_CONTRACT_ADDRESS, CHAINGATE_RPC_URLS};
use chaingate_common::init_logging;
use eyre::Result;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use chaingate_proxy::ProxyServerBuilder;

/// Chaingate Contract-Directed Reverse Proxy
#[derive(Parser, Debug)]
#[command(name = "chaingate-proxy")]
#[command(about = "Reverse proxy whose upstream domain is resolved from a smart contract")]
#[command(version)]
struct Args {
    // ========== General Configuration ==========
    /// Address to bind to
    /// Example: --host 0.0.0.0
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "3000")]
    port: u16,

    // ========== Domain Resolution Configuration ==========
    /// JSON-RPC endpoints tried in order (comma-separated, overrides defaults if provided)
    /// Example: --rpc-urls "https://bsc.drpc.org,https://rpc.ankr.com/bsc"
    #[arg(long)]
    rpc_urls: Option<String>,

    /// Domain registry contract address (0x-prefixed hex)
    #[arg(long)]
    contract_address: Option<String>,

    /// Seconds a resolved domain stays cached
    #[arg(long, default_value = "60")]
    cache_ttl: u64,

    /// Timeout in seconds for a single RPC resolution attempt
    #[arg(long, default_value = "10")]
    rpc_timeout: u64,

    /// Verbosity level (repeat for more: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set RUST_LOG based on verbosity
    if std::env::var("RUST_LOG").is_err() {
        let level = match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    // Initialize logging
    init_logging("chaingate-proxy", true)?;

    run_server(args).await
}

/// Run the proxy server
async fn run_server(args: Args) -> Result<()> {
    // CLI arguments win over the environment
    let rpc_urls = args.rpc_urls.or_else(|| std::env::var(CHAINGATE_RPC_URLS).ok());
    let contract_address =
        args.contract_address.or_else(|| std::env::var(CHAINGATE_CONTRACT_ADDRESS).ok());

    // Create the proxy server using builder pattern
    let mut builder = ProxyServerBuilder::new()
        .cache_ttl(Duration::from_secs(args.cache_ttl))
        .rpc_timeout(Duration::from_secs(args.rpc_timeout));

    // Set RPC URLs if provided
    if let Some(urls) = rpc_urls {
        builder = builder.rpc_urls_str(&urls);
    }

    // Set registry contract if provided
    if let Some(address) = contract_address {
        builder = builder.contract_address(address);
    }

    let proxy = builder.build()?;

    // Start the server
    let ip = IpAddr::from_str(&args.host)?;
    let addr = SocketAddr::from((ip, args.port));

    info!("Starting Chaingate proxy on {}", addr);

    proxy.serve(addr).await?;

    info!("Chaingate proxy stopped");

    Ok(())
}
