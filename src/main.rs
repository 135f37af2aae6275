//! # talos-mcp
//!
//! MCP (Model Context Protocol) server that exposes a Talos Linux cluster to
//! AI agents. Runs as a stdio JSON-RPC server, designed to be launched by an
//! AI agent host.
//!
//! ## Architecture
//!
//! ```text
//! main.rs     entry point, logging, diagnostic mode, MCP server launch
//! config.rs   CLI / env / talosconfig loading
//! proto.rs    Talos machine API messages (prost)
//! client.rs   mTLS gRPC client for the Talos API
//! cluster.rs  lazy connection and the per-node RPC loop
//! records.rs  typed tool output and JSON encoding
//! tools.rs    tool definitions and handlers
//! mcp.rs      MCP JSON-RPC protocol handler (stdio)
//! error.rs    error taxonomy
//! ```
//!
//! ## Tools
//!
//! `list_disks`, `list_network_interfaces`, `list_memory`, `list_cpu`,
//! `reboot_node`.
//!
//! Logs go to stderr; stdout belongs to the protocol.

mod client;
mod cluster;
mod config;
mod error;
mod mcp;
mod proto;
mod records;
mod tools;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use client::{Connector, TalosConnector};
use cluster::ClusterAdapter;
use config::{Cli, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let log_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_cli(&cli);
    let connector = TalosConnector {
        connect_timeout: settings.connect_timeout,
    };
    let cluster = ClusterAdapter::new(settings.source, connector, settings.reboot_mode);

    if cli.diagnose {
        if !diagnose(cluster).await {
            std::process::exit(1);
        }
        return;
    }

    info!("talos-mcp v{} serving on stdio", env!("CARGO_PKG_VERSION"));
    mcp::run_stdio(cluster).await;
}

/// One-shot check: list network interfaces and disks, print them, exit.
///
/// Returns `false` if any step failed.
async fn diagnose<C: Connector>(mut cluster: ClusterAdapter<C>) -> bool {
    match cluster.check_config() {
        Ok(ctx) => println!(
            "Context {}: endpoints {:?}, nodes {:?}",
            ctx.name, ctx.endpoints, ctx.nodes
        ),
        Err(e) => {
            error!("configuration error: {e}");
            println!("Error loading talosconfig: {e}");
            return false;
        }
    }

    let interfaces = tools::handle_tool_call(
        "list_network_interfaces",
        &serde_json::Value::Null,
        &mut cluster,
    )
    .await;
    if interfaces.is_error {
        println!("Error listing network interfaces: {}", interfaces.text_content());
        return false;
    }
    println!("Network interfaces:\n{}", interfaces.text_content());

    let disks = tools::handle_tool_call("list_disks", &serde_json::Value::Null, &mut cluster).await;
    if disks.is_error {
        println!("Error listing disks: {}", disks.text_content());
        return false;
    }
    println!("Disks:\n{}", disks.text_content());
    true
}
