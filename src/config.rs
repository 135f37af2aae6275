//! Configuration loading for talos-mcp.
//!
//! The talosconfig path is resolved from three fallback sources (tried in
//! order):
//!
//! 1. `--talosconfig <path>` CLI flag
//! 2. `TALOSCONFIG` environment variable
//! 3. `~/.talos/config` (the talosctl default)
//!
//! The file uses the talosctl layout: a `context` key naming the active
//! context and a `contexts` map whose entries carry `endpoints`, `nodes`, and
//! base64-encoded `ca` / `crt` / `key` PEM blocks. `--context`, `--endpoints`
//! and `--nodes` override the corresponding values from the file; nothing
//! else is merged in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::proto;

/// CLI arguments parsed by `clap`.
#[derive(Parser, Debug)]
#[command(
    name = "talos-mcp",
    version,
    about = "MCP server for inspecting and rebooting Talos Linux nodes"
)]
pub struct Cli {
    /// Path to the talosconfig file (default: ~/.talos/config)
    #[arg(long, env = "TALOSCONFIG")]
    pub talosconfig: Option<PathBuf>,

    /// Context to use instead of the file's active context
    #[arg(long, env = "TALOS_CONTEXT")]
    pub context: Option<String>,

    /// Comma-separated endpoints replacing the context's endpoints
    #[arg(long, env = "TALOS_ENDPOINTS", value_delimiter = ',')]
    pub endpoints: Vec<String>,

    /// Comma-separated nodes replacing the context's nodes
    #[arg(long, env = "TALOS_NODES", value_delimiter = ',')]
    pub nodes: Vec<String>,

    /// Reboot mode sent with `reboot_node`
    #[arg(long, value_enum, default_value_t = RebootMode::Powercycle)]
    pub reboot_mode: RebootMode,

    /// Timeout for establishing the gRPC connection, in seconds
    #[arg(long, default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// List network interfaces and disks once, print them, and exit
    #[arg(
        long,
        env = "TALOS_MCP_DIAGNOSE",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub diagnose: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Reboot mode, mirroring the Talos `RebootRequest.Mode` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RebootMode {
    Default,
    Powercycle,
    Force,
}

impl RebootMode {
    pub fn to_proto(self) -> proto::RebootMode {
        match self {
            RebootMode::Default => proto::RebootMode::Default,
            RebootMode::Powercycle => proto::RebootMode::Powercycle,
            RebootMode::Force => proto::RebootMode::Force,
        }
    }
}

/// Where the cluster context comes from. Read lazily on first connection.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit talosconfig path; `None` falls back to `~/.talos/config`.
    pub path: Option<PathBuf>,
    pub context: Option<String>,
    pub endpoints: Vec<String>,
    pub nodes: Vec<String>,
}

/// Runtime settings derived from the CLI.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: ConfigSource,
    pub reboot_mode: RebootMode,
    pub connect_timeout: Duration,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            source: ConfigSource {
                path: cli.talosconfig.clone(),
                context: cli.context.clone().filter(|c| !c.is_empty()),
                endpoints: non_empty(&cli.endpoints),
                nodes: non_empty(&cli.nodes),
            },
            reboot_mode: cli.reboot_mode,
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
        }
    }
}

fn non_empty(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// Raw talosconfig file structure.
#[derive(Deserialize)]
pub struct TalosConfig {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub contexts: HashMap<String, ContextEntry>,
}

/// A single context entry in the talosconfig file.
#[derive(Deserialize, Clone)]
pub struct ContextEntry {
    #[serde(default)]
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<String>,
    pub ca: Option<String>,
    pub crt: Option<String>,
    pub key: Option<String>,
}

/// The selected context, ready for the client to connect with.
#[derive(Clone)]
pub struct ClusterContext {
    pub name: String,
    pub endpoints: Vec<String>,
    pub nodes: Vec<String>,
    /// CA certificate, PEM.
    pub ca: Vec<u8>,
    /// Client certificate, PEM.
    pub crt: Vec<u8>,
    /// Client private key, PEM.
    pub key: Vec<u8>,
}

impl std::fmt::Debug for ClusterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterContext")
            .field("name", &self.name)
            .field("endpoints", &self.endpoints)
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

/// Resolve the talosconfig path, read it, and select the active context.
pub fn load(source: &ConfigSource) -> Result<ClusterContext, ConfigError> {
    let path = match &source.path {
        Some(p) => expand_tilde(p),
        None => default_path()?,
    };
    let config = read_file(&path)?;
    resolve_context(config, source)
}

/// `~/.talos/config`.
fn default_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".talos").join("config"))
}

/// Expand a leading `~` to `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

fn read_file(path: &Path) -> Result<TalosConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve_context(
    mut config: TalosConfig,
    source: &ConfigSource,
) -> Result<ClusterContext, ConfigError> {
    let name = source
        .context
        .clone()
        .or_else(|| config.context.take().filter(|c| !c.is_empty()))
        .ok_or(ConfigError::NoContext)?;

    let entry = config
        .contexts
        .remove(&name)
        .ok_or_else(|| ConfigError::UnknownContext(name.clone()))?;

    let endpoints = if source.endpoints.is_empty() {
        entry.endpoints
    } else {
        source.endpoints.clone()
    };
    if endpoints.is_empty() {
        return Err(ConfigError::NoEndpoints(name));
    }

    let nodes = if source.nodes.is_empty() {
        entry.nodes
    } else {
        source.nodes.clone()
    };

    let ca = decode_pem(&name, "ca", entry.ca.as_deref())?;
    let crt = decode_pem(&name, "crt", entry.crt.as_deref())?;
    let key = decode_pem(&name, "key", entry.key.as_deref())?;

    Ok(ClusterContext {
        name,
        endpoints,
        nodes,
        ca,
        crt,
        key,
    })
}

fn decode_pem(
    context: &str,
    field: &'static str,
    value: Option<&str>,
) -> Result<Vec<u8>, ConfigError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential {
            context: context.to_string(),
            field,
        })?;
    STANDARD
        .decode(value)
        .map_err(|source| ConfigError::InvalidCredential {
            context: context.to_string(),
            field,
            source,
        })
}
