//! Error taxonomy shared by the config loader, the cluster adapter and the
//! tool dispatcher.
//!
//! Every variant ends up as text in an MCP tool result; nothing here is meant
//! to abort the process except in diagnostic mode.

use std::path::PathBuf;

/// Errors produced while serving a tool call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The talosconfig could not be read, parsed, or resolved to a context.
    #[error("talosconfig error: {0}")]
    Config(#[from] ConfigError),

    /// No endpoint of the active context accepted a connection.
    #[error("failed to connect to Talos API at {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// A single node's RPC failed (transport status or node-level error).
    #[error("{operation} failed for node {node}: {message}")]
    Rpc {
        operation: &'static str,
        node: String,
        message: String,
    },

    /// Missing or invalid tool argument; no RPC was attempted.
    #[error("{0}")]
    InvalidInput(String),

    /// The shaped result could not be encoded as JSON.
    #[error("failed to encode result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn rpc(operation: &'static str, node: &str, status: &tonic::Status) -> Self {
        Error::Rpc {
            operation,
            node: node.to_string(),
            message: format!("{} ({:?})", status.message(), status.code()),
        }
    }
}

/// Failures of the configuration loader.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("no context selected (set `context` in the file or pass --context)")]
    NoContext,

    #[error("context '{0}' not found")]
    UnknownContext(String),

    #[error("context '{0}' has no endpoints")]
    NoEndpoints(String),

    #[error("context '{context}' is missing `{field}`")]
    MissingCredential {
        context: String,
        field: &'static str,
    },

    #[error("context '{context}' has invalid base64 in `{field}`: {source}")]
    InvalidCredential {
        context: String,
        field: &'static str,
        source: base64::DecodeError,
    },

    #[error("HOME is not set; pass --talosconfig or set TALOSCONFIG")]
    NoHome,
}
