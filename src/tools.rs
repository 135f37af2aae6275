//! MCP tool definitions and handlers.
//!
//! Each tool is defined as a JSON schema (returned by [`tool_definitions`])
//! and handled by an async function dispatched from [`handle_tool_call`].
//!
//! ## Tools
//!
//! - `list_disks`, `list_network_interfaces`, `list_memory`, `list_cpu`:
//!   no arguments, one RPC per node of the active context
//! - `reboot_node`: one required `node` argument
//!
//! Every failure, from a bad talosconfig to a node-level RPC error, comes back
//! as an `isError` text result so the agent can read it and decide what to do.

use serde_json::{json, Value};
use tracing::warn;

use crate::client::Connector;
use crate::cluster::ClusterAdapter;
use crate::error::Error;
use crate::records::{self, NodeRecords, RecordKind};

/// Returns all tool definitions.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "list_disks",
            "description": "List all disks in the Talos cluster",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        }),
        json!({
            "name": "list_network_interfaces",
            "description": "List all network interfaces in the Talos cluster",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        }),
        json!({
            "name": "list_memory",
            "description": "List memory information for all nodes in the Talos cluster",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        }),
        json!({
            "name": "list_cpu",
            "description": "List CPU information for all nodes in the Talos cluster",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        }),
        json!({
            "name": "reboot_node",
            "description": "Reboot a specific node in the Talos cluster",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "node": {
                        "type": "string",
                        "description": "Node to reboot, by IP or hostname as known to the Talos API."
                    }
                },
                "required": ["node"],
                "additionalProperties": false
            }
        }),
    ]
}

/// Handle a tool call and return MCP content.
pub async fn handle_tool_call<C: Connector>(
    name: &str,
    args: &Value,
    cluster: &mut ClusterAdapter<C>,
) -> ToolResult {
    match name {
        "list_disks" => aggregate("list disks", cluster.list_disks().await),
        "list_network_interfaces" => aggregate(
            "list network interfaces",
            cluster.list_network_interfaces().await,
        ),
        "list_memory" => aggregate("list memory", cluster.list_memory().await),
        "list_cpu" => aggregate("list CPU info", cluster.list_cpu().await),
        "reboot_node" => handle_reboot_node(args, cluster).await,
        _ => ToolResult::error(format!("Unknown tool: {}", name)),
    }
}

/// Result of an MCP tool call, ready to be serialized into a JSON-RPC response.
#[derive(Debug)]
pub struct ToolResult {
    /// MCP content blocks (a single `{"type":"text","text":"..."}` entry).
    pub content: Vec<Value>,
    /// Whether the tool call failed (maps to `isError` in the MCP response).
    pub is_error: bool,
}

impl ToolResult {
    fn text(text: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error: false,
        }
    }

    fn error(message: String) -> Self {
        warn!("tool error: {message}");
        Self {
            content: vec![json!({ "type": "text", "text": message })],
            is_error: true,
        }
    }

    fn failed(action: &str, err: &Error) -> Self {
        Self::error(format!("failed to {action}: {err}"))
    }

    /// The text of the first content block.
    pub fn text_content(&self) -> &str {
        self.content
            .first()
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

fn aggregate<T: RecordKind>(
    action: &str,
    result: Result<Vec<NodeRecords<T>>, Error>,
) -> ToolResult {
    let groups = match result {
        Ok(g) => g,
        Err(e) => return ToolResult::failed(action, &e),
    };
    match records::to_pretty_json(&groups) {
        Ok(text) => ToolResult::text(text),
        Err(e) => ToolResult::failed(action, &Error::Serialization(e)),
    }
}

async fn handle_reboot_node<C: Connector>(
    args: &Value,
    cluster: &mut ClusterAdapter<C>,
) -> ToolResult {
    let node = match args.get("node").and_then(Value::as_str) {
        Some(n) if !n.trim().is_empty() => n.trim(),
        _ => return ToolResult::error("missing or invalid 'node' argument".into()),
    };

    match cluster.reboot(node).await {
        Ok(()) => ToolResult::text(format!("Node {} rebooted successfully", node)),
        Err(e) => ToolResult::failed("reboot node", &e),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::cluster::tests::{fake_connector, FakeConnector};
    use crate::config::tests::{sample_yaml, write_config};
    use crate::config::{ConfigSource, RebootMode};

    fn cluster_for(
        file: &tempfile::NamedTempFile,
        connector: FakeConnector,
    ) -> ClusterAdapter<FakeConnector> {
        let source = ConfigSource {
            path: Some(file.path().to_path_buf()),
            ..ConfigSource::default()
        };
        ClusterAdapter::new(source, connector, RebootMode::Powercycle)
    }

    #[test]
    fn five_tools_are_defined() {
        let names: Vec<_> = tool_definitions()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "list_disks",
                "list_network_interfaces",
                "list_memory",
                "list_cpu",
                "reboot_node"
            ]
        );
    }

    #[test]
    fn descriptions_are_fixed_strings() {
        let descriptions: Vec<_> = tool_definitions()
            .iter()
            .map(|t| t["description"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "List all disks in the Talos cluster",
                "List all network interfaces in the Talos cluster",
                "List memory information for all nodes in the Talos cluster",
                "List CPU information for all nodes in the Talos cluster",
                "Reboot a specific node in the Talos cluster"
            ]
        );
    }

    #[test]
    fn only_reboot_requires_node() {
        for tool in tool_definitions() {
            let required = tool["inputSchema"].get("required");
            if tool["name"] == "reboot_node" {
                assert_eq!(required, Some(&json!(["node"])));
                assert_eq!(tool["inputSchema"]["properties"]["node"]["type"], "string");
            } else {
                assert!(required.is_none());
            }
        }
    }

    #[tokio::test]
    async fn list_disks_returns_pretty_json() {
        let file = write_config(&sample_yaml());
        let mut cluster = cluster_for(&file, fake_connector());

        let result = handle_tool_call("list_disks", &json!({}), &mut cluster).await;
        assert!(!result.is_error);
        let parsed: Value = serde_json::from_str(result.text_content()).unwrap();
        assert_eq!(parsed[0]["node"], "10.0.0.2");
        assert_eq!(
            parsed[0]["disks"][0],
            json!({
                "device": "/dev/sda",
                "model": "X",
                "size": 1024,
                "type": "SSD",
                "uuid": "uuid-10.0.0.2"
            })
        );
    }

    #[tokio::test]
    async fn repeated_reads_are_byte_identical() {
        let file = write_config(&sample_yaml());
        let mut cluster = cluster_for(&file, fake_connector());

        for tool in ["list_disks", "list_network_interfaces", "list_memory", "list_cpu"] {
            let first = handle_tool_call(tool, &json!({}), &mut cluster).await;
            let second = handle_tool_call(tool, &json!({}), &mut cluster).await;
            assert!(!first.is_error, "{tool}: {}", first.text_content());
            assert_eq!(first.text_content(), second.text_content());
        }
    }

    #[tokio::test]
    async fn reboot_without_node_is_caller_error_and_sends_nothing() {
        let file = write_config(&sample_yaml());
        let connector = fake_connector();
        let calls = Rc::clone(&connector.api.calls);
        let mut cluster = cluster_for(&file, connector);

        for args in [json!({}), json!({ "node": "" }), json!({ "node": 7 })] {
            let result = handle_tool_call("reboot_node", &args, &mut cluster).await;
            assert!(result.is_error);
            assert_eq!(result.text_content(), "missing or invalid 'node' argument");
        }
        assert!(calls.rpcs.borrow().is_empty());
        assert_eq!(calls.connects.get(), 0);
    }

    #[tokio::test]
    async fn reboot_reports_success() {
        let file = write_config(&sample_yaml());
        let mut cluster = cluster_for(&file, fake_connector());
        let result =
            handle_tool_call("reboot_node", &json!({ "node": "10.0.0.3" }), &mut cluster).await;
        assert!(!result.is_error);
        assert_eq!(result.text_content(), "Node 10.0.0.3 rebooted successfully");
    }

    #[tokio::test]
    async fn rpc_failure_becomes_error_text() {
        let file = write_config(&sample_yaml());
        let mut connector = fake_connector();
        connector.api.failing.insert("10.0.0.3".into());
        let mut cluster = cluster_for(&file, connector);

        let result = handle_tool_call("list_cpu", &json!({}), &mut cluster).await;
        assert!(result.is_error);
        assert!(result.text_content().starts_with("failed to list CPU info: "));
        assert!(result.text_content().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn connection_failure_becomes_error_text() {
        let file = write_config(&sample_yaml());
        let mut connector = fake_connector();
        connector.refuse = true;
        let mut cluster = cluster_for(&file, connector);

        let result = handle_tool_call("list_memory", &json!({}), &mut cluster).await;
        assert!(result.is_error);
        assert!(result.text_content().contains("connection refused"));
    }

    #[tokio::test]
    async fn unknown_tool_is_error() {
        let file = write_config(&sample_yaml());
        let mut cluster = cluster_for(&file, fake_connector());
        let result = handle_tool_call("format_disk", &json!({}), &mut cluster).await;
        assert!(result.is_error);
        assert_eq!(result.text_content(), "Unknown tool: format_disk");
    }
}
