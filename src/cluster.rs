//! Cluster adapter: lazy connection plus the per-node RPC loop.
//!
//! [`ClusterAdapter`] starts [`ConnectionState::Disconnected`]. The first tool
//! call reads the talosconfig and connects; the resulting handle is kept for
//! the rest of the process. A failed connect attempt leaves the adapter
//! disconnected, so the next call tries again. A failed RPC does not touch
//! the connection state.
//!
//! Read operations walk the context's nodes in order, one RPC per node, and
//! stop at the first failing node: the caller gets either every node's
//! records or an error, never a partial list.

use tracing::{debug, info, warn};

use crate::client::{Connector, MachineApi};
use crate::config::{self, ClusterContext, ConfigSource, RebootMode};
use crate::error::Error;
use crate::proto::{self, NodeResponse};
use crate::records::{self, CpuRecord, DiskRecord, InterfaceRecord, MemoryRecord, NodeRecords};

/// Connection state of the adapter.
pub enum ConnectionState<A> {
    Disconnected,
    Connected { context: ClusterContext, api: A },
}

/// Lazily connected view of the cluster named by a talosconfig context.
pub struct ClusterAdapter<C: Connector> {
    source: ConfigSource,
    connector: C,
    reboot_mode: RebootMode,
    /// Context loaded by [`check_config`](Self::check_config), used by the
    /// next connect instead of reading the file again.
    preloaded: Option<ClusterContext>,
    state: ConnectionState<C::Api>,
}

impl<C: Connector> ClusterAdapter<C> {
    pub fn new(source: ConfigSource, connector: C, reboot_mode: RebootMode) -> Self {
        Self {
            source,
            connector,
            reboot_mode,
            preloaded: None,
            state: ConnectionState::Disconnected,
        }
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }

    /// Load the config eagerly without connecting. Used by diagnostic mode
    /// to fail fast on a bad talosconfig. The loaded context is kept for the
    /// first connect.
    pub fn check_config(&mut self) -> Result<&ClusterContext, Error> {
        let context = config::load(&self.source)?;
        Ok(&*self.preloaded.insert(context))
    }

    /// Return the live handle, connecting first if needed.
    async fn connected(&mut self) -> Result<(&ClusterContext, &C::Api), Error> {
        if let ConnectionState::Disconnected = self.state {
            let context = match self.preloaded.take() {
                Some(context) => context,
                None => config::load(&self.source)?,
            };
            if context.nodes.is_empty() {
                warn!(
                    "context '{}' lists no nodes; read tools will return empty results",
                    context.name
                );
            }
            let api = self.connector.connect(&context).await?;
            info!(
                "using context '{}' with {} node(s)",
                context.name,
                context.nodes.len()
            );
            self.state = ConnectionState::Connected { context, api };
        }

        match &self.state {
            ConnectionState::Connected { context, api } => Ok((context, api)),
            ConnectionState::Disconnected => unreachable!("state set above"),
        }
    }

    pub async fn list_disks(&mut self) -> Result<Vec<NodeRecords<DiskRecord>>, Error> {
        let (context, api) = self.connected().await?;
        let mut out = Vec::with_capacity(context.nodes.len());
        for node in &context.nodes {
            debug!("disks: querying {node}");
            let resp = api.disks(node).await;
            out.push(records::disks(node, checked("disks", node, resp)?));
        }
        Ok(out)
    }

    pub async fn list_network_interfaces(
        &mut self,
    ) -> Result<Vec<NodeRecords<InterfaceRecord>>, Error> {
        let (context, api) = self.connected().await?;
        let mut out = Vec::with_capacity(context.nodes.len());
        for node in &context.nodes {
            debug!("network device stats: querying {node}");
            let resp = api.network_device_stats(node).await;
            out.push(records::interfaces(
                node,
                checked("network device stats", node, resp)?,
            ));
        }
        Ok(out)
    }

    pub async fn list_memory(&mut self) -> Result<Vec<NodeRecords<MemoryRecord>>, Error> {
        let (context, api) = self.connected().await?;
        let mut out = Vec::with_capacity(context.nodes.len());
        for node in &context.nodes {
            debug!("memory: querying {node}");
            let resp = api.memory(node).await;
            out.push(records::memory(node, checked("memory", node, resp)?));
        }
        Ok(out)
    }

    pub async fn list_cpu(&mut self) -> Result<Vec<NodeRecords<CpuRecord>>, Error> {
        let (context, api) = self.connected().await?;
        let mut out = Vec::with_capacity(context.nodes.len());
        for node in &context.nodes {
            debug!("cpu info: querying {node}");
            let resp = api.cpu_info(node).await;
            out.push(records::cpus(node, checked("cpu info", node, resp)?));
        }
        Ok(out)
    }

    /// Reboot one node. An empty node name is rejected before connecting.
    pub async fn reboot(&mut self, node: &str) -> Result<(), Error> {
        let node = node.trim();
        if node.is_empty() {
            return Err(Error::InvalidInput("missing or invalid 'node' argument".into()));
        }
        let mode = self.reboot_mode.to_proto();
        let (_, api) = self.connected().await?;
        info!("rebooting node {node} (mode {mode:?})");
        let resp = api.reboot(node, mode).await;
        checked("reboot", node, resp)?;
        Ok(())
    }
}

/// Turn a transport status or a node-level metadata error into [`Error::Rpc`].
fn checked<R: NodeResponse>(
    operation: &'static str,
    node: &str,
    response: Result<R, tonic::Status>,
) -> Result<R, Error> {
    let response = response.map_err(|status| Error::rpc(operation, node, &status))?;
    if let Some(message) = proto::node_error(&response) {
        return Err(Error::Rpc {
            operation,
            node: node.to_string(),
            message: message.to_string(),
        });
    }
    Ok(response)
}
