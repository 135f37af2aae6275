//! Talos machine API messages used by talos-mcp.
//!
//! Only the messages of `machine.proto`, `storage.proto` and `common.proto`
//! that the five tools touch are declared here, with the upstream field tags.
//! `MemInfo` and `CpuInfo` are passed through to the caller as-is, so they
//! carry every upstream field. The disk and interface messages declare only
//! what the records read; prost skips the rest on decode.

use serde::Serialize;

/// `common.Metadata`, attached by apid to every per-node message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
    #[prost(string, tag = "1")]
    pub hostname: String,
    /// Set when the proxied call to this node failed.
    #[prost(string, tag = "2")]
    pub error: String,
}

/// Per-node messages carry a [`Metadata`] block.
pub trait NodeMessage {
    fn metadata(&self) -> Option<&Metadata>;
}

/// Multi-node responses wrap one message per node.
pub trait NodeResponse {
    type Message: NodeMessage;
    fn messages(&self) -> &[Self::Message];
}

macro_rules! node_message {
    ($($msg:ty => $resp:ty),* $(,)?) => {
        $(
            impl NodeMessage for $msg {
                fn metadata(&self) -> Option<&Metadata> {
                    self.metadata.as_ref()
                }
            }

            impl NodeResponse for $resp {
                type Message = $msg;
                fn messages(&self) -> &[$msg] {
                    &self.messages
                }
            }
        )*
    };
}

node_message! {
    Disks => DisksResponse,
    NetworkDeviceStats => NetworkDeviceStatsResponse,
    Memory => MemoryResponse,
    CpusInfo => CpuInfoResponse,
    Reboot => RebootResponse,
}

// --- storage.StorageService/Disks ---

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisksResponse {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Disks>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Disks {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<Metadata>,
    #[prost(message, repeated, tag = "2")]
    pub disks: Vec<Disk>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Disk {
    #[prost(uint64, tag = "1")]
    pub size: u64,
    #[prost(string, tag = "2")]
    pub model: String,
    #[prost(string, tag = "3")]
    pub device_name: String,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, tag = "5")]
    pub serial: String,
    #[prost(string, tag = "7")]
    pub uuid: String,
    #[prost(string, tag = "8")]
    pub wwid: String,
    #[prost(enumeration = "DiskType", tag = "9")]
    pub r#type: i32,
    #[prost(bool, tag = "11")]
    pub system_disk: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DiskType {
    Unknown = 0,
    Ssd = 1,
    Hdd = 2,
    Nvme = 3,
    Sd = 4,
    Cd = 5,
}

impl DiskType {
    /// The upstream enum value name, e.g. `SSD`.
    pub fn as_str_name(self) -> &'static str {
        match self {
            DiskType::Unknown => "UNKNOWN",
            DiskType::Ssd => "SSD",
            DiskType::Hdd => "HDD",
            DiskType::Nvme => "NVME",
            DiskType::Sd => "SD",
            DiskType::Cd => "CD",
        }
    }
}

// --- machine.MachineService/NetworkDeviceStats ---

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NetworkDeviceStatsResponse {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<NetworkDeviceStats>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NetworkDeviceStats {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<Metadata>,
    #[prost(message, optional, tag = "2")]
    pub total: Option<NetDev>,
    #[prost(message, repeated, tag = "3")]
    pub devices: Vec<NetDev>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NetDev {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint64, tag = "2")]
    pub rx_bytes: u64,
    #[prost(uint64, tag = "3")]
    pub rx_packets: u64,
    #[prost(uint64, tag = "4")]
    pub rx_errors: u64,
    #[prost(uint64, tag = "10")]
    pub tx_bytes: u64,
    #[prost(uint64, tag = "11")]
    pub tx_packets: u64,
    #[prost(uint64, tag = "12")]
    pub tx_errors: u64,
}

// --- machine.MachineService/Memory ---

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MemoryResponse {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Memory>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Memory {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<Metadata>,
    #[prost(message, optional, tag = "2")]
    pub meminfo: Option<MemInfo>,
}

/// `/proc/meminfo` as reported by the node, values in kB.
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MemInfo {
    #[prost(uint64, tag = "1")]
    pub memtotal: u64,
    #[prost(uint64, tag = "2")]
    pub memfree: u64,
    #[prost(uint64, tag = "3")]
    pub memavailable: u64,
    #[prost(uint64, tag = "4")]
    pub buffers: u64,
    #[prost(uint64, tag = "5")]
    pub cached: u64,
    #[prost(uint64, tag = "6")]
    pub swapcached: u64,
    #[prost(uint64, tag = "7")]
    pub active: u64,
    #[prost(uint64, tag = "8")]
    pub inactive: u64,
    #[prost(uint64, tag = "9")]
    pub activeanon: u64,
    #[prost(uint64, tag = "10")]
    pub inactiveanon: u64,
    #[prost(uint64, tag = "11")]
    pub activefile: u64,
    #[prost(uint64, tag = "12")]
    pub inactivefile: u64,
    #[prost(uint64, tag = "13")]
    pub unevictable: u64,
    #[prost(uint64, tag = "14")]
    pub mlocked: u64,
    #[prost(uint64, tag = "15")]
    pub swaptotal: u64,
    #[prost(uint64, tag = "16")]
    pub swapfree: u64,
    #[prost(uint64, tag = "17")]
    pub dirty: u64,
    #[prost(uint64, tag = "18")]
    pub writeback: u64,
    #[prost(uint64, tag = "19")]
    pub anonpages: u64,
    #[prost(uint64, tag = "20")]
    pub mapped: u64,
    #[prost(uint64, tag = "21")]
    pub shmem: u64,
    #[prost(uint64, tag = "22")]
    pub slab: u64,
    #[prost(uint64, tag = "23")]
    pub sreclaimable: u64,
    #[prost(uint64, tag = "24")]
    pub sunreclaim: u64,
    #[prost(uint64, tag = "25")]
    pub kernelstack: u64,
    #[prost(uint64, tag = "26")]
    pub pagetables: u64,
    #[prost(uint64, tag = "27")]
    pub nfsunstable: u64,
    #[prost(uint64, tag = "28")]
    pub bounce: u64,
    #[prost(uint64, tag = "29")]
    pub writebacktmp: u64,
    #[prost(uint64, tag = "30")]
    pub commitlimit: u64,
    #[prost(uint64, tag = "31")]
    pub committedas: u64,
    #[prost(uint64, tag = "32")]
    pub vmalloctotal: u64,
    #[prost(uint64, tag = "33")]
    pub vmallocused: u64,
    #[prost(uint64, tag = "34")]
    pub vmallocchunk: u64,
    #[prost(uint64, tag = "35")]
    pub hardwarecorrupted: u64,
    #[prost(uint64, tag = "36")]
    pub anonhugepages: u64,
    #[prost(uint64, tag = "37")]
    pub shmemhugepages: u64,
    #[prost(uint64, tag = "38")]
    pub shmempmdmapped: u64,
    #[prost(uint64, tag = "39")]
    pub cmatotal: u64,
    #[prost(uint64, tag = "40")]
    pub cmafree: u64,
    #[prost(uint64, tag = "41")]
    pub hugepagestotal: u64,
    #[prost(uint64, tag = "42")]
    pub hugepagesfree: u64,
    #[prost(uint64, tag = "43")]
    pub hugepagesrsvd: u64,
    #[prost(uint64, tag = "44")]
    pub hugepagessurp: u64,
    #[prost(uint64, tag = "45")]
    pub hugepagesize: u64,
    #[prost(uint64, tag = "46")]
    pub directmap4k: u64,
    #[prost(uint64, tag = "47")]
    pub directmap2m: u64,
    #[prost(uint64, tag = "48")]
    pub directmap1g: u64,
}

// --- machine.MachineService/CPUInfo ---

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CpuInfoResponse {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<CpusInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CpusInfo {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<Metadata>,
    #[prost(message, repeated, tag = "2")]
    pub cpu_info: Vec<CpuInfo>,
}

/// One `/proc/cpuinfo` processor entry.
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct CpuInfo {
    #[prost(uint32, tag = "1")]
    pub processor: u32,
    #[prost(string, tag = "2")]
    pub vendor_id: String,
    #[prost(string, tag = "3")]
    pub cpu_family: String,
    #[prost(string, tag = "4")]
    pub model: String,
    #[prost(string, tag = "5")]
    pub model_name: String,
    #[prost(string, tag = "6")]
    pub stepping: String,
    #[prost(string, tag = "7")]
    pub microcode: String,
    #[prost(double, tag = "8")]
    pub cpu_mhz: f64,
    #[prost(string, tag = "9")]
    pub cache_size: String,
    #[prost(string, tag = "10")]
    pub physical_id: String,
    #[prost(uint32, tag = "11")]
    pub siblings: u32,
    #[prost(string, tag = "12")]
    pub core_id: String,
    #[prost(uint32, tag = "13")]
    pub cpu_cores: u32,
    #[prost(string, tag = "14")]
    pub apic_id: String,
    #[prost(string, tag = "15")]
    pub initial_apic_id: String,
    #[prost(string, tag = "16")]
    pub fpu: String,
    #[prost(string, tag = "17")]
    pub fpu_exception: String,
    #[prost(uint32, tag = "18")]
    pub cpu_id_level: u32,
    #[prost(string, tag = "19")]
    pub wp: String,
    #[prost(string, repeated, tag = "20")]
    pub flags: Vec<String>,
    #[prost(string, repeated, tag = "21")]
    pub bugs: Vec<String>,
    #[prost(double, tag = "22")]
    pub bogo_mips: f64,
    #[prost(uint32, tag = "23")]
    pub cl_flush_size: u32,
    #[prost(uint32, tag = "24")]
    pub cache_alignment: u32,
    #[prost(string, tag = "25")]
    pub address_sizes: String,
    #[prost(string, tag = "26")]
    pub power_management: String,
}

// --- machine.MachineService/Reboot ---

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RebootRequest {
    #[prost(enumeration = "RebootMode", tag = "1")]
    pub mode: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RebootMode {
    Default = 0,
    Powercycle = 1,
    Force = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RebootResponse {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Reboot>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Reboot {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<Metadata>,
    #[prost(string, tag = "2")]
    pub actor_id: String,
}

/// First node-level error reported in a response, if any.
pub fn node_error<R: NodeResponse>(response: &R) -> Option<&str> {
    response
        .messages()
        .iter()
        .filter_map(NodeMessage::metadata)
        .map(|m| m.error.as_str())
        .find(|e| !e.is_empty())
}
