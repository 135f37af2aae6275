//! Typed tool output and the shaping of raw RPC responses into it.
//!
//! Each read tool returns `Vec<NodeRecords<T>>`: one entry per target node, in
//! the order the nodes were queried, holding that node's records under a
//! per-kind key (`disks`, `interfaces`, `memory`, `cpu`). A node whose response
//! carries no records still appears, with an empty list.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::proto;

/// Records of one kind collected from one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecords<T> {
    pub node: String,
    pub records: Vec<T>,
}

/// Serializes as `{ "node": ..., "<kind>": [...] }`, node first.
impl<T: RecordKind> Serialize for NodeRecords<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("node", &self.node)?;
        map.serialize_entry(T::KEY, &self.records)?;
        map.end()
    }
}

/// A record kind knows the JSON key its list is reported under.
pub trait RecordKind: Serialize {
    const KEY: &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskRecord {
    pub device: String,
    pub model: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub uuid: String,
}

impl RecordKind for DiskRecord {
    const KEY: &'static str = "disks";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceRecord {
    pub name: String,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
}

impl RecordKind for InterfaceRecord {
    const KEY: &'static str = "interfaces";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    pub meminfo: Option<proto::MemInfo>,
}

impl RecordKind for MemoryRecord {
    const KEY: &'static str = "memory";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuRecord {
    pub cpu: Vec<proto::CpuInfo>,
}

impl RecordKind for CpuRecord {
    const KEY: &'static str = "cpu";
}

pub fn disks(node: &str, response: proto::DisksResponse) -> NodeRecords<DiskRecord> {
    let records = response
        .messages
        .into_iter()
        .flat_map(|m| m.disks)
        .map(|d| {
            let kind = proto::DiskType::try_from(d.r#type).unwrap_or(proto::DiskType::Unknown);
            DiskRecord {
                device: d.device_name,
                model: d.model,
                size: d.size,
                kind: kind.as_str_name().to_string(),
                uuid: d.uuid,
            }
        })
        .collect();
    NodeRecords {
        node: node.to_string(),
        records,
    }
}

pub fn interfaces(
    node: &str,
    response: proto::NetworkDeviceStatsResponse,
) -> NodeRecords<InterfaceRecord> {
    let records = response
        .messages
        .into_iter()
        .flat_map(|m| m.devices)
        .map(|dev| InterfaceRecord {
            name: dev.name,
            tx_bytes: dev.tx_bytes,
            rx_bytes: dev.rx_bytes,
        })
        .collect();
    NodeRecords {
        node: node.to_string(),
        records,
    }
}

pub fn memory(node: &str, response: proto::MemoryResponse) -> NodeRecords<MemoryRecord> {
    let records = response
        .messages
        .into_iter()
        .map(|m| MemoryRecord { meminfo: m.meminfo })
        .collect();
    NodeRecords {
        node: node.to_string(),
        records,
    }
}

pub fn cpus(node: &str, response: proto::CpuInfoResponse) -> NodeRecords<CpuRecord> {
    let records = response
        .messages
        .into_iter()
        .map(|m| CpuRecord { cpu: m.cpu_info })
        .collect();
    NodeRecords {
        node: node.to_string(),
        records,
    }
}

/// Encode an aggregate as two-space indented JSON.
pub fn to_pretty_json<T: RecordKind>(
    aggregate: &[NodeRecords<T>],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use serde_json::{json, Value};

    fn disk(device: &str, size: u64, kind: proto::DiskType, uuid: &str) -> proto::Disk {
        proto::Disk {
            size,
            model: "X".into(),
            device_name: device.into(),
            r#type: kind as i32,
            uuid: uuid.into(),
            ..Default::default()
        }
    }

    #[test]
    fn disk_fields_are_renamed() {
        let resp = proto::DisksResponse {
            messages: vec![proto::Disks {
                metadata: None,
                disks: vec![disk("/dev/sda", 1024, proto::DiskType::Ssd, "abc")],
            }],
        };
        let shaped = disks("10.0.0.2", resp);
        assert_eq!(
            shaped.records,
            vec![DiskRecord {
                device: "/dev/sda".into(),
                model: "X".into(),
                size: 1024,
                kind: "SSD".into(),
                uuid: "abc".into(),
            }]
        );
    }

    #[test]
    fn unknown_disk_type_value_maps_to_unknown() {
        let mut d = disk("/dev/sdb", 1, proto::DiskType::Hdd, "");
        d.r#type = 99;
        let resp = proto::DisksResponse {
            messages: vec![proto::Disks {
                metadata: None,
                disks: vec![d],
            }],
        };
        assert_eq!(disks("n", resp).records[0].kind, "UNKNOWN");
    }

    #[test]
    fn empty_response_keeps_node_entry() {
        let shaped = vec![interfaces("n1", proto::NetworkDeviceStatsResponse::default())];
        let text = to_pretty_json(&shaped).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!([{ "node": "n1", "interfaces": [] }]));
    }

    #[test]
    fn disk_record_survives_serialization_verbatim() {
        let resp = proto::DisksResponse {
            messages: vec![proto::Disks {
                metadata: None,
                disks: vec![disk("/dev/sda", 1024, proto::DiskType::Ssd, "abc")],
            }],
        };
        let text = to_pretty_json(&[disks("10.0.0.2", resp)]).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            json!([{
                "node": "10.0.0.2",
                "disks": [{
                    "device": "/dev/sda",
                    "model": "X",
                    "size": 1024,
                    "type": "SSD",
                    "uuid": "abc"
                }]
            }])
        );
        assert!(text.contains("\n  {\n    \"node\": \"10.0.0.2\""));
    }

    #[test]
    fn interfaces_flatten_across_messages() {
        let dev = |name: &str, tx, rx| proto::NetDev {
            name: name.into(),
            tx_bytes: tx,
            rx_bytes: rx,
            ..Default::default()
        };
        let resp = proto::NetworkDeviceStatsResponse {
            messages: vec![proto::NetworkDeviceStats {
                metadata: None,
                total: Some(dev("total", 99, 99)),
                devices: vec![dev("eth0", 10, 20), dev("lo", 1, 1)],
            }],
        };
        let shaped = interfaces("n", resp);
        let names: Vec<_> = shaped.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["eth0", "lo"]);
        assert_eq!(shaped.records[0].tx_bytes, 10);
        assert_eq!(shaped.records[0].rx_bytes, 20);
    }

    #[test]
    fn memory_and_cpu_pass_through_under_labeled_key() {
        let mem = proto::MemoryResponse {
            messages: vec![proto::Memory {
                metadata: None,
                meminfo: Some(proto::MemInfo {
                    memtotal: 2048,
                    memfree: 512,
                    ..Default::default()
                }),
            }],
        };
        let text = to_pretty_json(&[memory("n", mem)]).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["memory"][0]["meminfo"]["memtotal"], 2048);
        assert_eq!(parsed[0]["memory"][0]["meminfo"]["memfree"], 512);

        let cpu = proto::CpuInfoResponse {
            messages: vec![proto::CpusInfo {
                metadata: None,
                cpu_info: vec![proto::CpuInfo {
                    processor: 0,
                    model_name: "EPYC".into(),
                    cpu_mhz: 2400.5,
                    ..Default::default()
                }],
            }],
        };
        let text = to_pretty_json(&[cpus("n", cpu)]).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["cpu"][0]["cpu"][0]["model_name"], "EPYC");
        assert_eq!(parsed[0]["cpu"][0]["cpu"][0]["cpu_mhz"], 2400.5);
    }

    /// Length-delimited field with a one-byte key.
    fn wrap(tag: u8, inner: &[u8]) -> Vec<u8> {
        let mut out = vec![(tag << 3) | 2, inner.len() as u8];
        out.extend_from_slice(inner);
        out
    }

    #[test]
    fn decoded_meminfo_keeps_every_field() {
        // memtotal (1) = 2048, activeanon (9) = 77, hugepagestotal (41) = 5
        let meminfo = [0x08, 0x80, 0x10, 0x48, 0x4d, 0xc8, 0x02, 0x05];
        let bytes = wrap(1, &wrap(2, &meminfo));
        let resp = proto::MemoryResponse::decode(&bytes[..]).unwrap();

        let text = to_pretty_json(&[memory("n", resp)]).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        let out = &parsed[0]["memory"][0]["meminfo"];
        assert_eq!(out["memtotal"], 2048);
        assert_eq!(out["activeanon"], 77);
        assert_eq!(out["hugepagestotal"], 5);
        assert_eq!(out["directmap1g"], 0);
    }

    #[test]
    fn decoded_cpuinfo_keeps_every_field() {
        let mut cpu = vec![0xaa, 0x01, 0x08];
        cpu.extend_from_slice(b"meltdown"); // bugs (21)
        cpu.extend_from_slice(&[0xb8, 0x01, 0x40]); // cl_flush_size (23) = 64
        cpu.extend_from_slice(&[0xd2, 0x01, 0x02, b't', b's']); // power_management (26)
        let bytes = wrap(1, &wrap(2, &cpu));
        let resp = proto::CpuInfoResponse::decode(&bytes[..]).unwrap();

        let text = to_pretty_json(&[cpus("n", resp)]).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        let out = &parsed[0]["cpu"][0]["cpu"][0];
        assert_eq!(out["bugs"], json!(["meltdown"]));
        assert_eq!(out["cl_flush_size"], 64);
        assert_eq!(out["power_management"], "ts");
        assert_eq!(out["apic_id"], "");
    }

    #[test]
    fn nodes_keep_call_order() {
        let shaped = vec![
            memory("b", proto::MemoryResponse::default()),
            memory("a", proto::MemoryResponse::default()),
        ];
        let parsed: Value = serde_json::from_str(&to_pretty_json(&shaped).unwrap()).unwrap();
        assert_eq!(parsed[0]["node"], "b");
        assert_eq!(parsed[1]["node"], "a");
    }
}
