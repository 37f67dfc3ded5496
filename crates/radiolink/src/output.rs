use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use radiolink_client::{Event, SessionSnapshot};
use radiolink_proto::{from_radio::PayloadVariant, mesh_packet, PortNum};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct SessionOutput {
    pub transport: String,
    pub config_id: u32,
    pub complete: bool,
    pub node_num: Option<u32>,
    pub firmware_version: Option<String>,
    pub nodes: usize,
    pub channels: usize,
    pub configs: usize,
    pub modules: usize,
}

impl SessionOutput {
    pub fn new(transport: &str, snap: &SessionSnapshot) -> Self {
        Self {
            transport: transport.to_string(),
            config_id: snap.config_id,
            complete: snap.complete,
            node_num: snap.node_info.as_ref().map(|info| info.my_node_num),
            firmware_version: snap
                .device_metadata
                .as_ref()
                .map(|meta| meta.firmware_version.clone()),
            nodes: snap.nodes.len(),
            channels: snap.channels.len(),
            configs: snap.configs.len(),
            modules: snap.modules.len(),
        }
    }
}

pub fn print_session(out: &SessionOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["transport".to_string(), out.transport.clone()])
                .add_row(vec!["config id".to_string(), format!("{:#010x}", out.config_id)])
                .add_row(vec!["node".to_string(), node_label(out.node_num)])
                .add_row(vec![
                    "firmware".to_string(),
                    out.firmware_version.clone().unwrap_or_else(|| "-".to_string()),
                ])
                .add_row(vec!["nodes".to_string(), out.nodes.to_string()])
                .add_row(vec!["channels".to_string(), out.channels.to_string()])
                .add_row(vec!["configs".to_string(), out.configs.to_string()])
                .add_row(vec!["modules".to_string(), out.modules.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Radio Info:");
            println!("  Transport:  {}", out.transport);
            println!("  Config id:  {:#010x}", out.config_id);
            println!("  Node:       {}", node_label(out.node_num));
            println!(
                "  Firmware:   {}",
                out.firmware_version.as_deref().unwrap_or("unknown")
            );
            println!(
                "  Database:   {} nodes, {} channels, {} config sections, {} module sections",
                out.nodes, out.channels, out.configs, out.modules
            );
        }
        OutputFormat::Raw => {
            println!("{}", node_label(out.node_num));
        }
    }
}

#[derive(Serialize)]
struct EventOutput<'a> {
    kind: &'a str,
    id: u32,
    summary: String,
    timestamp: String,
}

pub fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EventOutput {
                kind: event.kind.as_str(),
                id: event.id,
                summary: summarize(event),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "ID", "SUMMARY"])
                .add_row(vec![
                    event.kind.to_string(),
                    event.id.to_string(),
                    summarize(event),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} id={} {}", event.kind, event.id, summarize(event));
        }
        OutputFormat::Raw => match text_payload(event) {
            Some(bytes) => {
                let mut out = std::io::stdout();
                let _ = out.write_all(bytes);
                let _ = out.write_all(b"\n");
                let _ = out.flush();
            }
            None => println!("{}", event.kind),
        },
    }
}

pub fn node_label(num: Option<u32>) -> String {
    match num {
        Some(num) => format!("!{num:08x}"),
        None => "unknown".to_string(),
    }
}

/// One-line description of an event; not a full decode.
fn summarize(event: &Event) -> String {
    match &event.message.payload_variant {
        Some(PayloadVariant::Packet(packet)) => {
            let body = match &packet.payload_variant {
                Some(mesh_packet::PayloadVariant::Decoded(data)) => {
                    match PortNum::try_from(data.portnum) {
                        Ok(PortNum::TextMessageApp) => {
                            format!("text={:?}", String::from_utf8_lossy(&data.payload))
                        }
                        Ok(port) => format!("port={port:?} size={}", data.payload.len()),
                        Err(_) => format!("port={} size={}", data.portnum, data.payload.len()),
                    }
                }
                Some(mesh_packet::PayloadVariant::Encrypted(bytes)) => {
                    format!("encrypted size={}", bytes.len())
                }
                None => "empty".to_string(),
            };
            format!(
                "from={} to={} channel={} {body}",
                node_label(Some(packet.from)),
                node_label(Some(packet.to)),
                packet.channel
            )
        }
        Some(PayloadVariant::NodeInfo(node)) => {
            let name = node.user.as_ref().map_or("", |user| user.long_name.as_str());
            format!("node={} name={name:?}", node_label(Some(node.num)))
        }
        Some(PayloadVariant::LogRecord(record)) => {
            format!("source={} {}", record.source, record.message)
        }
        Some(PayloadVariant::QueueStatus(status)) => {
            format!("free={} max={}", status.free, status.maxlen)
        }
        Some(PayloadVariant::Channel(channel)) => {
            let name = channel
                .settings
                .as_ref()
                .map_or("", |settings| settings.name.as_str());
            format!("index={} name={name:?}", channel.index)
        }
        Some(PayloadVariant::MyInfo(info)) => {
            format!("node={}", node_label(Some(info.my_node_num)))
        }
        Some(PayloadVariant::Metadata(meta)) => format!("firmware={}", meta.firmware_version),
        _ => String::new(),
    }
}

fn text_payload(event: &Event) -> Option<&[u8]> {
    match &event.message.payload_variant {
        Some(PayloadVariant::Packet(packet)) => match &packet.payload_variant {
            Some(mesh_packet::PayloadVariant::Decoded(data))
                if data.portnum == PortNum::TextMessageApp as i32 =>
            {
                Some(data.payload.as_slice())
            }
            _ => None,
        },
        _ => None,
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use radiolink_proto::{FromRadio, MeshPacket};

    use super::*;

    fn text_event(text: &str) -> Event {
        let data = radiolink_proto::Data {
            portnum: PortNum::TextMessageApp as i32,
            payload: text.as_bytes().to_vec(),
            ..Default::default()
        };
        Event::new(Arc::new(FromRadio {
            id: 4,
            payload_variant: Some(PayloadVariant::Packet(MeshPacket {
                from: 0x10,
                to: 0xFFFF_FFFF,
                payload_variant: Some(mesh_packet::PayloadVariant::Decoded(data)),
                ..Default::default()
            })),
        }))
    }

    #[test]
    fn node_labels_are_bang_hex() {
        assert_eq!(node_label(Some(0xDEAD_BEEF)), "!deadbeef");
        assert_eq!(node_label(Some(1)), "!00000001");
        assert_eq!(node_label(None), "unknown");
    }

    #[test]
    fn text_packet_summary() {
        let summary = summarize(&text_event("hi"));
        assert_eq!(summary, "from=!00000010 to=!ffffffff channel=0 text=\"hi\"");
    }

    #[test]
    fn raw_payload_only_for_text() {
        assert_eq!(text_payload(&text_event("hi")), Some(&b"hi"[..]));
        let other = Event::new(Arc::new(FromRadio {
            id: 1,
            payload_variant: Some(PayloadVariant::Rebooted(true)),
        }));
        assert!(text_payload(&other).is_none());
    }

    #[test]
    fn session_output_from_snapshot() {
        let snap = SessionSnapshot {
            config_id: 7,
            complete: true,
            nodes: vec![Default::default(); 3],
            ..Default::default()
        };
        let out = SessionOutput::new("tcp", &snap);
        assert_eq!(out.nodes, 3);
        assert!(out.node_num.is_none());
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"config_id\":7"));
    }
}
