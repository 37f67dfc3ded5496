use crate::messages::{
    mesh_packet, to_radio::PayloadVariant, Data, Heartbeat, MeshPacket, PortNum, ToRadio,
};

/// Destination address that reaches every node.
pub const BROADCAST_ADDR: u32 = 0xFFFF_FFFF;

/// Hop limit the firmware applies to locally originated packets.
pub const DEFAULT_HOP_LIMIT: u32 = 3;

/// Ask the radio to stream its configuration, tagged with `id`.
pub fn want_config(id: u32) -> ToRadio {
    ToRadio {
        payload_variant: Some(PayloadVariant::WantConfigId(id)),
    }
}

/// A UTF-8 text message to `to` (or [`BROADCAST_ADDR`]) on channel index `channel`.
///
/// `from` and the packet id are left zero; the radio fills them in. Direct
/// messages request an acknowledgement.
pub fn text_message(to: u32, channel: u32, text: &str) -> ToRadio {
    let data = Data {
        portnum: PortNum::TextMessageApp as i32,
        payload: text.as_bytes().to_vec(),
        ..Default::default()
    };
    let packet = MeshPacket {
        to,
        channel,
        payload_variant: Some(mesh_packet::PayloadVariant::Decoded(data)),
        hop_limit: DEFAULT_HOP_LIMIT,
        want_ack: to != BROADCAST_ADDR,
        ..Default::default()
    };
    ToRadio {
        payload_variant: Some(PayloadVariant::Packet(packet)),
    }
}

/// Keep-alive for links that time out idle clients.
pub fn heartbeat() -> ToRadio {
    ToRadio {
        payload_variant: Some(PayloadVariant::Heartbeat(Heartbeat {})),
    }
}

/// Tell the radio this client is going away.
pub fn disconnect() -> ToRadio {
    ToRadio {
        payload_variant: Some(PayloadVariant::Disconnect(true)),
    }
}
