use std::fmt;
use std::str::FromStr;

use crate::messages::{from_radio::PayloadVariant, FromRadio};

/// Field-less tag of a [`FromRadio`] payload.
///
/// This is the key handlers subscribe on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    MyInfo,
    Metadata,
    NodeInfo,
    Channel,
    Config,
    ModuleConfig,
    ConfigCompleteId,
    Rebooted,
    Packet,
    LogRecord,
    QueueStatus,
    ProxyMessage,
    XmodemPacket,
    /// A variant this crate does not model, or an empty payload.
    Unknown,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [MessageKind; 14] = [
        MessageKind::MyInfo,
        MessageKind::Metadata,
        MessageKind::NodeInfo,
        MessageKind::Channel,
        MessageKind::Config,
        MessageKind::ModuleConfig,
        MessageKind::ConfigCompleteId,
        MessageKind::Rebooted,
        MessageKind::Packet,
        MessageKind::LogRecord,
        MessageKind::QueueStatus,
        MessageKind::ProxyMessage,
        MessageKind::XmodemPacket,
        MessageKind::Unknown,
    ];

    /// Stable kebab-case name, used in logs and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::MyInfo => "my-info",
            MessageKind::Metadata => "metadata",
            MessageKind::NodeInfo => "node-info",
            MessageKind::Channel => "channel",
            MessageKind::Config => "config",
            MessageKind::ModuleConfig => "module-config",
            MessageKind::ConfigCompleteId => "config-complete-id",
            MessageKind::Rebooted => "rebooted",
            MessageKind::Packet => "packet",
            MessageKind::LogRecord => "log-record",
            MessageKind::QueueStatus => "queue-status",
            MessageKind::ProxyMessage => "proxy-message",
            MessageKind::XmodemPacket => "xmodem-packet",
            MessageKind::Unknown => "unknown",
        }
    }

    /// True for the messages the radio streams in answer to a config request.
    pub fn is_config_stream(self) -> bool {
        matches!(
            self,
            MessageKind::MyInfo
                | MessageKind::Metadata
                | MessageKind::NodeInfo
                | MessageKind::Channel
                | MessageKind::Config
                | MessageKind::ModuleConfig
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no [`MessageKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message kind: {0}")]
pub struct ParseKindError(pub String);

impl FromStr for MessageKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

impl FromRadio {
    /// Kind of the carried payload.
    pub fn kind(&self) -> MessageKind {
        match &self.payload_variant {
            Some(PayloadVariant::Packet(_)) => MessageKind::Packet,
            Some(PayloadVariant::MyInfo(_)) => MessageKind::MyInfo,
            Some(PayloadVariant::NodeInfo(_)) => MessageKind::NodeInfo,
            Some(PayloadVariant::Config(_)) => MessageKind::Config,
            Some(PayloadVariant::LogRecord(_)) => MessageKind::LogRecord,
            Some(PayloadVariant::ConfigCompleteId(_)) => MessageKind::ConfigCompleteId,
            Some(PayloadVariant::Rebooted(_)) => MessageKind::Rebooted,
            Some(PayloadVariant::ModuleConfig(_)) => MessageKind::ModuleConfig,
            Some(PayloadVariant::Channel(_)) => MessageKind::Channel,
            Some(PayloadVariant::QueueStatus(_)) => MessageKind::QueueStatus,
            Some(PayloadVariant::XmodemPacket(_)) => MessageKind::XmodemPacket,
            Some(PayloadVariant::Metadata(_)) => MessageKind::Metadata,
            Some(PayloadVariant::MqttClientProxyMessage(_)) => MessageKind::ProxyMessage,
            None => MessageKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Channel, MyNodeInfo};

    #[test]
    fn kind_follows_payload_variant() {
        let msg = FromRadio {
            id: 1,
            payload_variant: Some(PayloadVariant::MyInfo(MyNodeInfo {
                my_node_num: 7,
                ..Default::default()
            })),
        };
        assert_eq!(msg.kind(), MessageKind::MyInfo);

        let msg = FromRadio {
            id: 2,
            payload_variant: Some(PayloadVariant::Channel(Channel::default())),
        };
        assert_eq!(msg.kind(), MessageKind::Channel);

        let msg = FromRadio {
            id: 3,
            payload_variant: Some(PayloadVariant::ConfigCompleteId(9)),
        };
        assert_eq!(msg.kind(), MessageKind::ConfigCompleteId);
    }

    #[test]
    fn empty_payload_is_unknown() {
        assert_eq!(FromRadio::default().kind(), MessageKind::Unknown);
    }

    #[test]
    fn names_parse_back() {
        for kind in MessageKind::ALL {
            assert_eq!(kind.as_str().parse::<MessageKind>().unwrap(), kind);
        }
        assert_eq!(
            "LOG_RECORD".parse::<MessageKind>().unwrap(),
            MessageKind::LogRecord
        );
        assert!("telemetry".parse::<MessageKind>().is_err());
    }

    #[test]
    fn config_stream_kinds() {
        assert!(MessageKind::NodeInfo.is_config_stream());
        assert!(MessageKind::ModuleConfig.is_config_stream());
        assert!(!MessageKind::ConfigCompleteId.is_config_stream());
        assert!(!MessageKind::Packet.is_config_stream());
    }
}
