//! Text codec for Engine.IO v4 packets and the Socket.IO packets they carry.
//!
//! Only the text encoding is handled; binary attachments are decoded as far as
//! their header and otherwise ignored.

use anyhow::{bail, Context};
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Handshake data (`sid`, `pingInterval`, ...).
    Open(Value),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
    BinaryEvent,
    BinaryAck,
}

impl SocketKind {
    fn from_digit(c: char) -> Option<Self> {
        let kind = match c {
            '0' => Self::Connect,
            '1' => Self::Disconnect,
            '2' => Self::Event,
            '3' => Self::Ack,
            '4' => Self::ConnectError,
            '5' => Self::BinaryEvent,
            '6' => Self::BinaryAck,
            _ => return None,
        };
        Some(kind)
    }

    fn digit(self) -> char {
        match self {
            Self::Connect => '0',
            Self::Disconnect => '1',
            Self::Event => '2',
            Self::Ack => '3',
            Self::ConnectError => '4',
            Self::BinaryEvent => '5',
            Self::BinaryAck => '6',
        }
    }

    fn is_binary(self) -> bool {
        matches!(self, Self::BinaryEvent | Self::BinaryAck)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    pub kind: SocketKind,
    pub namespace: String,
    pub ack_id: Option<u64>,
    pub data: Option<Value>,
}

impl SocketPacket {
    pub fn connect() -> Self {
        Self::bare(SocketKind::Connect)
    }

    pub fn disconnect() -> Self {
        Self::bare(SocketKind::Disconnect)
    }

    fn bare(kind: SocketKind) -> Self {
        Self {
            kind,
            namespace: DEFAULT_NAMESPACE.to_string(),
            ack_id: None,
            data: None,
        }
    }

    /// Name of an event packet, i.e. the first element of its data array.
    pub fn event_name(&self) -> Option<&str> {
        if !matches!(self.kind, SocketKind::Event | SocketKind::BinaryEvent) {
            return None;
        }
        self.data.as_ref()?.as_array()?.first()?.as_str()
    }

    fn encode_into(&self, out: &mut String) {
        out.push(self.kind.digit());
        if self.namespace != DEFAULT_NAMESPACE {
            out.push_str(&self.namespace);
            out.push(',');
        }
        if let Some(id) = self.ack_id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = &self.data {
            out.push_str(&data.to_string());
        }
    }

    fn decode(raw: &str) -> anyhow::Result<Self> {
        let mut chars = raw.chars();
        let Some(kind) = chars.next().and_then(SocketKind::from_digit) else {
            bail!("unknown socket.io packet type in {raw:?}");
        };
        let mut rest = chars.as_str();

        if kind.is_binary() {
            let Some((count, tail)) = rest.split_once('-') else {
                bail!("binary packet without attachment count: {raw:?}");
            };
            count
                .parse::<u32>()
                .with_context(|| format!("bad attachment count in {raw:?}"))?;
            rest = tail;
        }

        let mut namespace = DEFAULT_NAMESPACE.to_string();
        if rest.starts_with('/') {
            match rest.split_once(',') {
                Some((ns, tail)) => {
                    namespace = ns.to_string();
                    rest = tail;
                }
                None => {
                    namespace = rest.to_string();
                    rest = "";
                }
            }
        }

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let ack_id = if digits > 0 {
            let id = rest[..digits]
                .parse()
                .with_context(|| format!("bad ack id in {raw:?}"))?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest).with_context(|| format!("bad payload in {raw:?}"))?)
        };

        Ok(Self {
            kind,
            namespace,
            ack_id,
            data,
        })
    }
}

impl EnginePacket {
    pub fn decode(raw: &str) -> anyhow::Result<Self> {
        let mut chars = raw.chars();
        let Some(kind) = chars.next() else {
            bail!("empty engine.io packet");
        };
        let rest = chars.as_str();

        let packet = match kind {
            '0' => Self::Open(
                serde_json::from_str(rest).with_context(|| format!("bad open packet {raw:?}"))?,
            ),
            '1' => Self::Close,
            '2' => Self::Ping(rest.to_string()),
            '3' => Self::Pong(rest.to_string()),
            '4' => Self::Message(SocketPacket::decode(rest)?),
            '5' => Self::Upgrade,
            '6' => Self::Noop,
            _ => bail!("unknown engine.io packet type in {raw:?}"),
        };
        Ok(packet)
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Open(data) => {
                out.push('0');
                out.push_str(&data.to_string());
            }
            Self::Close => out.push('1'),
            Self::Ping(data) => {
                out.push('2');
                out.push_str(data);
            }
            Self::Pong(data) => {
                out.push('3');
                out.push_str(data);
            }
            Self::Message(packet) => {
                out.push('4');
                packet.encode_into(&mut out);
            }
            Self::Upgrade => out.push('5'),
            Self::Noop => out.push('6'),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_handshake() {
        let open = EnginePacket::decode(
            r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .unwrap();
        let EnginePacket::Open(data) = open else {
            panic!("expected open packet");
        };
        assert_eq!(data["pingInterval"], 25000);

        let connected = EnginePacket::decode(r#"40{"sid":"wZX3oN0bSVIhsaknAAAI"}"#).unwrap();
        assert_eq!(
            connected,
            EnginePacket::Message(SocketPacket {
                kind: SocketKind::Connect,
                namespace: "/".to_string(),
                ack_id: None,
                data: Some(json!({"sid": "wZX3oN0bSVIhsaknAAAI"})),
            })
        );
    }

    #[test]
    fn test_decode_ping_and_events() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::decode("1").unwrap(), EnginePacket::Close);

        let EnginePacket::Message(bare) = EnginePacket::decode(r#"42["dishUpdated"]"#).unwrap()
        else {
            panic!("expected message");
        };
        assert_eq!(bare.event_name(), Some("dishUpdated"));

        let EnginePacket::Message(full) =
            EnginePacket::decode(r#"42/admin,13["dishUpdated",{"_id":"1"}]"#).unwrap()
        else {
            panic!("expected message");
        };
        assert_eq!(full.namespace, "/admin");
        assert_eq!(full.ack_id, Some(13));
        assert_eq!(full.event_name(), Some("dishUpdated"));

        let EnginePacket::Message(binary) =
            EnginePacket::decode(r#"451-["dishUpdated",{"_placeholder":true,"num":0}]"#).unwrap()
        else {
            panic!("expected message");
        };
        assert_eq!(binary.kind, SocketKind::BinaryEvent);
        assert_eq!(binary.event_name(), Some("dishUpdated"));
    }

    #[test]
    fn test_connect_error_is_not_an_event() {
        let EnginePacket::Message(packet) =
            EnginePacket::decode(r#"44{"message":"Not authorized"}"#).unwrap()
        else {
            panic!("expected message");
        };
        assert_eq!(packet.kind, SocketKind::ConnectError);
        assert_eq!(packet.event_name(), None);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(EnginePacket::decode("").is_err());
        assert!(EnginePacket::decode("9").is_err());
        assert!(EnginePacket::decode("49").is_err());
        assert!(EnginePacket::decode("42[not json").is_err());
    }

    #[test]
    fn test_encode_client_packets() {
        assert_eq!(EnginePacket::Message(SocketPacket::connect()).encode(), "40");
        assert_eq!(EnginePacket::Message(SocketPacket::disconnect()).encode(), "41");
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
        assert_eq!(EnginePacket::Pong("probe".to_string()).encode(), "3probe");
    }
}
