//! src/realtime/packet.rs
//!
//! Engine.IO v4 / Socket.IO v5 text framing.
//!
//! A WebSocket text frame carries one Engine.IO packet: a single digit type
//! followed by its data. Engine "message" packets (`4`) carry one Socket.IO
//! packet: a type digit, an optional `/namespace,`, an optional numeric ack id
//! and a JSON payload.

use serde::Deserialize;
use serde_json::Value;

use crate::Error;

/// Payload of the Engine.IO open packet (`0{...}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    #[serde(rename = "pingInterval")]
    pub ping_interval: u64,
    /// Milliseconds the server waits for our pong.
    #[serde(rename = "pingTimeout")]
    pub ping_timeout: u64,
    #[serde(rename = "maxPayload", default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(text: &str) -> Result<Self, Error> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty engine packet".into()))?;
        let data = chars.as_str();
        match kind {
            '0' => {
                let open: OpenHandshake = serde_json::from_str(data)
                    .map_err(|e| Error::Protocol(format!("bad open packet: {}", e)))?;
                Ok(EnginePacket::Open(open))
            }
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(data.to_string())),
            '3' => Ok(EnginePacket::Pong(data.to_string())),
            '4' => Ok(EnginePacket::Message(data.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(Error::Protocol(format!("unknown engine packet type '{}'", other))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            // Only servers send open packets; encoding one is for tests.
            EnginePacket::Open(open) => format!(
                "0{{\"sid\":\"{}\",\"upgrades\":[],\"pingInterval\":{},\"pingTimeout\":{}}}",
                open.sid, open.ping_interval, open.ping_timeout
            ),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect { namespace: String, data: Option<Value> },
    Disconnect { namespace: String },
    Event { namespace: String, id: Option<u64>, name: String, args: Vec<Value> },
    Ack { namespace: String, id: u64, args: Vec<Value> },
    ConnectError { namespace: String, data: Option<Value> },
}

impl SocketPacket {
    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    pub fn decode(text: &str) -> Result<Self, Error> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty socket packet".into()))?;
        if kind == '5' || kind == '6' {
            return Err(Error::Protocol("binary socket.io packets are not supported".into()));
        }
        let mut rest = chars.as_str();

        // 1) namespace
        let mut namespace = "/".to_string();
        if rest.starts_with('/') {
            match rest.find(',') {
                Some(idx) => {
                    namespace = rest[..idx].to_string();
                    rest = &rest[idx + 1..];
                }
                None => {
                    namespace = rest.to_string();
                    rest = "";
                }
            }
        }

        // 2) ack id
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let id = if digits > 0 {
            let parsed = rest[..digits]
                .parse::<u64>()
                .map_err(|e| Error::Protocol(format!("bad ack id: {}", e)))?;
            rest = &rest[digits..];
            Some(parsed)
        } else {
            None
        };

        // 3) payload
        let payload: Option<Value> = if rest.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(rest)
                    .map_err(|e| Error::Protocol(format!("bad socket payload: {}", e)))?,
            )
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data: payload }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = match payload {
                    Some(Value::Array(items)) if !items.is_empty() => items,
                    _ => return Err(Error::Protocol("event payload must be a non-empty array".into())),
                };
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => return Err(Error::Protocol(format!("event name must be a string, got {}", other))),
                };
                Ok(SocketPacket::Event { namespace, id, name, args })
            }
            '3' => {
                let id = id.ok_or_else(|| Error::Protocol("ack without id".into()))?;
                let args = match payload {
                    Some(Value::Array(items)) => items,
                    Some(other) => vec![other],
                    None => vec![],
                };
                Ok(SocketPacket::Ack { namespace, id, args })
            }
            '4' => Ok(SocketPacket::ConnectError { namespace, data: payload }),
            other => Err(Error::Protocol(format!("unknown socket packet type '{}'", other))),
        }
    }

    pub fn encode(&self) -> String {
        fn ns_prefix(namespace: &str) -> String {
            if namespace == "/" || namespace.is_empty() {
                String::new()
            } else {
                format!("{},", namespace)
            }
        }

        match self {
            SocketPacket::Connect { namespace, data } => {
                let body = data.as_ref().map(Value::to_string).unwrap_or_default();
                format!("0{}{}", ns_prefix(namespace), body)
            }
            SocketPacket::Disconnect { namespace } => format!("1{}", ns_prefix(namespace)),
            SocketPacket::Event { namespace, id, name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                format!(
                    "2{}{}{}",
                    ns_prefix(namespace),
                    id.map(|i| i.to_string()).unwrap_or_default(),
                    Value::Array(items)
                )
            }
            SocketPacket::Ack { namespace, id, args } => {
                format!("3{}{}{}", ns_prefix(namespace), id, Value::Array(args.clone()))
            }
            SocketPacket::ConnectError { namespace, data } => {
                let body = data.as_ref().map(Value::to_string).unwrap_or_default();
                format!("4{}{}", ns_prefix(namespace), body)
            }
        }
    }

    /// Wraps the packet into the engine message frame text.
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}
