// File: painel-core/src/realtime/events.rs
//
// Named events of the attendance namespace, typed on both directions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use painel_common::models::{MediaKind, QueueEntry, Sender, WireMessage};

pub const EVT_LIST_SESSIONS: &str = "listarAtendimentos";
pub const EVT_QUEUE_SNAPSHOT: &str = "atendimentosAbertos";
pub const EVT_JOIN_SESSION: &str = "entrarAtendimento";
pub const EVT_SEND_MESSAGE: &str = "enviarMensagem";
pub const EVT_END_SESSION: &str = "encerrarAtendimento";
pub const EVT_NEW_MESSAGE: &str = "novaMensagem";
pub const EVT_OPERATOR_JOINED: &str = "atendenteEntrou";
pub const EVT_SESSION_ENDED: &str = "atendimentoEncerrado";

/// Auth metadata sent with the namespace connect packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeAuth {
    pub token: String,
    #[serde(rename = "atendenteId")]
    pub operator_id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "setor")]
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperatorJoined {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "setor", default)]
    pub sector: String,
}

/// What the channel reports to the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Namespace handshake accepted.
    Connected,
    /// Transport dropped after having been connected.
    Disconnected { reason: String },
    /// Transport failure or namespace refusal before/while connecting.
    ConnectError { message: String },
    QueueSnapshot(Vec<QueueEntry>),
    NewMessage(WireMessage),
    OperatorJoined(OperatorJoined),
    SessionEnded { session_id: Option<String> },
}

impl ChannelEvent {
    /// Maps a decoded socket.io event. Unknown or malformed events yield `None`.
    pub fn from_named(name: &str, args: &[Value]) -> Option<Self> {
        let first = args.first().cloned().unwrap_or(Value::Null);
        match name {
            EVT_QUEUE_SNAPSHOT => match serde_json::from_value::<Vec<QueueEntry>>(first) {
                Ok(entries) => Some(ChannelEvent::QueueSnapshot(entries)),
                Err(e) => {
                    warn!("bad {} payload: {}", name, e);
                    None
                }
            },
            EVT_NEW_MESSAGE => match serde_json::from_value::<WireMessage>(first) {
                Ok(msg) => Some(ChannelEvent::NewMessage(msg)),
                Err(e) => {
                    warn!("bad {} payload: {}", name, e);
                    None
                }
            },
            EVT_OPERATOR_JOINED => match serde_json::from_value::<OperatorJoined>(first) {
                Ok(joined) => Some(ChannelEvent::OperatorJoined(joined)),
                Err(e) => {
                    warn!("bad {} payload: {}", name, e);
                    None
                }
            },
            EVT_SESSION_ENDED => {
                let session_id = first
                    .get("sessao_id")
                    .and_then(|v| v.as_str())
                    .map(String::from);
                Some(ChannelEvent::SessionEnded { session_id })
            }
            _ => None,
        }
    }
}

/// What the console emits.
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingEvent {
    ListSessions,
    JoinSession {
        session_id: String,
        name: String,
        sector: String,
        operator_id: String,
    },
    SendMessage(WireMessage),
    EndSession { session_id: String },
}

impl OutgoingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutgoingEvent::ListSessions => EVT_LIST_SESSIONS,
            OutgoingEvent::JoinSession { .. } => EVT_JOIN_SESSION,
            OutgoingEvent::SendMessage(_) => EVT_SEND_MESSAGE,
            OutgoingEvent::EndSession { .. } => EVT_END_SESSION,
        }
    }

    pub fn args(&self) -> Vec<Value> {
        match self {
            OutgoingEvent::ListSessions => vec![],
            OutgoingEvent::JoinSession { session_id, name, sector, operator_id } => vec![json!({
                "sessao_id": session_id,
                "nome": name,
                "setor": sector,
                "atendenteId": operator_id,
            })],
            OutgoingEvent::SendMessage(msg) => {
                vec![serde_json::to_value(msg).unwrap_or(Value::Null)]
            }
            OutgoingEvent::EndSession { session_id } => vec![json!({ "sessao_id": session_id })],
        }
    }

    /// Operator text message for the given session.
    pub fn operator_text(session_id: &str, body: &str) -> Self {
        OutgoingEvent::SendMessage(WireMessage {
            session_id: Some(session_id.to_string()),
            sender: Sender::Operator,
            body: body.to_string(),
            origin: None,
            media_url: None,
            media_type: None,
            file_name: None,
        })
    }

    /// Operator media message announcing an uploaded file.
    pub fn operator_media(
        session_id: &str,
        body: &str,
        media_url: &str,
        kind: MediaKind,
        file_name: &str,
    ) -> Self {
        OutgoingEvent::SendMessage(WireMessage {
            session_id: Some(session_id.to_string()),
            sender: Sender::Operator,
            body: body.to_string(),
            origin: None,
            media_url: Some(media_url.to_string()),
            media_type: Some(kind),
            file_name: Some(file_name.to_string()),
        })
    }
}
