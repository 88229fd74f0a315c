use serde::{Deserialize, Deserializer, Serialize};

use crate::models::message::Origin;

/// Display name used when the queue entry carries no requester.
pub const UNKNOWN_REQUESTER: &str = "Não identificado";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Requester {
    #[serde(rename = "nome", default, deserialize_with = "null_as_empty")]
    pub name: String,
}

/// Missing and `null` both read as an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One entry of the `atendimentosAbertos` snapshot.
///
/// `number` is the requester's channel address (phone number for WhatsApp
/// sessions). It doubles as the protocol number shown to the operator and is
/// never interchangeable with `session_id`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    #[serde(rename = "sessao_id")]
    pub session_id: String,
    #[serde(rename = "numero", default, deserialize_with = "null_as_empty")]
    pub number: String,
    #[serde(rename = "setor", default, deserialize_with = "null_as_empty")]
    pub sector: String,
    #[serde(rename = "assunto", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "estudante", default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Requester>,
}

impl QueueEntry {
    /// Originating channel, taken from the subject line.
    pub fn origin(&self) -> Origin {
        match &self.subject {
            Some(subject) if subject.contains("WhatsApp") => Origin::WhatsApp,
            _ => Origin::Web,
        }
    }

    pub fn requester_name(&self) -> &str {
        self.requester
            .as_ref()
            .map(|r| r.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_REQUESTER)
    }

    /// First 12 characters of the session id, for list rendering.
    pub fn short_session_id(&self) -> &str {
        match self.session_id.char_indices().nth(12) {
            Some((idx, _)) => &self.session_id[..idx],
            None => &self.session_id,
        }
    }
}

/// The one session the operator has joined.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session_id: String,
    pub sector: String,
    pub protocol: String,
    /// Requester channel address captured from the queue at join time.
    pub number: String,
    pub origin: Origin,
}

impl ActiveSession {
    pub fn from_entry(entry: &QueueEntry) -> Self {
        Self {
            session_id: entry.session_id.clone(),
            sector: entry.sector.clone(),
            protocol: entry.number.clone(),
            number: entry.number.clone(),
            origin: entry.origin(),
        }
    }
}
