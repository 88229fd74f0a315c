use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    #[serde(rename = "usuario")]
    Requester,
    #[serde(rename = "atendente")]
    Operator,
    /// Locally generated notices (join, end, remote termination). Never sent.
    #[serde(skip)]
    System,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Requester => write!(f, "usuario"),
            Sender::Operator => write!(f, "atendente"),
            Sender::System => write!(f, "sistema"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    WhatsApp,
    Web,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::WhatsApp => write!(f, "WhatsApp"),
            Origin::Web => write!(f, "Web"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    #[default]
    Document,
    Video,
    Audio,
}

impl MediaKind {
    /// Classifies a declared content type by its top-level type.
    pub fn from_content_type(content_type: &str) -> Self {
        let top = content_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match top.as_str() {
            "image" => MediaKind::Image,
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            _ => MediaKind::Document,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Document => "document",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "document" => Ok(MediaKind::Document),
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            _ => Err(format!("Unknown media kind: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub kind: MediaKind,
    pub file_name: Option<String>,
}

/// One transcript line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub body: String,
    pub origin: Option<Origin>,
    pub attachment: Option<Attachment>,
    pub received_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn from_operator(body: impl Into<String>) -> Self {
        Self {
            sender: Sender::Operator,
            body: body.into(),
            origin: None,
            attachment: None,
            received_at: Utc::now(),
        }
    }

    /// Synthetic notice, prefixed with the bell the console renders for them.
    pub fn system(text: &str) -> Self {
        Self {
            sender: Sender::System,
            body: format!("🔔 {}", text),
            origin: Some(Origin::Web),
            attachment: None,
            received_at: Utc::now(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn is_system(&self) -> bool {
        self.sender == Sender::System
    }
}

/// Flat `novaMensagem` / `enviarMensagem` payload as it travels on the channel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WireMessage {
    #[serde(rename = "sessao_id", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub sender: Sender,
    #[serde(rename = "mensagem", default)]
    pub body: String,
    #[serde(rename = "origem", default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(rename = "mediaUrl", default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(rename = "mediaType", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaKind>,
    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl From<WireMessage> for ChatMessage {
    fn from(wire: WireMessage) -> Self {
        let attachment = wire.media_url.map(|url| Attachment {
            url,
            kind: wire.media_type.unwrap_or_default(),
            file_name: wire.file_name,
        });
        Self {
            sender: wire.sender,
            body: wire.body,
            origin: wire.origin,
            attachment,
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_from_content_type() {
        assert_eq!(MediaKind::from_content_type("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_content_type("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_content_type("audio/ogg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_content_type("application/pdf"), MediaKind::Document);
        assert_eq!(MediaKind::from_content_type(""), MediaKind::Document);
    }

    #[test]
    fn inbound_wire_message_with_media() {
        let wire: WireMessage = serde_json::from_str(
            r#"{"sessao_id":"s-1","sender":"usuario","mensagem":"segue","origem":"whatsapp",
                "mediaUrl":"https://cdn/x.jpg","mediaType":"image","fileName":"x.jpg"}"#,
        )
        .unwrap();
        let msg = ChatMessage::from(wire);
        assert_eq!(msg.sender, Sender::Requester);
        assert_eq!(msg.origin, Some(Origin::WhatsApp));
        let att = msg.attachment.unwrap();
        assert_eq!(att.kind, MediaKind::Image);
        assert_eq!(att.file_name.as_deref(), Some("x.jpg"));
    }

    #[test]
    fn system_sender_is_not_accepted_from_the_wire() {
        let res: Result<WireMessage, _> =
            serde_json::from_str(r#"{"sender":"sistema","mensagem":"x"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn outgoing_wire_omits_absent_fields() {
        let wire = WireMessage {
            session_id: Some("s-1".into()),
            sender: Sender::Operator,
            body: "olá".into(),
            origin: None,
            media_url: None,
            media_type: None,
            file_name: None,
        };
        let v = serde_json::to_value(&wire).unwrap();
        assert_eq!(v, serde_json::json!({"sessao_id":"s-1","sender":"atendente","mensagem":"olá"}));
    }
}
