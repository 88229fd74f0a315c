// File: painel-common/src/models/mod.rs
pub mod auth;
pub mod connection;
pub mod message;
pub mod operator;
pub mod queue;

pub use auth::{Credentials, OAuthCallbackQuery, Role, Session, SessionUser};
pub use connection::ConnectionStatus;
pub use message::{Attachment, ChatMessage, MediaKind, Origin, Sender, WireMessage};
pub use operator::Operator;
pub use queue::{ActiveSession, QueueEntry, Requester};
