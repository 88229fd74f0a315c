// painel-core/src/console/state.rs
//
// Read-only view of the console, published after every handled input.

use painel_common::models::{ActiveSession, ChatMessage, ConnectionStatus, MediaKind, Operator, QueueEntry, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsolePhase {
    #[default]
    LoggedOut,
    Authenticating,
    Connecting,
    Idle,
    InSession,
    Disconnected,
    Error,
}

impl ConsolePhase {
    pub fn derive(logged_in: bool, authenticating: bool, status: &ConnectionStatus, in_session: bool) -> Self {
        if !logged_in {
            return if authenticating { ConsolePhase::Authenticating } else { ConsolePhase::LoggedOut };
        }
        match status {
            ConnectionStatus::Connecting => ConsolePhase::Connecting,
            ConnectionStatus::Connected if in_session => ConsolePhase::InSession,
            ConnectionStatus::Connected => ConsolePhase::Idle,
            ConnectionStatus::Disconnected => ConsolePhase::Disconnected,
            ConnectionStatus::Error(_) => ConsolePhase::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSummary {
    pub file_name: String,
    pub kind: MediaKind,
    pub size: usize,
    pub preview: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsoleSnapshot {
    pub phase: ConsolePhase,
    pub status: ConnectionStatus,
    pub operator: Option<Operator>,
    pub session: Option<Session>,
    pub has_token: bool,
    pub queue: Vec<QueueEntry>,
    pub active: Option<ActiveSession>,
    pub transcript: Vec<ChatMessage>,
    pub draft: String,
    pub pending: Option<PendingSummary>,
    pub uploading: bool,
    pub error_notice: Option<String>,
    pub success_notice: Option<String>,
    /// Session waiting for an end confirmation.
    pub confirm_end: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_derivation() {
        let connected = ConnectionStatus::Connected;
        assert_eq!(ConsolePhase::derive(false, false, &connected, false), ConsolePhase::LoggedOut);
        assert_eq!(ConsolePhase::derive(false, true, &connected, false), ConsolePhase::Authenticating);
        assert_eq!(ConsolePhase::derive(true, false, &ConnectionStatus::Connecting, false), ConsolePhase::Connecting);
        assert_eq!(ConsolePhase::derive(true, false, &connected, false), ConsolePhase::Idle);
        assert_eq!(ConsolePhase::derive(true, false, &connected, true), ConsolePhase::InSession);
        assert_eq!(
            ConsolePhase::derive(true, false, &ConnectionStatus::Error("x".into()), true),
            ConsolePhase::Error
        );
        assert_eq!(ConsolePhase::derive(true, false, &ConnectionStatus::Disconnected, true), ConsolePhase::Disconnected);
    }
}
