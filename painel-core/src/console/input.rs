// painel-core/src/console/input.rs
//
// Everything the console actor reacts to arrives as one of these, through a
// single unbounded queue, and is handled in arrival order.

use std::path::PathBuf;

use painel_common::models::{Credentials, OAuthCallbackQuery};

use crate::api::MediaReceipt;
use crate::realtime::ChannelEvent;
use crate::Error;

use super::attachment::PendingAttachment;
use super::notices::NoticeKind;

/// Operator intents.
#[derive(Debug)]
pub enum OperatorCommand {
    Login(Credentials),
    LoginWithToken(String),
    OAuthCallback(OAuthCallbackQuery),
    Restore,
    Logout,
    RefreshQueue,
    EnterSession(String),
    SetDraft(String),
    SendMessage,
    SelectFile(PathBuf),
    StageAttachment(PendingAttachment),
    CancelAttachment,
    SendAttachment,
    RequestEnd,
    ConfirmEnd(bool),
    Notify { kind: NoticeKind, text: String },
    Shutdown,
}

#[derive(Debug)]
pub enum ConsoleInput {
    Command(OperatorCommand),
    /// Tagged with the connection that produced it.
    Channel { connection_id: u64, event: ChannelEvent },
    QueueRefreshDue,
    NoticeExpired { kind: NoticeKind, generation: u64 },
    SessionCloseDue { session_id: String },
    UploadFinished { upload_id: u64, result: Result<MediaReceipt, Error> },
}

impl From<OperatorCommand> for ConsoleInput {
    fn from(cmd: OperatorCommand) -> Self {
        ConsoleInput::Command(cmd)
    }
}
