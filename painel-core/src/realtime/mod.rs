// File: painel-core/src/realtime/mod.rs
//
// Real-time channel between the console and the attendance broker.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::console::input::ConsoleInput;

pub mod client;
pub mod events;
pub mod packet;

pub use client::{SocketIoConnector, SocketTarget};
pub use events::{ChannelEvent, HandshakeAuth, OperatorJoined, OutgoingEvent};

/// Requests from the console to a live channel task.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCommand {
    Emit(OutgoingEvent),
    Disconnect,
}

/// Delivers channel events into the console queue, tagged with the id of the
/// connection that produced them so superseded connections can be ignored.
#[derive(Clone)]
pub struct EventSink {
    connection_id: u64,
    tx: mpsc::UnboundedSender<ConsoleInput>,
}

impl EventSink {
    pub fn new(connection_id: u64, tx: mpsc::UnboundedSender<ConsoleInput>) -> Self {
        Self { connection_id, tx }
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Returns false once the console is gone.
    pub fn send(&self, event: ChannelEvent) -> bool {
        self.tx
            .send(ConsoleInput::Channel { connection_id: self.connection_id, event })
            .is_ok()
    }
}

/// Console-side handle of one connection. At most one is alive per console.
pub struct ChannelHandle {
    commands: mpsc::UnboundedSender<ChannelCommand>,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    pub fn new(commands: mpsc::UnboundedSender<ChannelCommand>, task: Option<JoinHandle<()>>) -> Self {
        Self { commands, task }
    }

    /// Fire-and-forget. Returns false if the channel task has already ended.
    pub fn emit(&self, event: OutgoingEvent) -> bool {
        debug!("emit => {}", event.name());
        self.commands.send(ChannelCommand::Emit(event)).is_ok()
    }

    /// Asks the task to leave the namespace and close the socket. The task
    /// finishes on its own; nothing waits for it.
    pub fn disconnect(mut self) {
        let _ = self.commands.send(ChannelCommand::Disconnect);
        self.task.take();
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Opens connections. The production implementation is [`SocketIoConnector`];
/// tests plug in their own.
pub trait RealtimeConnector: Send + Sync {
    fn connect(&self, auth: HandshakeAuth, sink: EventSink) -> ChannelHandle;
}
