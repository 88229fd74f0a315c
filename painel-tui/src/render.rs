// painel-tui/src/render.rs
//
// Prints console events as they arrive on the event bus.

use std::sync::Arc;

use colored::Colorize;
use tokio::task::JoinHandle;
use tracing::info;

use painel_common::models::{ChatMessage, MediaKind, QueueEntry, Sender};
use painel_core::console::NoticeKind;
use painel_core::eventbus::{ConsoleEvent, EventBus};

pub const CONFIRM_END_PROMPT: &str = "Deseja realmente encerrar este atendimento? (s/N)";

/// Keeps what is needed to avoid repeating the queue every refresh tick.
#[derive(Debug, Default)]
pub struct Renderer {
    last_queue: Option<Vec<QueueEntry>>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to print for `event`, or `None` if nothing visible changed.
    pub fn render(&mut self, event: &ConsoleEvent) -> Option<String> {
        match event {
            ConsoleEvent::StatusChanged(status) => Some(format!("[conexão] {}", status)),
            ConsoleEvent::LoggedIn(op) => Some(
                format!("Bem-vindo(a), {} ({})", op.name, op.sector())
                    .green()
                    .to_string(),
            ),
            ConsoleEvent::LoggedOut => {
                self.last_queue = None;
                Some("Sessão finalizada.".to_string())
            }
            ConsoleEvent::QueueUpdated(queue) => {
                if self.last_queue.as_ref() == Some(queue) {
                    return None;
                }
                self.last_queue = Some(queue.clone());
                Some(format_queue(queue))
            }
            ConsoleEvent::SessionEntered(active) => Some(
                format!(
                    "Atendimento {} | setor {} | origem {}",
                    active.protocol, active.sector, active.origin
                )
                .bold()
                .to_string(),
            ),
            ConsoleEvent::SessionClosed { .. } => Some("Atendimento fechado.".dimmed().to_string()),
            ConsoleEvent::MessageAppended(msg) => Some(format_message(msg)),
            ConsoleEvent::Notice { kind, text: Some(text) } => Some(match kind {
                NoticeKind::Error => format!("✗ {}", text).red().bold().to_string(),
                NoticeKind::Success => format!("✓ {}", text).green().bold().to_string(),
            }),
            ConsoleEvent::Notice { text: None, .. } => None,
            ConsoleEvent::AttachmentStaged { file_name, kind, size } => Some(format!(
                "Arquivo selecionado: {} {} ({} bytes). Use 'sendfile' para enviar.",
                kind_icon(*kind),
                file_name,
                size
            )),
            ConsoleEvent::AttachmentCleared => None,
            ConsoleEvent::UploadBusy(true) => Some("Enviando arquivo...".dimmed().to_string()),
            ConsoleEvent::UploadBusy(false) => None,
            ConsoleEvent::ConfirmEndRequested { .. } => Some(CONFIRM_END_PROMPT.yellow().to_string()),
        }
    }
}

pub fn format_queue(queue: &[QueueEntry]) -> String {
    if queue.is_empty() {
        return "Nenhum atendimento aberto.".to_string();
    }
    let mut out = format!("Atendimentos abertos ({}):", queue.len());
    for (idx, entry) in queue.iter().enumerate() {
        out.push_str(&format!(
            "\n  {:>2}. [{}] {} | {} | setor {} | {}",
            idx + 1,
            entry.short_session_id(),
            entry.requester_name(),
            entry.number,
            entry.sector,
            entry.subject.as_deref().unwrap_or("-"),
        ));
    }
    out
}

pub fn format_message(msg: &ChatMessage) -> String {
    let time = msg
        .received_at
        .with_timezone(&chrono::Local)
        .format("%H:%M");
    let mut body = msg.body.clone();
    if let Some(att) = &msg.attachment {
        let name = att.file_name.as_deref().unwrap_or("arquivo");
        let line = format!("{} {} <{}>", kind_icon(att.kind), name, att.url);
        body = if body.is_empty() { line } else { format!("{}\n        {}", line, body) };
    }
    match msg.sender {
        Sender::System => format!("{} {}", time, body).yellow().to_string(),
        Sender::Operator => format!("{} {} {}", time, "Você:".cyan().bold(), body),
        Sender::Requester => {
            let origin = msg
                .origin
                .map(|o| format!(" ({})", o))
                .unwrap_or_default();
            format!("{} {} {}", time, format!("Solicitante{}:", origin).magenta().bold(), body)
        }
    }
}

fn kind_icon(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "[imagem]",
        MediaKind::Video => "[vídeo]",
        MediaKind::Audio => "[áudio]",
        MediaKind::Document => "[documento]",
    }
}

/// Subscribes to the bus and prints until the bus shuts down.
pub async fn spawn_renderer(bus: Arc<EventBus>) -> JoinHandle<()> {
    let mut rx = bus.subscribe(None).await;
    let mut shutdown_rx = bus.shutdown_rx.clone();
    tokio::spawn(async move {
        let mut renderer = Renderer::new();
        loop {
            tokio::select! {
                maybe = rx.recv() => {
                    match maybe {
                        Some(event) => {
                            if let Some(text) = renderer.render(&event) {
                                println!("{}", text);
                            }
                        }
                        None => break,
                    }
                }
                Ok(_) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("renderer stopping");
                        break;
                    }
                }
            }
        }
    })
}
