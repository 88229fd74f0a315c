// painel-core/src/console/notices.rs
//
// Two transient banners, one per kind. Showing a notice replaces the text and
// re-arms the slot's expiry timer; a stale expiry is recognized by its
// generation and ignored.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::tasks::spawn_deadline_task;

use super::input::ConsoleInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Error,
    Success,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Error => write!(f, "error"),
            NoticeKind::Success => write!(f, "success"),
        }
    }
}

#[derive(Default)]
struct Slot {
    text: Option<String>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Slot {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Default)]
pub struct Notices {
    error: Slot,
    success: Slot,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: NoticeKind) -> &Slot {
        match kind {
            NoticeKind::Error => &self.error,
            NoticeKind::Success => &self.success,
        }
    }

    fn slot_mut(&mut self, kind: NoticeKind) -> &mut Slot {
        match kind {
            NoticeKind::Error => &mut self.error,
            NoticeKind::Success => &mut self.success,
        }
    }

    pub fn get(&self, kind: NoticeKind) -> Option<&str> {
        self.slot(kind).text.as_deref()
    }

    /// Sets the banner and schedules its expiry `ttl` from now.
    pub fn show(&mut self, kind: NoticeKind, text: String, ttl: Duration, tx: &UnboundedSender<ConsoleInput>) {
        let slot = self.slot_mut(kind);
        slot.cancel_timer();
        slot.generation += 1;
        slot.text = Some(text);
        slot.timer = Some(spawn_deadline_task(
            Instant::now() + ttl,
            tx.clone(),
            ConsoleInput::NoticeExpired { kind, generation: slot.generation },
        ));
    }

    /// Returns true if the banner was actually cleared.
    pub fn expire(&mut self, kind: NoticeKind, generation: u64) -> bool {
        let slot = self.slot_mut(kind);
        if slot.generation != generation || slot.text.is_none() {
            return false;
        }
        slot.text = None;
        slot.timer = None;
        true
    }

    pub fn clear_all(&mut self) {
        for kind in [NoticeKind::Error, NoticeKind::Success] {
            let slot = self.slot_mut(kind);
            slot.cancel_timer();
            slot.text = None;
        }
    }
}
