// painel-tui/src/tui_module.rs
//
// Line-mode state of the terminal: command mode, chat mode, and the yes/no
// answer to an end-of-session confirmation.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    Mutex,
    MutexGuard,
};

use painel_core::ConsoleHandle;
use painel_core::console::state::ConsoleSnapshot;

/// Chat mode: plain lines are sent to the active session.
#[derive(Debug, Default)]
pub struct ChatState {
    pub is_in_chat_mode: bool,
}

pub struct TuiModule {
    shutdown_flag: Arc<AtomicBool>,
    pub chat_state: Arc<Mutex<ChatState>>,
}

impl Default for TuiModule {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiModule {
    pub fn new() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            chat_state: Arc::new(Mutex::new(ChatState::default())),
        }
    }

    fn chat(&self) -> MutexGuard<'_, ChatState> {
        self.chat_state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn is_in_chat_mode(&self) -> bool {
        self.chat().is_in_chat_mode
    }

    pub fn set_chat_mode(&self, on: bool) {
        self.chat().is_in_chat_mode = on;
    }

    /// Called when chat mode is enabled. Returns `true` if the line was consumed.
    pub fn handle_chat_line(&self, line: &str, console: &ConsoleHandle) -> bool {
        if line.eq_ignore_ascii_case("/quit") {
            self.set_chat_mode(false);
            println!("Saiu do modo conversa.");
            return true;
        }

        let result = if let Some(path) = line.strip_prefix("/file ") {
            console.select_file(path.trim())
        } else if let Some(text) = line
            .strip_prefix("/caption")
            .filter(|rest| rest.is_empty() || rest.starts_with(' '))
        {
            // staged only; /send uses it as the file caption
            console.set_draft(text.trim())
        } else if line.eq_ignore_ascii_case("/send") {
            console.send_attachment()
        } else if line.eq_ignore_ascii_case("/cancel") {
            console.cancel_attachment()
        } else if line.eq_ignore_ascii_case("/end") {
            console.request_end()
        } else {
            console
                .set_draft(line)
                .and_then(|_| console.send_message())
        };

        if let Err(e) = result {
            eprintln!("Erro: {}", e);
        }
        true
    }

    /// While the console waits for an end confirmation, the next line is the
    /// answer. Returns `true` if the line was consumed.
    pub fn handle_confirmation_line(&self, line: &str, console: &ConsoleHandle) -> bool {
        if console.snapshot().confirm_end.is_none() {
            return false;
        }
        if let Err(e) = console.confirm_end(is_affirmative(line)) {
            eprintln!("Erro: {}", e);
        }
        true
    }

    pub fn prompt_string(&self, snapshot: &ConsoleSnapshot) -> String {
        if snapshot.confirm_end.is_some() {
            return "(s/N)> ".to_string();
        }
        if self.is_in_chat_mode() {
            return match &snapshot.active {
                Some(active) => format!("{}> ", active.protocol),
                None => "chat> ".to_string(),
            };
        }
        "painel> ".to_string()
    }

    pub fn stop_tui(&self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }
}

/// `s`, `sim`, `y` and `yes` confirm; anything else (including empty) declines.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "s" | "sim" | "y" | "yes")
}
