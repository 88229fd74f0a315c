// File: painel-tui/src/commands/mod.rs

use std::sync::Arc;

use painel_core::ConsoleHandle;

use crate::help;
use crate::tui_module::TuiModule;

mod attachment;
mod auth;
mod session;

pub use auth::parse_callback_query;
pub use session::resolve_session;

/// Runs one command line. Returns `(quit_requested, output)`.
pub fn dispatch(
    line: &str,
    console: &ConsoleHandle,
    tui_module: &Arc<TuiModule>,
) -> (bool, Option<String>) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return (false, None);
    }
    let cmd = parts[0].to_lowercase();
    let args = &parts[1..];

    let outcome = match cmd.as_str() {
        "help" => {
            let subcmd = args.first().copied().unwrap_or("");
            Ok(Some(help::show_command_help(subcmd)))
        }

        "login" => auth::handle_login(args, console),
        "token" => auth::handle_token(args, console),
        "callback" => auth::handle_callback(args, console),
        "logout" => console.logout().map(|_| None),

        "status" => Ok(Some(session::status_text(&console.snapshot()))),
        "queue" => session::handle_queue(console),
        "join" => session::handle_join(args, console),
        "say" => session::handle_say(line_tail(line), console),
        "end" => console.request_end().map(|_| None),
        "chat" => {
            tui_module.set_chat_mode(true);
            Ok(Some("Modo conversa. Digite /quit para sair.".to_string()))
        }

        "draft" | "caption" => attachment::handle_draft(line_tail(line), console),
        "attach" => attachment::handle_attach(line_tail(line), console),
        "sendfile" => console.send_attachment().map(|_| None),
        "cancel" => console.cancel_attachment().map(|_| None),

        "quit" | "exit" => {
            return (true, Some("Encerrando o painel...".to_string()));
        }

        _ => Ok(Some(format!("Comando desconhecido '{}'. Digite 'help' para ajuda.", cmd))),
    };

    match outcome {
        Ok(output) => (false, output),
        Err(e) => (false, Some(format!("Erro: {}", e))),
    }
}

/// Everything after the command word, with inner spacing kept.
fn line_tail(line: &str) -> &str {
    let line = line.trim_start();
    match line.find(char::is_whitespace) {
        Some(idx) => line[idx..].trim(),
        None => "",
    }
}
