use painel_common::models::QueueEntry;
use painel_core::console::state::ConsoleSnapshot;
use painel_core::{ConsoleHandle, Error};

use crate::render;

pub fn handle_queue(console: &ConsoleHandle) -> Result<Option<String>, Error> {
    console.refresh_queue()?;
    Ok(Some(render::format_queue(&console.snapshot().queue)))
}

pub fn handle_join(args: &[&str], console: &ConsoleHandle) -> Result<Option<String>, Error> {
    let Some(arg) = args.first() else {
        return Ok(Some("Uso: join <n|sessao_id>".to_string()));
    };
    let snapshot = console.snapshot();
    match resolve_session(arg, &snapshot.queue) {
        Some(session_id) => {
            console.enter_session(session_id)?;
            Ok(None)
        }
        None => Ok(Some(format!("Atendimento '{}' não está na fila.", arg))),
    }
}

pub fn handle_say(text: &str, console: &ConsoleHandle) -> Result<Option<String>, Error> {
    if text.is_empty() {
        return Ok(Some("Uso: say <texto>".to_string()));
    }
    console.set_draft(text)?;
    console.send_message()?;
    Ok(None)
}

/// `n` is the 1-based position in the queue listing; anything else is matched
/// against session ids, exactly or by the prefix shown in the listing.
pub fn resolve_session(arg: &str, queue: &[QueueEntry]) -> Option<String> {
    if let Ok(n) = arg.parse::<usize>() {
        if n >= 1 && n <= queue.len() {
            return Some(queue[n - 1].session_id.clone());
        }
    }
    if let Some(entry) = queue.iter().find(|e| e.session_id == arg) {
        return Some(entry.session_id.clone());
    }
    let mut matches = queue.iter().filter(|e| e.session_id.starts_with(arg));
    match (matches.next(), matches.next()) {
        (Some(entry), None) => Some(entry.session_id.clone()),
        _ => None,
    }
}

pub fn status_text(snapshot: &ConsoleSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!("Conexão: {}\n", snapshot.status));
    match &snapshot.operator {
        Some(op) => out.push_str(&format!("Atendente: {} <{}> ({})\n", op.name, op.email, op.sector())),
        None => out.push_str("Atendente: (não autenticado)\n"),
    }
    match &snapshot.active {
        Some(active) => out.push_str(&format!(
            "Atendimento: {} | setor {} | {} | {} mensagens\n",
            active.protocol,
            active.sector,
            active.origin,
            snapshot.transcript.len()
        )),
        None => out.push_str("Atendimento: nenhum\n"),
    }
    out.push_str(&format!("Fila: {} aberto(s)\n", snapshot.queue.len()));
    if let Some(pending) = &snapshot.pending {
        out.push_str(&format!(
            "Arquivo pendente: {} ({}, {} bytes){}\n",
            pending.file_name,
            pending.kind,
            pending.size,
            if snapshot.uploading { " enviando..." } else { "" }
        ));
    }
    if let Some(err) = &snapshot.error_notice {
        out.push_str(&format!("Erro: {}\n", err));
    }
    if let Some(ok) = &snapshot.success_notice {
        out.push_str(&format!("Aviso: {}\n", ok));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use painel_common::models::Operator;

    fn entry(sid: &str) -> QueueEntry {
        QueueEntry {
            session_id: sid.to_string(),
            number: "5585".to_string(),
            sector: "TI".to_string(),
            subject: None,
            requester: None,
        }
    }

    #[test]
    fn resolves_by_position_id_and_prefix() {
        let queue = vec![entry("abc-111"), entry("abd-222"), entry("xyz-333")];
        assert_eq!(resolve_session("2", &queue).as_deref(), Some("abd-222"));
        assert_eq!(resolve_session("xyz-333", &queue).as_deref(), Some("xyz-333"));
        assert_eq!(resolve_session("abc", &queue).as_deref(), Some("abc-111"));
        // ambiguous prefix
        assert_eq!(resolve_session("ab", &queue), None);
        assert_eq!(resolve_session("0", &queue), None);
        assert_eq!(resolve_session("4", &queue), None);
    }

    #[test]
    fn status_lists_identity_and_queue() {
        let mut snap = ConsoleSnapshot::default();
        assert!(status_text(&snap).contains("não autenticado"));

        snap.operator = Some(Operator {
            id: "7".into(),
            name: "Ana".into(),
            email: "ana@ifce.edu.br".into(),
            role: "atendente".into(),
            department: "".into(),
        });
        snap.queue = vec![entry("s-1")];
        let text = status_text(&snap);
        assert!(text.contains("Ana <ana@ifce.edu.br> (Geral)"));
        assert!(text.contains("Fila: 1 aberto(s)"));
        assert!(text.contains("Atendimento: nenhum"));
    }
}
