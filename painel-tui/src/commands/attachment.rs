use std::path::PathBuf;

use painel_core::{ConsoleHandle, Error};

pub fn handle_attach(path: &str, console: &ConsoleHandle) -> Result<Option<String>, Error> {
    if path.is_empty() {
        return Ok(Some("Uso: attach <caminho>".to_string()));
    }
    console.select_file(expand_home(path))?;
    Ok(None)
}

/// Stages the draft without sending it. An empty text clears it.
pub fn handle_draft(text: &str, console: &ConsoleHandle) -> Result<Option<String>, Error> {
    console.set_draft(text)?;
    if text.is_empty() {
        Ok(Some("Rascunho apagado.".to_string()))
    } else {
        Ok(Some(format!("Rascunho: {}", text)))
    }
}

/// Expands a leading `~/` against the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
