// ================================================================
// File: painel-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Email or password missing before any request is made.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The backend refused the bearer token (401).
    #[error("Unauthorized")]
    Unauthorized,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Token error: {0}")]
    Token(String),

    /// An operation was attempted in a console state that does not allow it.
    #[error("State error: {0}")]
    State(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
