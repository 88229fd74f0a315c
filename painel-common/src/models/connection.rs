use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    /// Badge text shown in the console header.
    pub fn badge(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "🟢 Conectado",
            ConnectionStatus::Connecting => "🟡 Conectando",
            ConnectionStatus::Error(_) => "❌ Erro de conexão",
            ConnectionStatus::Disconnected => "🔴 Desconectado",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Error(msg) => write!(f, "{} ({})", self.badge(), msg),
            _ => f.write_str(self.badge()),
        }
    }
}
