// painel-core/src/console/transcript.rs

use painel_common::models::ChatMessage;

/// Append-only list of the active session's messages, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything and starts over from `first`.
    pub fn reset_with(&mut self, first: ChatMessage) {
        self.messages.clear();
        self.messages.push(first);
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_only_the_first_message() {
        let mut t = Transcript::new();
        t.push(ChatMessage::from_operator("antiga"));
        t.push(ChatMessage::from_operator("outra"));
        t.reset_with(ChatMessage::system("Você entrou no atendimento."));
        assert_eq!(t.len(), 1);
        assert!(t.messages()[0].is_system());

        t.clear();
        assert!(t.is_empty());
    }
}
