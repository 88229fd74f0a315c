// painel-core/src/console/attachment.rs

use std::fmt;
use std::path::Path;

use uuid::Uuid;

use painel_common::models::{Attachment, MediaKind};

use crate::Error;

/// A file the operator picked but has not sent yet.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    pub file_name: String,
    /// Declared type, guessed from the extension.
    pub content_type: String,
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
    /// Temporary local reference used for the optimistic transcript entry.
    pub preview: String,
}

impl PendingAttachment {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let kind = MediaKind::from_content_type(&content_type);
        let preview = format!("local://{}/{}", Uuid::new_v4(), file_name);
        Self { file_name, content_type, kind, bytes, preview }
    }

    pub async fn from_path(path: &Path) -> Result<Self, Error> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| Error::Upload(format!("caminho sem nome de arquivo: {}", path.display())))?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Transcript attachment pointing at the preview reference.
    pub fn local_attachment(&self) -> Attachment {
        Attachment {
            url: self.preview.clone(),
            kind: self.kind,
            file_name: Some(self.file_name.clone()),
        }
    }
}

impl fmt::Debug for PendingAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAttachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("kind", &self.kind)
            .field("size", &self.bytes.len())
            .finish()
    }
}
