//! File-backed ephemeral store for the guest conversation.
//!
//! The guest "temp chat" is a single JSON file in the data directory:
//! durable across restarts on this device, never synced, never sent to
//! the server. Writes replace the file wholesale.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use confab_core::history::EphemeralStore;
use confab_types::chat::ChatMessage;
use confab_types::error::StoreError;

/// File name of the stored guest sequence, under the data directory.
pub const TEMP_CHAT_FILE: &str = "temp_chat.json";

/// JSON-file implementation of [`EphemeralStore`].
#[derive(Debug, Clone)]
pub struct TempChatStore {
    path: PathBuf,
}

impl TempChatStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(TEMP_CHAT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EphemeralStore for TempChatStore {
    async fn load_sequence(&self) -> Result<Vec<ChatMessage>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        };
        serde_json::from_str(&content).map_err(|err| StoreError::Corrupt(err.to_string()))
    }

    async fn save_sequence(&self, sequence: &[ChatMessage]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::Io(err.to_string()))?;
        }
        let json =
            serde_json::to_vec(sequence).map_err(|err| StoreError::Io(err.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|err| StoreError::Io(err.to_string()))
    }
}
