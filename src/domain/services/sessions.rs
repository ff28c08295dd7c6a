#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ConversationState;
use crate::domain::models::SessionRecord;

/// Persists a single consultation to one JSON file. Failures are logged and
/// reported as `false`, never raised.
pub struct SessionStore {
    path: path::PathBuf,
}

impl Default for SessionStore {
    fn default() -> SessionStore {
        return SessionStore::new(path::PathBuf::from(Config::get(ConfigKey::SessionFile)));
    }
}

impl SessionStore {
    pub fn new(path: path::PathBuf) -> SessionStore {
        return SessionStore { path };
    }

    pub fn path(&self) -> &path::Path {
        return &self.path;
    }

    async fn write(&self, state: &ConversationState) -> Result<()> {
        let payload = serde_json::to_string_pretty(&SessionRecord::from(state))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(&self.path).await?;
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        return Ok(());
    }

    async fn read(&self) -> Result<SessionRecord> {
        let payload = fs::read_to_string(&self.path).await?;
        let record: SessionRecord = serde_json::from_str(&payload)?;
        return Ok(record);
    }

    pub async fn save(&self, state: &ConversationState) -> bool {
        if let Err(err) = self.write(state).await {
            tracing::error!(error = ?err, path = ?self.path, "Failed to save session");
            return false;
        }

        tracing::debug!(path = ?self.path, "Saved session");
        return true;
    }

    /// Restores the fields present in the file onto `state`. A missing file
    /// leaves `state` as it was.
    pub async fn load(&self, state: &mut ConversationState) -> bool {
        if !self.path.exists() {
            return false;
        }

        match self.read().await {
            Ok(record) => {
                record.apply(state);
                tracing::debug!(path = ?self.path, "Loaded session");
                return true;
            }
            Err(err) => {
                tracing::error!(error = ?err, path = ?self.path, "Failed to load session");
                return false;
            }
        }
    }

    pub async fn clear(&self, state: &mut ConversationState) {
        if self.path.exists() {
            if let Err(err) = fs::remove_file(&self.path).await {
                tracing::error!(error = ?err, path = ?self.path, "Failed to delete session");
            }
        }

        state.reset();
    }
}
