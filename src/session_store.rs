//! File-backed [`SessionStore`].
//!
//! One JSON file per session, `<dir>/<id>.json`, holding the three fields
//! of [`SessionRecord`]. Saving overwrites the whole file. The directory
//! is created on first save; a missing directory lists as empty.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use docubot_core::models::{Session, SessionRecord};
use docubot_core::store::{sort_newest_first, validate_session_id, SessionStore};
use tracing::debug;

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `id`. The id must already be validated.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, EXTENSION))
    }

    async fn record_ids(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read session directory: {}", self.dir.display())
                })
            }
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_session_id(stem).is_err() {
                debug!(file = %path.display(), "skipping file that is not a session record");
                continue;
            }
            ids.push(stem.to_string());
        }
        Ok(ids)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load_session(&self, id: &str) -> Result<Session> {
        validate_session_id(id)?;
        let path = self.path_for(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(id, "no stored session; starting empty");
                return Ok(Session::new(id));
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read session file: {}", path.display()))
            }
        };

        let record: SessionRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))?;
        Session::from_record(id, record)
            .with_context(|| format!("Corrupt session file: {}", path.display()))
    }

    async fn save_session(&self, session: &Session) -> Result<()> {
        validate_session_id(&session.id)?;
        tokio::fs::create_dir_all(&self.dir).await.with_context(|| {
            format!("Failed to create session directory: {}", self.dir.display())
        })?;

        let path = self.path_for(&session.id);
        let json = serde_json::to_string_pretty(&session.to_record())?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write session file: {}", path.display()))?;
        debug!(id = %session.id, messages = session.messages.len(), "saved session");
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut ids = self.record_ids().await?;
        sort_newest_first(&mut ids);
        Ok(ids)
    }

    async fn delete_session(&self, id: &str) -> Result<bool> {
        validate_session_id(id)?;
        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to delete session file: {}", path.display())),
        }
    }

    async fn clear_sessions(&self) -> Result<usize> {
        let ids = self.record_ids().await?;
        let mut removed = 0;
        for id in &ids {
            if self.delete_session(id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn session_exists(&self, id: &str) -> Result<bool> {
        validate_session_id(id)?;
        Ok(tokio::fs::try_exists(self.path_for(id)).await?)
    }
}
