//! In-memory [`SessionStore`] implementation for tests and embedding.
//!
//! Records are kept in a `BTreeMap` behind `std::sync::RwLock`, stored in
//! their persisted [`SessionRecord`] shape so round-trips behave like the
//! file store.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Session, SessionRecord};

use super::{sort_newest_first, validate_session_id, SessionStore};

/// Session store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    records: RwLock<BTreeMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, SessionRecord>>> {
        self.records
            .read()
            .map_err(|_| anyhow!("session store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, SessionRecord>>> {
        self.records
            .write()
            .map_err(|_| anyhow!("session store lock poisoned"))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load_session(&self, id: &str) -> Result<Session> {
        validate_session_id(id)?;
        let records = self.read()?;
        match records.get(id) {
            Some(record) => Ok(Session::from_record(id, record.clone())?),
            None => Ok(Session::new(id)),
        }
    }

    async fn save_session(&self, session: &Session) -> Result<()> {
        validate_session_id(&session.id)?;
        self.write()?
            .insert(session.id.clone(), session.to_record());
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.read()?.keys().cloned().collect();
        sort_newest_first(&mut ids);
        Ok(ids)
    }

    async fn delete_session(&self, id: &str) -> Result<bool> {
        validate_session_id(id)?;
        Ok(self.write()?.remove(id).is_some())
    }

    async fn clear_sessions(&self) -> Result<usize> {
        let mut records = self.write()?;
        let count = records.len();
        records.clear();
        Ok(count)
    }

    async fn session_exists(&self, id: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;
    use crate::store::allocate_session_id;
    use chrono::{Local, TimeZone};

    #[tokio::test]
    async fn test_unknown_session_loads_empty() {
        let store = InMemorySessionStore::new();
        let session = store.load_session("Session_missing").await.unwrap();
        assert_eq!(session.id, "Session_missing");
        assert!(session.is_empty());
        assert!(!store.session_exists("Session_missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let store = InMemorySessionStore::new();
        let mut session = Session::new("s1");
        session.messages.push(Message::user("q"));
        session.messages.push(Message::assistant("a"));
        session.documents.push("a.pdf", "alpha");
        store.save_session(&session).await.unwrap();

        assert_eq!(store.load_session("s1").await.unwrap(), session);

        // overwrite
        session.messages.clear();
        store.save_session(&session).await.unwrap();
        assert!(store.load_session("s1").await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_list_delete_clear() {
        let store = InMemorySessionStore::new();
        for id in ["Session_2025-01-01_00-00-00", "Session_2025-02-01_00-00-00", "Session_2024-06-01_00-00-00"] {
            store.save_session(&Session::new(id)).await.unwrap();
        }
        let ids = store.list_sessions().await.unwrap();
        assert_eq!(ids[0], "Session_2025-02-01_00-00-00");
        assert_eq!(ids[2], "Session_2024-06-01_00-00-00");

        assert!(store.delete_session("Session_2025-02-01_00-00-00").await.unwrap());
        assert!(!store.delete_session("Session_2025-02-01_00-00-00").await.unwrap());
        assert_eq!(store.clear_sessions().await.unwrap(), 2);
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_ids_rejected() {
        let store = InMemorySessionStore::new();
        assert!(store.load_session("../x").await.is_err());
        assert!(store.save_session(&Session::new("a/b")).await.is_err());
    }

    #[tokio::test]
    async fn test_allocate_session_id_suffixes_collisions() {
        let store = InMemorySessionStore::new();
        let at = Local.with_ymd_and_hms(2025, 5, 6, 7, 8, 9).unwrap();

        let first = allocate_session_id(&store, at).await.unwrap();
        assert_eq!(first, "Session_2025-05-06_07-08-09");
        store.save_session(&Session::new(first)).await.unwrap();

        let second = allocate_session_id(&store, at).await.unwrap();
        assert_eq!(second, "Session_2025-05-06_07-08-09_2");
        store.save_session(&Session::new(second)).await.unwrap();

        let third = allocate_session_id(&store, at).await.unwrap();
        assert_eq!(third, "Session_2025-05-06_07-08-09_3");
    }
}
