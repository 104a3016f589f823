//! Session storage abstraction.
//!
//! The [`SessionStore`] trait is everything the assistant needs to persist
//! conversations: load, save, list, delete and clear. Backends are
//! pluggable; this crate ships [`memory::InMemorySessionStore`] and the
//! application crate provides a JSON-file store.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`load_session`](SessionStore::load_session) | Load by id; unknown ids load as empty |
//! | [`save_session`](SessionStore::save_session) | Overwrite the stored record |
//! | [`list_sessions`](SessionStore::list_sessions) | All ids, newest first |
//! | [`delete_session`](SessionStore::delete_session) | Remove one session |
//! | [`clear_sessions`](SessionStore::clear_sessions) | Remove every session |

pub mod memory;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::models::{timestamped_session_id, Session};

/// Abstract storage backend for chat sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session. An id with no stored record yields an empty session.
    async fn load_session(&self, id: &str) -> Result<Session>;

    /// Persist `session`, replacing any previous record with the same id.
    async fn save_session(&self, session: &Session) -> Result<()>;

    /// Ids of all stored sessions, newest first (reverse lexical order).
    async fn list_sessions(&self) -> Result<Vec<String>>;

    /// Remove a session. Returns `false` if it did not exist.
    async fn delete_session(&self, id: &str) -> Result<bool>;

    /// Remove every session. Returns how many were removed.
    async fn clear_sessions(&self) -> Result<usize>;

    /// True if a record exists for `id`.
    async fn session_exists(&self, id: &str) -> Result<bool> {
        Ok(self.list_sessions().await?.iter().any(|s| s == id))
    }
}

/// Reject ids that could escape a storage directory or are empty.
pub fn validate_session_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        bail!("Session id must not be empty");
    }
    if id.contains(['/', '\\', '\0']) || id.contains("..") {
        bail!("Invalid session id '{}'", id);
    }
    Ok(())
}

/// A fresh session id for `at`, suffixed with `_2`, `_3`, … if the
/// timestamp id is already taken.
pub async fn allocate_session_id(
    store: &dyn SessionStore,
    at: DateTime<Local>,
) -> Result<String> {
    let base = timestamped_session_id(at);
    let existing = store.list_sessions().await?;
    if !existing.contains(&base) {
        return Ok(base);
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Sort session ids newest first. Collision suffixes compare as numbers,
/// so `_10` is newer than `_9`.
pub fn sort_newest_first(ids: &mut [String]) {
    ids.sort_unstable_by(|a, b| {
        recency_key(b)
            .cmp(&recency_key(a))
            .then_with(|| b.cmp(a))
    });
}

/// Split a trailing `_<n>` collision suffix off an id. Ids without one
/// count as suffix 1, so a base id sorts just behind its `_2`.
fn recency_key(id: &str) -> (&str, u64) {
    id.rsplit_once('_')
        .filter(|(_, n)| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|(base, n)| Some((base, n.parse().ok()?)))
        .unwrap_or((id, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("Session_2025-01-01_10-00-00").is_ok());
        assert!(validate_session_id("notes").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("   ").is_err());
        assert!(validate_session_id("../etc/passwd").is_err());
        assert!(validate_session_id("a/b").is_err());
        assert!(validate_session_id("a\\b").is_err());
    }

    #[test]
    fn test_sort_newest_first() {
        let mut ids = vec![
            "Session_2025-01-01_10-00-00".to_string(),
            "Session_2025-03-01_10-00-00".to_string(),
            "Session_2025-03-01_10-00-00_2".to_string(),
            "Session_2024-12-31_23-59-59".to_string(),
        ];
        sort_newest_first(&mut ids);
        assert_eq!(
            ids,
            vec![
                "Session_2025-03-01_10-00-00_2",
                "Session_2025-03-01_10-00-00",
                "Session_2025-01-01_10-00-00",
                "Session_2024-12-31_23-59-59",
            ]
        );
    }

    #[test]
    fn test_sort_orders_collision_suffixes_numerically() {
        let base = "Session_2025-03-01_10-00-00";
        let mut ids: Vec<String> = (2..=11).map(|n| format!("{}_{}", base, n)).collect();
        ids.push(base.to_string());
        ids.push("Session_2025-03-01_09-59-59_4".to_string());
        ids.reverse();
        sort_newest_first(&mut ids);

        assert_eq!(ids[0], format!("{}_11", base));
        assert_eq!(ids[1], format!("{}_10", base));
        assert_eq!(ids[2], format!("{}_9", base));
        assert_eq!(ids[9], format!("{}_2", base));
        assert_eq!(ids[10], base);
        assert_eq!(ids[11], "Session_2025-03-01_09-59-59_4");
    }

    #[test]
    fn test_recency_key_ignores_non_numeric_tails() {
        assert_eq!(recency_key("Session_2025-03-01_10-00-00"), ("Session_2025-03-01_10-00-00", 1));
        assert_eq!(recency_key("notes_12"), ("notes", 12));
        assert_eq!(recency_key("notes_v2"), ("notes_v2", 1));
        assert_eq!(recency_key("notes_"), ("notes_", 1));
    }
}
