//! Core data models for DocuBot sessions.
//!
//! A [`Session`] owns a transcript of [`Message`]s and a [`DocumentSet`].
//! [`SessionRecord`] is the persisted shape: exactly three named fields,
//! `messages`, `document_texts` and `uploaded_file_names`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::DocumentSetError;

/// Prefix of every generated session id.
pub const SESSION_ID_PREFIX: &str = "Session_";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Uploaded document texts with their filenames, kept in lockstep.
///
/// A file whose text could not be extracted still has a slot, holding an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSet {
    texts: Vec<String>,
    filenames: Vec<String>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from parallel lists.
    pub fn from_parts(
        texts: Vec<String>,
        filenames: Vec<String>,
    ) -> Result<Self, DocumentSetError> {
        if texts.len() != filenames.len() {
            return Err(DocumentSetError::Mismatched {
                texts: texts.len(),
                filenames: filenames.len(),
            });
        }
        Ok(Self { texts, filenames })
    }

    pub fn push(&mut self, filename: impl Into<String>, text: impl Into<String>) {
        self.filenames.push(filename.into());
        self.texts.push(text.into());
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// `(filename, text)` pairs in upload order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filenames
            .iter()
            .map(String::as_str)
            .zip(self.texts.iter().map(String::as_str))
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.texts, self.filenames)
    }
}

/// A conversation with its documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub documents: DocumentSet,
}

impl Session {
    /// An empty session with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            documents: DocumentSet::new(),
        }
    }

    /// Build a session from its persisted record.
    pub fn from_record(
        id: impl Into<String>,
        record: SessionRecord,
    ) -> Result<Self, DocumentSetError> {
        Ok(Self {
            id: id.into(),
            messages: record.messages,
            documents: DocumentSet::from_parts(record.document_texts, record.uploaded_file_names)?,
        })
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            messages: self.messages.clone(),
            document_texts: self.documents.texts().to_vec(),
            uploaded_file_names: self.documents.filenames().to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.documents.is_empty()
    }
}

/// Persisted form of a session. Missing fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub document_texts: Vec<String>,
    #[serde(default)]
    pub uploaded_file_names: Vec<String>,
}

/// Session id for a point in time, e.g. `Session_2025-03-14_09-26-53`.
///
/// Ids sort lexically in creation order.
pub fn timestamped_session_id(at: DateTime<Local>) -> String {
    at.format("Session_%Y-%m-%d_%H-%M-%S").to_string()
}
