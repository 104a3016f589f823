//! Error types for the answering core.

use thiserror::Error;

/// Failure of a single question/answer cycle.
///
/// An empty retrieval result is not an error: the pipeline answers with
/// [`NO_RELEVANT_TEXT`](crate::pipeline::NO_RELEVANT_TEXT) instead.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// A question was asked before any document was uploaded.
    #[error("no documents uploaded; upload PDFs before asking questions")]
    NoDocuments,

    /// The embedding capability failed or returned unusable vectors.
    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),

    /// The generation capability failed.
    #[error("generation failed: {0:#}")]
    Generation(anyhow::Error),
}

impl AnswerError {
    /// True for failures of an external capability (embedding or generation).
    pub fn is_capability_failure(&self) -> bool {
        matches!(self, AnswerError::Embedding(_) | AnswerError::Generation(_))
    }
}

/// A document set whose text and filename lists disagree in length.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentSetError {
    #[error("document set has {texts} texts but {filenames} filenames")]
    Mismatched { texts: usize, filenames: usize },
}
