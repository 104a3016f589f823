//! Passage retrieval over a document set.
//!
//! [`retrieve`] is the stateless form: combine the documents, chunk them,
//! build a fresh [`EmbeddingIndex`], search it for the query and join the
//! top chunks into one context string. An empty context means nothing
//! relevant was found.
//!
//! [`Retriever`] does the same with fixed [`RetrievalParams`] and can keep
//! the last index around, keyed by a hash of the embedder model, the
//! chunking parameters and the combined text. Any change to the document
//! set changes the key, so a cached index is never stale.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::chunk::{Splitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::embedding::Embedder;
use crate::error::AnswerError;
use crate::index::EmbeddingIndex;

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 2;

/// Separator placed between documents before chunking.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Separator placed between retrieved chunks in the context string.
pub const CONTEXT_SEPARATOR: &str = " ";

/// Chunking and search parameters for a [`Retriever`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalParams {
    pub chunk_size: usize,
    pub overlap: usize,
    pub top_k: usize,
    /// Keep the index of the last document set between queries.
    pub cache_index: bool,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            cache_index: false,
        }
    }
}

/// Join document texts with a blank line so paragraphs never merge across
/// document boundaries.
pub fn combine_documents<S: AsRef<str>>(texts: &[S]) -> String {
    texts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// Retrieve the `k` chunks most similar to `query` with the default
/// chunking parameters, joined into a single context string.
///
/// Returns an empty string, without calling the embedder, when the
/// documents contain no text.
pub async fn retrieve<S: AsRef<str> + Sync>(
    texts: &[S],
    query: &str,
    embedder: &dyn Embedder,
    k: usize,
) -> Result<String, AnswerError> {
    let params = RetrievalParams {
        top_k: k,
        ..RetrievalParams::default()
    };
    Retriever::new(params).retrieve(texts, query, embedder).await
}

/// Reusable retriever with optional index caching.
#[derive(Debug, Default)]
pub struct Retriever {
    params: RetrievalParams,
    cached: Option<(String, EmbeddingIndex)>,
}

impl Retriever {
    pub fn new(params: RetrievalParams) -> Self {
        Self {
            params,
            cached: None,
        }
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Replace the parameters. Drops any cached index.
    pub fn set_params(&mut self, params: RetrievalParams) {
        self.params = params;
        self.cached = None;
    }

    /// True if an index is currently cached.
    pub fn has_cached_index(&self) -> bool {
        self.cached.is_some()
    }

    pub fn clear_cache(&mut self) {
        self.cached = None;
    }

    /// Retrieve context for `query` from `texts`.
    pub async fn retrieve<S: AsRef<str> + Sync>(
        &mut self,
        texts: &[S],
        query: &str,
        embedder: &dyn Embedder,
    ) -> Result<String, AnswerError> {
        let combined = combine_documents(texts);
        let splitter = Splitter::new(self.params.chunk_size, self.params.overlap);
        let chunks: Vec<String> = splitter
            .split(&combined)
            .map(|c| c.text.to_string())
            .collect();

        if chunks.is_empty() {
            debug!("no indexable text; skipping embedding");
            return Ok(String::new());
        }

        let fresh;
        let index = if self.params.cache_index {
            let key = index_key(embedder.model_name(), &self.params, &combined);
            let entry = match self.cached.take() {
                Some((cached_key, index)) if cached_key == key => {
                    debug!(key = %&key[..12], "reusing cached index");
                    (cached_key, index)
                }
                _ => (key, EmbeddingIndex::build(chunks, embedder).await?),
            };
            &self.cached.insert(entry).1
        } else {
            fresh = EmbeddingIndex::build(chunks, embedder).await?;
            &fresh
        };

        let hits = index.search(query, embedder, self.params.top_k).await?;
        debug!(chunks = index.len(), hits = hits.len(), "retrieved context");

        // Chunks are never blank, so every hit contributes text.
        Ok(hits
            .iter()
            .map(|t| t.trim())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR))
    }
}

/// SHA-256 over everything that determines the index contents.
fn index_key(model: &str, params: &RetrievalParams, combined: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(params.chunk_size.to_le_bytes());
    hasher.update(params.overlap.to_le_bytes());
    hasher.update(combined.as_bytes());
    format!("{:x}", hasher.finalize())
}
