//! In-memory embedding index with brute-force cosine search.
//!
//! An [`EmbeddingIndex`] pairs every chunk with its embedding vector. It is
//! built in one shot from a chunk list and never updated afterwards; a new
//! document set means a new index.
//!
//! Search scores every entry against the query vector, sorts by similarity
//! (descending) with ties kept in chunk order, and returns at most `k`
//! entries. Searching an empty index returns nothing and does not call the
//! embedder.

use std::cmp::Ordering;

use anyhow::anyhow;
use tracing::debug;

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::AnswerError;

/// A chunk paired with its embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub text: String,
    pub vector: Vec<f32>,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    /// Position of the chunk in the index (build order).
    pub position: usize,
    /// Cosine similarity to the query.
    pub score: f32,
    pub text: &'a str,
}

/// Embedded chunks for one document set.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    entries: Vec<EmbeddedChunk>,
    dims: usize,
}

impl EmbeddingIndex {
    /// Embed `chunks` and build an index over them.
    ///
    /// # Errors
    ///
    /// [`AnswerError::Embedding`] if the embedder fails, returns the wrong
    /// number of vectors, or returns vectors of inconsistent or zero length.
    pub async fn build(chunks: Vec<String>, embedder: &dyn Embedder) -> Result<Self, AnswerError> {
        if chunks.is_empty() {
            return Ok(Self::default());
        }

        let vectors = embedder
            .embed(&chunks)
            .await
            .map_err(AnswerError::Embedding)?;

        Self::from_vectors(chunks, vectors)
    }

    /// Build an index from precomputed vectors, validating their shape.
    pub fn from_vectors(chunks: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self, AnswerError> {
        if vectors.len() != chunks.len() {
            return Err(AnswerError::Embedding(anyhow!(
                "Mismatch between chunk and embedding counts: {} vs {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let dims = vectors.first().map(Vec::len).unwrap_or(0);
        if !chunks.is_empty() && dims == 0 {
            return Err(AnswerError::Embedding(anyhow!("Embedding vectors are empty")));
        }
        if let Some(bad) = vectors.iter().position(|v| v.len() != dims) {
            return Err(AnswerError::Embedding(anyhow!(
                "Embedding {} has {} dimensions, expected {}",
                bad,
                vectors[bad].len(),
                dims
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| EmbeddedChunk { text, vector })
            .collect::<Vec<_>>();

        debug!(chunks = entries.len(), dims, "built embedding index");
        Ok(Self { entries, dims })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimensionality (0 for an empty index).
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn entries(&self) -> &[EmbeddedChunk] {
        &self.entries
    }

    /// Embed `query` and return the texts of the `k` most similar chunks,
    /// most similar first.
    pub async fn search(
        &self,
        query: &str,
        embedder: &dyn Embedder,
        k: usize,
    ) -> Result<Vec<&str>, AnswerError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = embedder
            .embed_query(query)
            .await
            .map_err(AnswerError::Embedding)?;
        let hits = self.search_vector(&query_vec, k)?;
        Ok(hits.into_iter().map(|hit| hit.text).collect())
    }

    /// Rank chunks against a precomputed query vector.
    ///
    /// Returns at most `min(k, len)` hits. NaN similarities rank last.
    pub fn search_vector(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>, AnswerError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query_vec.len() != self.dims {
            return Err(AnswerError::Embedding(anyhow!(
                "Query embedding has {} dimensions, index has {}",
                query_vec.len(),
                self.dims
            )));
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let score = cosine_similarity(query_vec, &entry.vector);
                SearchHit {
                    position,
                    score: if score.is_nan() { f32::NEG_INFINITY } else { score },
                    text: entry.text.as_str(),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);
        Ok(hits)
    }
}
