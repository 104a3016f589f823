//! # DocuBot Core
//!
//! The retrieval-augmented answering core of DocuBot: text chunking,
//! embedding index, passage retrieval, prompt composition, and the
//! answering pipeline, plus the session data model and storage trait.
//!
//! This crate performs no filesystem or network I/O. Embedding and text
//! generation are reached through the [`embedding::Embedder`] and
//! [`pipeline::Generator`] traits; the application crate supplies the
//! HTTP-backed implementations.
//!
//! ```text
//! documents ──▶ chunk ──▶ index (embed) ──▶ retrieve(query) ──▶ prompt ──▶ generate
//! ```

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod retrieve;
pub mod store;

pub use error::{AnswerError, DocumentSetError};
pub use pipeline::{answer, Answer, AnsweringPipeline, Generator, NO_RELEVANT_TEXT};
pub use retrieve::{retrieve, RetrievalParams, Retriever};
