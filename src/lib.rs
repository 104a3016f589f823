//! # DocuBot
//!
//! Chat with your PDF documents. DocuBot extracts the text of uploaded
//! files, finds the passages most similar to a question, and asks a
//! language model to answer from those passages only.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────────┐   ┌────────────┐
//! │   extract   │──▶│      docubot-core        │──▶│    llm     │
//! │  PDF / txt  │   │ chunk → index → retrieve │   │ OpenAI /   │
//! └─────────────┘   │        → prompt          │   │ Ollama     │
//!                   └────────────┬─────────────┘   └────────────┘
//!                                │ embed
//!                          ┌─────▼─────┐       ┌────────────────┐
//!                          │ embedding │       │ session_store  │
//!                          └───────────┘       │ <id>.json      │
//!                                              └────────────────┘
//! ```
//!
//! The retrieval core lives in the `docubot-core` crate and does no I/O.
//! This crate supplies the HTTP-backed providers, file extraction, JSON
//! session storage and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`assistant`] | Session-level orchestration |
//! | [`commands`] | CLI command implementations |
//! | [`embedding`] | Embedding providers |
//! | [`llm`] | Text generation providers |
//! | [`http`] | Shared JSON-over-HTTP retry loop |
//! | [`extract`] | PDF and text extraction |
//! | [`session_store`] | JSON-file session storage |

pub mod assistant;
pub mod commands;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod http;
pub mod llm;
pub mod session_store;
