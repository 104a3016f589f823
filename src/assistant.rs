//! Session-level orchestration.
//!
//! An [`Assistant`] owns the session store, the embedding and generation
//! providers and an [`AnsweringPipeline`]. The CLI talks only to this
//! type; sessions are passed in explicitly and updated in place.
//!
//! Every state change is persisted immediately: creating a session,
//! replacing its documents and recording a question/answer pair.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use docubot_core::embedding::Embedder;
use docubot_core::models::{Message, Session};
use docubot_core::store::{allocate_session_id, SessionStore};
use docubot_core::{Answer, AnsweringPipeline, Generator, RetrievalParams};
use tracing::{info, warn};

use crate::config::{Config, LlmConfig};
use crate::embedding::create_embedder;
use crate::extract::extract_files;
use crate::llm::create_generator;
use crate::session_store::FileSessionStore;

pub struct Assistant {
    store: Box<dyn SessionStore>,
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
    pipeline: AnsweringPipeline,
    max_file_bytes: u64,
}

impl Assistant {
    pub fn new(
        store: Box<dyn SessionStore>,
        embedder: Box<dyn Embedder>,
        generator: Box<dyn Generator>,
        params: RetrievalParams,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            pipeline: AnsweringPipeline::new(params),
            max_file_bytes: crate::config::UploadConfig::default().max_file_bytes,
        }
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Build an assistant backed by the file store and the configured
    /// providers. `llm` is the effective LLM configuration after any
    /// command-line overrides.
    pub fn from_config(cfg: &Config, llm: &LlmConfig) -> Result<Self> {
        let store = FileSessionStore::new(&cfg.sessions.dir);
        let embedder = create_embedder(&cfg.embedding).context("Failed to create embedder")?;
        let generator = create_generator(llm).context("Failed to create LLM client")?;
        Ok(Self::new(Box::new(store), embedder, generator, cfg.retrieval_params())
            .with_max_file_bytes(cfg.upload.max_file_bytes))
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    /// Swap the generation backend, e.g. after changing LLM settings.
    pub fn set_generator(&mut self, generator: Box<dyn Generator>) {
        self.generator = generator;
    }

    /// Create and persist an empty session with a fresh timestamp id.
    pub async fn new_session(&self) -> Result<Session> {
        create_session(self.store.as_ref()).await
    }

    /// Open `id`, or the most recent session, or a new one if none exist.
    pub async fn open_session(&self, id: Option<&str>) -> Result<Session> {
        open_session(self.store.as_ref(), id).await
    }

    /// Replace the session's documents with the text of `paths`.
    ///
    /// Returns one warning per file that yielded no text. Those files keep
    /// their slot with an empty text.
    pub async fn upload(&self, session: &mut Session, paths: &[PathBuf]) -> Result<Vec<String>> {
        upload_documents(self.store.as_ref(), session, paths, self.max_file_bytes).await
    }

    /// Answer `question` and record the exchange.
    ///
    /// With no documents this fails with
    /// [`AnswerError::NoDocuments`](docubot_core::AnswerError::NoDocuments)
    /// and records nothing. If a capability fails the session is left as
    /// it was.
    pub async fn ask(&mut self, session: &mut Session, question: &str) -> Result<Answer> {
        session.messages.push(Message::user(question));

        let result = self
            .pipeline
            .answer(
                session.documents.texts(),
                question,
                self.embedder.as_ref(),
                self.generator.as_ref(),
            )
            .await;

        let answer = match result {
            Ok(answer) => answer,
            Err(e) => {
                session.messages.pop();
                if e.is_capability_failure() {
                    warn!(id = %session.id, error = %e, "answering failed");
                }
                return Err(e.into());
            }
        };

        session.messages.push(Message::assistant(answer.text.clone()));
        self.store.save_session(session).await?;
        Ok(answer)
    }
}

/// Create and persist an empty session in `store`.
pub async fn create_session(store: &dyn SessionStore) -> Result<Session> {
    let id = allocate_session_id(store, Local::now()).await?;
    let session = Session::new(id);
    store.save_session(&session).await?;
    info!(id = %session.id, "created session");
    Ok(session)
}

/// Load `id`, or the most recent session in `store`, or create one.
pub async fn open_session(store: &dyn SessionStore, id: Option<&str>) -> Result<Session> {
    if let Some(id) = id {
        return store.load_session(id).await;
    }
    match store.list_sessions().await?.first() {
        Some(latest) => store.load_session(latest).await,
        None => create_session(store).await,
    }
}

/// Extract `paths` and make them the session's document set.
///
/// Extraction runs on the blocking pool; PDF parsing is CPU-bound.
pub async fn upload_documents(
    store: &dyn SessionStore,
    session: &mut Session,
    paths: &[PathBuf],
    max_file_bytes: u64,
) -> Result<Vec<String>> {
    let paths = paths.to_vec();
    let extracted =
        tokio::task::spawn_blocking(move || extract_files(&paths, max_file_bytes)).await??;

    session.documents = extracted.documents;
    store.save_session(session).await?;
    info!(
        id = %session.id,
        files = session.documents.len(),
        failed = extracted.warnings.len(),
        "replaced document set"
    );
    Ok(extracted.warnings)
}
