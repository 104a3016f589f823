//! The answering pipeline: retrieve, compose, generate.
//!
//! ```text
//! documents ─▶ Retriever ─▶ context ─┬─ empty ─▶ NO_RELEVANT_TEXT
//!                                    └─ text  ─▶ compose ─▶ Generator ─▶ answer
//! ```
//!
//! An empty document set fails with [`AnswerError::NoDocuments`] before any
//! capability is touched. An empty context short-circuits to the fixed
//! fallback answer without calling the generator.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::embedding::Embedder;
use crate::error::AnswerError;
use crate::prompt;
use crate::retrieve::{RetrievalParams, Retriever};

/// Answer returned when retrieval finds nothing to ground a response on.
pub const NO_RELEVANT_TEXT: &str = "No relevant text found in uploaded PDFs.";

/// A text generation backend: prompt in, completion out.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-3.5-turbo"`).
    fn model_name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Box<G> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}

/// The outcome of one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Generated text, or [`NO_RELEVANT_TEXT`].
    pub text: String,
    /// Context the answer was grounded on; empty for the fallback.
    pub context: String,
}

impl Answer {
    /// True if the answer is the fixed no-context fallback.
    pub fn is_fallback(&self) -> bool {
        self.context.is_empty()
    }
}

/// Runs questions against a document set.
#[derive(Debug, Default)]
pub struct AnsweringPipeline {
    retriever: Retriever,
}

impl AnsweringPipeline {
    pub fn new(params: RetrievalParams) -> Self {
        Self {
            retriever: Retriever::new(params),
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn retriever_mut(&mut self) -> &mut Retriever {
        &mut self.retriever
    }

    /// Answer `question` from `documents`.
    pub async fn answer<S: AsRef<str> + Sync>(
        &mut self,
        documents: &[S],
        question: &str,
        embedder: &dyn Embedder,
        generator: &dyn Generator,
    ) -> Result<Answer, AnswerError> {
        if documents.is_empty() {
            return Err(AnswerError::NoDocuments);
        }

        let context = self
            .retriever
            .retrieve(documents, question, embedder)
            .await?;

        if context.is_empty() {
            info!("no relevant text; answering with fallback");
            return Ok(Answer {
                text: NO_RELEVANT_TEXT.to_string(),
                context,
            });
        }

        let prompt = prompt::compose(&context, question);
        debug!(
            model = generator.model_name(),
            prompt_len = prompt.len(),
            "generating answer"
        );
        let text = generator
            .generate(&prompt)
            .await
            .map_err(AnswerError::Generation)?;

        Ok(Answer { text, context })
    }
}

/// Answer `question` from `documents` with default retrieval parameters,
/// returning only the answer text.
pub async fn answer<S: AsRef<str> + Sync>(
    documents: &[S],
    question: &str,
    embedder: &dyn Embedder,
    generator: &dyn Generator,
) -> Result<String, AnswerError> {
    AnsweringPipeline::default()
        .answer(documents, question, embedder, generator)
        .await
        .map(|answer| answer.text)
}
