// Batch subtitle translation
//
// - openai: chat completions client for OpenAI-compatible endpoints
// - batch: splits a document into batches, builds prompts, maps replies back onto cues

pub mod batch;
pub mod openai;

use async_trait::async_trait;

pub use batch::{BatchFailure, BatchTranslator, DEFAULT_PROMPT, TranslationSummary};
pub use openai::OpenAiClient;

use crate::error::Result;

/// A language model that answers one prompt with one reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
