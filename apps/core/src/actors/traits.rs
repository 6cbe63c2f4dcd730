use crate::actors::messages::{AppError, CompletionRequest};
use async_trait::async_trait;

/// Defines the public interface for a text-completion backend.
///
/// This trait abstracts the specific implementation of the language model, allowing
/// the hosted API actor and test doubles to be used interchangeably.
#[async_trait]
pub trait CompletionProvider: Send + Sync + 'static {
    /// Runs a single completion and returns the first choice's text.
    ///
    /// An empty string means the provider answered without content.
    async fn complete(&self, request: CompletionRequest) -> Result<String, AppError>;
}

/// Defines the public interface for speech-to-text.
///
/// Failures are returned to the caller untouched; voice capture surfaces them directly.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync + 'static {
    /// Transcribes an audio payload into text.
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: String,
        mime_type: String,
    ) -> Result<String, AppError>;
}
