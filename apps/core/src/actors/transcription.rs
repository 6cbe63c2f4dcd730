use crate::actors::messages::AppError;
use crate::actors::traits::TranscriptionProvider;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Speech-to-text client for an OpenAI-compatible `/audio/transcriptions` endpoint.
///
/// Unlike completions, failures are not softened: the voice-capture caller
/// shows them to the user and the attempt ends there.
#[derive(Clone)]
pub struct TranscriptionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl TranscriptionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl TranscriptionProvider for TranscriptionClient {
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: String,
        mime_type: String,
    ) -> Result<String, AppError> {
        if audio.is_empty() {
            return Err(AppError::Transcription("No audio was recorded".to_string()));
        }

        let part = Part::bytes(audio)
            .file_name(file_name)
            .mime_str(&mime_type)
            .map_err(|e| AppError::Transcription(format!("Invalid audio type {}: {}", mime_type, e)))?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let mut request = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .map_err(|e| AppError::Transcription(e.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Transcription(format!(
                "Transcription request failed with status {}: {}",
                status, body
            )));
        }

        let parsed: TranscriptionResponse = res
            .json()
            .await
            .map_err(|e| AppError::Transcription(format!("Malformed transcription response: {}", e)))?;

        info!("Transcribed {} chars", parsed.text.len());
        Ok(parsed.text.trim().to_string())
    }
}
