use crate::actors::messages::{ActorError, AppError, CompletionRequest, LlmMessage};
use crate::actors::traits::CompletionProvider;
use crate::config::CompletionConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending completion
/// requests to the running actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
}

impl LlmActorHandle {
    /// Creates a new `LlmActor` and returns a handle to it.
    ///
    /// This will spawn the `LlmActorRunner` in a new Tokio task, so it must be
    /// called from within a runtime.
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoint, credentials and default sampling settings.
    /// * `request_timeout` - Transport timeout for each HTTP call.
    pub fn spawn(config: CompletionConfig, request_timeout: Duration) -> Result<Self, AppError> {
        let (sender, receiver) = mpsc::channel(32);
        let actor = LlmActorRunner::new(receiver, config, request_timeout)?;
        tokio::spawn(async move { actor.run().await });
        Ok(Self { sender })
    }

    /// Stops the runner once queued requests have been handled.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(LlmMessage::Shutdown).await;
    }
}

#[async_trait]
impl CompletionProvider for LlmActorHandle {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Complete {
            request,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Actor(ActorError::Internal(e.to_string())))?;
        recv.await
            .map_err(|e| AppError::Actor(ActorError::Internal(e.to_string())))?
    }
}

// --- Wire types ---
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    config: CompletionConfig,
    client: Client,
}

impl LlmActorRunner {
    fn new(
        receiver: mpsc::Receiver<LlmMessage>,
        config: CompletionConfig,
        request_timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            receiver,
            config,
            client,
        })
    }

    async fn run(mut self) {
        info!("LlmActor started (model {})", self.config.model);

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                LlmMessage::Complete { request, responder } => {
                    let result = self.chat_completion(request).await;
                    let _ = responder.send(result);
                }
                LlmMessage::Shutdown => break,
            }
        }

        info!("LlmActor stopped");
    }

    fn build_request(&self, payload: &serde_json::Value) -> Result<reqwest::RequestBuilder, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| AppError::Config(format!("Invalid API key header: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .headers(headers)
            .json(payload))
    }

    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    async fn chat_completion(&self, request: CompletionRequest) -> Result<String, AppError> {
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": request.messages,
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
        });

        let res = self.build_request(&payload)?.send().await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!("Completion request failed with status {}", status);
            return Err(AppError::Actor(ActorError::LlmError(format!(
                "Completion request failed with status {}: {}",
                status, body
            ))));
        }

        let parsed: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| AppError::Actor(ActorError::LlmError(e.to_string())))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        debug!("Completion returned {} chars", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::messages::PromptMessage;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> CompletionConfig {
        CompletionConfig {
            base_url,
            api_key: Some("sk-test".to_string()),
            ..CompletionConfig::default()
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![PromptMessage::system("be brief"), PromptMessage::user("hi")],
            ..CompletionRequest::default()
        }
    }

    #[tokio::test]
    async fn test_completion_success() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        let handle =
            LlmActorHandle::spawn(test_config(mock_server.uri()), Duration::from_secs(5)).unwrap();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini", "max_tokens": 500})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Test Track is 60 minutes."}}]
            })))
            .mount(&mock_server)
            .await;

        // 2. Act
        let result = handle.complete(request()).await;

        // 3. Assert
        assert_eq!(result.unwrap(), "Test Track is 60 minutes.");
    }

    #[tokio::test]
    async fn test_completion_server_error() {
        let mock_server = MockServer::start().await;
        let handle =
            LlmActorHandle::spawn(test_config(mock_server.uri()), Duration::from_secs(5)).unwrap();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let result = handle.complete(request()).await;

        if let Err(AppError::Actor(ActorError::LlmError(err_msg))) = result {
            assert!(err_msg.contains("status 500"));
            assert!(err_msg.contains("Internal Server Error"));
        } else {
            panic!("Expected AppError::Actor(LlmError), got {:?}", result);
        }
    }

    #[tokio::test]
    async fn test_completion_without_choices_is_empty() {
        let mock_server = MockServer::start().await;
        let handle =
            LlmActorHandle::spawn(test_config(mock_server.uri()), Duration::from_secs(5)).unwrap();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&mock_server)
            .await;

        assert_eq!(handle.complete(request()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_request_after_shutdown_fails() {
        let mock_server = MockServer::start().await;
        let handle =
            LlmActorHandle::spawn(test_config(mock_server.uri()), Duration::from_secs(5)).unwrap();

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(
            handle.complete(request()).await,
            Err(AppError::Actor(ActorError::Internal(_)))
        ));
    }
}
