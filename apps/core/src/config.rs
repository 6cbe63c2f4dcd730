//! Runtime configuration for the assistant core.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file) and are range-checked with `validator` before use.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use url::Url;
use validator::Validate;

const DEFAULT_PARK_DATA_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Settings for the hosted chat-completion endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible API (without the `/chat/completions` suffix).
    #[validate(length(min = 1))]
    pub base_url: String,
    /// Bearer token. Requests go out unauthenticated when absent.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[validate(length(min = 1))]
    pub model: String,
    /// Kept low so answers stay close to the supplied park data.
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[validate(range(min = 1, max = 4096))]
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

/// Top-level configuration handed to the composition root.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct AssistantConfig {
    #[validate(length(min = 1))]
    pub park_data_base_url: String,
    #[validate(nested)]
    pub completion: CompletionConfig,
    #[validate(length(min = 1))]
    pub transcription_model: String,
    #[validate(range(min = 1, max = 120))]
    pub request_timeout_secs: u64,
    #[validate(range(min = 1, max = 5))]
    pub completion_max_attempts: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            park_data_base_url: DEFAULT_PARK_DATA_BASE_URL.to_string(),
            completion: CompletionConfig::default(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            request_timeout_secs: 15,
            completion_max_attempts: 1,
        }
    }
}

impl AssistantConfig {
    /// Builds the configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, AppError> {
        if let Err(e) = dotenv::dotenv() {
            // A missing .env is the normal case on device builds.
            tracing::debug!("No .env file loaded: {}", e);
        }

        let defaults = Self::default();
        let config = Self {
            park_data_base_url: env::var("PARK_DATA_BASE_URL")
                .unwrap_or(defaults.park_data_base_url),
            completion: CompletionConfig {
                base_url: env::var("COMPLETION_BASE_URL").unwrap_or(defaults.completion.base_url),
                api_key: env::var("COMPLETION_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                model: env::var("COMPLETION_MODEL").unwrap_or(defaults.completion.model),
                temperature: parse_var("COMPLETION_TEMPERATURE", defaults.completion.temperature)?,
                max_tokens: parse_var("COMPLETION_MAX_TOKENS", defaults.completion.max_tokens)?,
            },
            transcription_model: env::var("TRANSCRIPTION_MODEL")
                .unwrap_or(defaults.transcription_model),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            completion_max_attempts: parse_var(
                "COMPLETION_MAX_ATTEMPTS",
                defaults.completion_max_attempts,
            )?,
        };

        config.check()?;
        if config.completion.api_key.is_none() {
            warn!("COMPLETION_API_KEY is not set; completion calls will fall back to templated answers");
        }
        Ok(config)
    }

    /// Validates ranges and that both base URLs parse.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        Url::parse(&self.park_data_base_url)?;
        Url::parse(&self.completion.base_url)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The call policy applied to completion requests.
    pub fn completion_policy(&self) -> CallPolicy {
        CallPolicy {
            max_attempts: self.completion_max_attempts,
            timeout: self.request_timeout(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}

/// Attempt and timeout limits for one outbound call.
///
/// The defaults describe the current behaviour: a single attempt bounded by a
/// timeout, no backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            timeout: Duration::from_secs(15),
        }
    }
}

impl CallPolicy {
    /// Runs `call` up to `max_attempts` times, each bounded by `timeout`.
    /// Returns the last error when every attempt fails.
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = AppError::Internal(format!("{}: no attempt made", label));

        for attempt in 1..=attempts {
            match tokio::time::timeout(self.timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    warn!("{} attempt {}/{} failed: {}", label, attempt, attempts, e);
                    last_error = e;
                }
                Err(elapsed) => {
                    warn!(
                        "{} attempt {}/{} timed out after {:?}",
                        label, attempt, attempts, self.timeout
                    );
                    last_error = elapsed.into();
                }
            }
        }

        Err(last_error)
    }
}
