//! OpenRouter-backed [`ReasoningService`] speaking the chat-completions
//! protocol.
//!
//! This client performs exactly one HTTP call per `invoke` and classifies
//! failures into [`ReasoningError`] variants. Retry and backoff live in the
//! engine, not here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::backend::{ReasoningError, ReasoningRequest, ReasoningService};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// A chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request for chat completions
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Response from chat completions endpoint
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// A choice in chat completion response
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Error response body
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

/// Error detail
#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for the OpenRouter API
#[derive(Clone)]
pub struct OpenRouterBackend {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterBackend {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }
}

/// Map an unsuccessful HTTP status to its error class.
fn error_for_status(status_code: u16, message: String) -> ReasoningError {
    match status_code {
        429 => ReasoningError::RateLimited { retry_after: None },
        401 | 403 => ReasoningError::Auth(message),
        400 | 404 | 422 => ReasoningError::InvalidRequest(message),
        _ => ReasoningError::Api {
            message,
            status_code: Some(status_code),
        },
    }
}

#[async_trait]
impl ReasoningService for OpenRouterBackend {
    async fn invoke(&self, request: ReasoningRequest<'_>) -> Result<String, ReasoningError> {
        debug!(
            phase = request.phase.as_str(),
            role = request.role,
            model = %request.profile.model,
            "sending chat completion"
        );

        let user_content = if request.context_snapshot.is_empty() {
            "No prior findings yet. Begin your analysis.".to_string()
        } else {
            request.context_snapshot.to_string()
        };

        let body = ChatCompletionRequest {
            model: request.profile.model.clone(),
            messages: vec![
                ChatMessage::system(request.instructions),
                ChatMessage::user(user_content),
            ],
            temperature: request.profile.temperature,
            max_tokens: request.profile.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            let message = match serde_json::from_str::<ApiErrorBody>(&error_text) {
                Ok(parsed) => parsed.error.message,
                Err(_) => error_text,
            };

            if status.as_u16() == 429 {
                warn!(role = request.role, "rate limited by OpenRouter");
            } else {
                error!(
                    role = request.role,
                    status = status.as_u16(),
                    "OpenRouter API error: {message}"
                );
            }

            return Err(error_for_status(status.as_u16(), message));
        }

        let completion: ChatCompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ReasoningError::EmptyResponse)
    }
}
