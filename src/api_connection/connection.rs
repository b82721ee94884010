use std::sync::Arc;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::endpoints::{ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::AppConfig;
use crate::credentials::{CredentialStore, API_KEY_NAME};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("OpenAI API key not configured. Please add your API key in settings to use AI features.")]
    MissingApiKey,
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("OpenAI API error: {status} - {message}")]
    ApiError { status: StatusCode, message: String },
    #[error("No response from OpenAI")]
    EmptyResponse,
}

impl ApiConnectionError {
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiConnectionError::ApiError { status, message } => {
                *status == StatusCode::TOO_MANY_REQUESTS || message.to_lowercase().contains("rate limit")
            }
            _ => false,
        }
    }
}

/// Chat-completion client. Holds no key itself; the credential store is
/// consulted on every call so a key set at runtime takes effect immediately.
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: String,
    model: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ChatClient {
    pub fn new(config: &AppConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            http: Client::new(),
            endpoint: config.api_url.clone(),
            model: config.model.clone(),
            credentials,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.contains(API_KEY_NAME)
    }

    pub fn request(&self, messages: Vec<ChatMessage>, temperature: f32, max_tokens: u32) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let api_key = self
            .credentials
            .get(API_KEY_NAME)
            .ok_or(ApiConnectionError::MissingApiKey)?;

        log::debug!("POST {} (model {})", self.endpoint, request.model);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .unwrap_or_default();
            let message = detail.message.unwrap_or_else(|| "Unknown error".to_string());
            log::warn!(
                "Chat completion failed with {} ({}): {}",
                status,
                detail.error_type.as_deref().unwrap_or("unknown type"),
                message
            );
            Err(ApiConnectionError::ApiError { status, message })
        }
    }

    /// Sends the request and returns the first choice's text.
    pub async fn complete_text(&self, request: ChatCompletionRequest) -> Result<String, ApiConnectionError> {
        let response = self.call_chat_completion(request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or(ApiConnectionError::EmptyResponse)
    }
}
