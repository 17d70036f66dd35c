//! Generic OpenAI-compatible chat-completions client.

use std::time::{Duration, Instant};

use carenote_core::{ensure_prompts, CarenoteError, InferenceClient, InferenceOptions};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{API_KEY_ENV, BASE_URL_ENV, MODEL_ENV};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_PATH: &str = "/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ERROR_BODY: usize = 300;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Request body for the chat completions endpoint
#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Non-streaming response. Only `choices[].message.content` is required.
#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    pub content: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// OpenAI-style error response
#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiError {
    pub error: ErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

pub struct OpenAiCompatibleBuilder {
    base_url: String,
    completions_path: String,
    api_key: Option<SecretString>,
    model: String,
    timeout: Duration,
}

impl Default for OpenAiCompatibleBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            completions_path: DEFAULT_PATH.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OpenAiCompatibleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from `CARENOTE_INFERENCE_*` variables. Unset variables
    /// keep their defaults; a missing API key surfaces at `build()`.
    pub fn from_env() -> Result<Self, CarenoteError> {
        Ok(Self::new()
            .base_url_from_env(BASE_URL_ENV)?
            .api_key_from_env(API_KEY_ENV)
            .model_from_env(MODEL_ENV))
    }

    pub fn base_url(mut self, value: impl AsRef<str>) -> Result<Self, CarenoteError> {
        Url::parse(value.as_ref())
            .map_err(|err| CarenoteError::InvalidConfig(format!("invalid base_url: {err}")))?;
        self.base_url = value.as_ref().to_string();
        Ok(self)
    }

    pub fn completions_path(mut self, value: impl Into<String>) -> Self {
        self.completions_path = value.into();
        self
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(value.into()));
        self
    }

    pub fn model(mut self, value: impl Into<String>) -> Self {
        self.model = value.into();
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = value;
        self
    }

    pub fn base_url_from_env(self, var_name: &str) -> Result<Self, CarenoteError> {
        match std::env::var(var_name) {
            Ok(value) => self.base_url(value),
            Err(_) => Ok(self),
        }
    }

    pub fn api_key_from_env(mut self, var_name: &str) -> Self {
        if let Ok(value) = std::env::var(var_name) {
            self.api_key = Some(SecretString::new(value));
        }
        self
    }

    pub fn model_from_env(mut self, var_name: &str) -> Self {
        if let Ok(value) = std::env::var(var_name) {
            self.model = value;
        }
        self
    }

    pub fn build(self) -> Result<OpenAiCompatibleClient, CarenoteError> {
        let api_key = self
            .api_key
            .ok_or_else(|| CarenoteError::InvalidConfig("api_key is required".to_string()))?;
        if api_key.expose_secret().trim().is_empty() {
            return Err(CarenoteError::InvalidConfig(
                "api_key cannot be empty".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(CarenoteError::InvalidConfig("model cannot be empty".to_string()));
        }

        let endpoint = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.completions_path.trim_start_matches('/')
        );
        let endpoint = Url::parse(&endpoint)
            .map_err(|err| CarenoteError::InvalidConfig(format!("invalid endpoint: {err}")))?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| CarenoteError::InvalidConfig(err.to_string()))?;

        Ok(OpenAiCompatibleClient {
            http,
            endpoint,
            api_key,
            model: self.model,
            timeout: self.timeout,
        })
    }
}

#[derive(Debug)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatibleClient {
    pub fn builder() -> OpenAiCompatibleBuilder {
        OpenAiCompatibleBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn map_transport_error(&self, err: reqwest::Error) -> CarenoteError {
        if err.is_timeout() {
            CarenoteError::inference(None, format!("request timed out after {:?}", self.timeout))
        } else {
            CarenoteError::inference(None, format!("transport failure: {err}"))
        }
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<String, CarenoteError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OpenAiError>(&body) {
                Ok(parsed) => parsed.error.message,
                Err(_) if body.trim().is_empty() => status
                    .canonical_reason()
                    .unwrap_or("unknown inference error")
                    .to_string(),
                Err(_) => truncate(body.trim(), MAX_ERROR_BODY),
            };
            return Err(CarenoteError::inference(Some(status.as_u16()), message));
        }

        let body = response.text().await.map_err(|err| self.map_transport_error(err))?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|err| {
            CarenoteError::inference(Some(status.as_u16()), format!("malformed response: {err}"))
        })?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "inference usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                CarenoteError::inference(
                    Some(status.as_u16()),
                    "malformed response: no message content",
                )
            })
    }
}

#[async_trait::async_trait]
impl InferenceClient for OpenAiCompatibleClient {
    async fn infer(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: InferenceOptions,
    ) -> Result<String, CarenoteError> {
        ensure_prompts(system_prompt, user_prompt)?;

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: ChatRole::System,
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: ChatRole::User,
                    content: user_prompt.to_string(),
                },
            ],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let started = Instant::now();
        tracing::debug!(
            model = %self.model,
            max_tokens = options.max_tokens,
            prompt_chars = system_prompt.len() + user_prompt.len(),
            "sending inference request"
        );
        let result = self.send(&request).await;
        match &result {
            Ok(content) => tracing::debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                output_chars = content.len(),
                "inference request completed"
            ),
            Err(err) => tracing::warn!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "inference request failed"
            ),
        }
        result
    }
}

fn truncate(input: &str, max: usize) -> String {
    if input.len() <= max {
        return input.to_string();
    }
    let mut end = max;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &input[..end])
}
