use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::CarenoteError;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct InferenceOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl InferenceOptions {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self::new(1000, 0.7)
    }
}

/// One atomic prompt-in, text-out exchange with the inference service.
///
/// Implementations perform a single outbound call and never retry; wrap them
/// in [`crate::RetryingClient`] for bounded retries.
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    async fn infer(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: InferenceOptions,
    ) -> Result<String, CarenoteError>;
}

#[async_trait::async_trait]
impl<T> InferenceClient for Arc<T>
where
    T: InferenceClient + ?Sized,
{
    async fn infer(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: InferenceOptions,
    ) -> Result<String, CarenoteError> {
        (**self).infer(system_prompt, user_prompt, options).await
    }
}

pub fn ensure_prompts(system_prompt: &str, user_prompt: &str) -> Result<(), CarenoteError> {
    if system_prompt.trim().is_empty() {
        return Err(CarenoteError::Validation(
            "system prompt is empty".to_string(),
        ));
    }
    if user_prompt.trim().is_empty() {
        return Err(CarenoteError::Validation("user prompt is empty".to_string()));
    }
    Ok(())
}
