//! Inference boundary for carenote.
//!
//! Speaks the OpenAI chat-completions wire format, which most hosted and
//! self-hosted providers accept. Credentials are read at runtime (builder or
//! environment) and never compiled in.
//!
//! Environment variables read by [`OpenAiCompatibleBuilder::from_env`]:
//! - `CARENOTE_INFERENCE_API_KEY`
//! - `CARENOTE_INFERENCE_BASE_URL` (optional)
//! - `CARENOTE_INFERENCE_MODEL` (optional)

pub mod openai_compatible;

pub use openai_compatible::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole, OpenAiCompatibleBuilder,
    OpenAiCompatibleClient,
};
pub use carenote_core::{InferenceClient, InferenceOptions};

pub const API_KEY_ENV: &str = "CARENOTE_INFERENCE_API_KEY";
pub const BASE_URL_ENV: &str = "CARENOTE_INFERENCE_BASE_URL";
pub const MODEL_ENV: &str = "CARENOTE_INFERENCE_MODEL";
