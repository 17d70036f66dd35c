use std::sync::Arc;

use carenote_core::{
    CarenoteError, Emotions, InferenceClient, InferenceOptions, JsonOutputParser,
    StructuredNotes,
};
use carenote_prompt::ChatPromptTemplate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::clean_list;
use crate::prompts;
use crate::StageOptions;
use crate::Stage;

/// Expected answer of the structuring stage.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct NotesPayload {
    pub processed_notes: String,
    pub summary: String,
    pub emotions: Emotions,
}

/// Turns raw therapist notes into organized notes, a summary and an
/// emotional reading.
pub struct NotesStructurer {
    client: Arc<dyn InferenceClient>,
    options: InferenceOptions,
    prompt: ChatPromptTemplate,
}

impl NotesStructurer {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            options: StageOptions::default().structuring,
            prompt: prompts::structuring(),
        }
    }

    pub fn with_options(mut self, options: InferenceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_prompt(mut self, prompt: ChatPromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub async fn structure(&self, raw_notes: &str) -> Result<StructuredNotes, CarenoteError> {
        if raw_notes.trim().is_empty() {
            return Err(CarenoteError::Validation("raw_notes is empty".to_string()));
        }

        let rendered = self.prompt.format(&prompts::vars([
            ("schema", Value::from(prompts::schema_json::<NotesPayload>()?)),
            ("raw_notes", Value::from(raw_notes.trim())),
        ]))?;
        let output = self
            .client
            .infer(&rendered.system, &rendered.user, self.options)
            .await?;

        let parser = JsonOutputParser::<NotesPayload>::new(Stage::Structuring.as_str());
        let payload = parser.parse(&output)?;

        let processed_notes = payload.processed_notes.trim().to_string();
        if processed_notes.is_empty() {
            return Err(parser.error("processed_notes is empty", &output));
        }
        let summary = payload.summary.trim().to_string();
        if summary.is_empty() {
            return Err(parser.error("summary is empty", &output));
        }
        let emotions = Emotions {
            primary_emotion: payload.emotions.primary_emotion.trim().to_string(),
            intensity: payload.emotions.intensity,
            secondary_emotions: clean_list(payload.emotions.secondary_emotions),
        };
        emotions
            .validate()
            .map_err(|reason| parser.error(reason, &output))?;

        Ok(StructuredNotes {
            processed_notes,
            summary,
            emotions,
        })
    }
}
