use std::sync::Arc;

use carenote_core::output_parsers::strip_code_fences;
use carenote_core::{CarenoteError, InferenceClient, InferenceOptions, StructuredNotes};
use carenote_prompt::ChatPromptTemplate;
use serde_json::Value;

use crate::context::PatientProgress;
use crate::prompts;
use crate::StageOptions;
use crate::Stage;

/// Drafts free-text guidance for the next session.
pub struct NextSessionPlanner {
    client: Arc<dyn InferenceClient>,
    options: InferenceOptions,
    prompt: ChatPromptTemplate,
}

impl NextSessionPlanner {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            options: StageOptions::default().planning,
            prompt: prompts::planning(),
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

    pub async fn plan(
        &self,
        notes: &StructuredNotes,
        progress: &PatientProgress,
    ) -> Result<String, CarenoteError> {
        let rendered = self.prompt.format(&prompts::vars([
            ("summary", Value::from(notes.summary.as_str())),
            ("processed_notes", Value::from(notes.processed_notes.as_str())),
            ("progress", Value::from(serde_json::to_string_pretty(progress)?)),
        ]))?;
        let output = self
            .client
            .infer(&rendered.system, &rendered.user, self.options)
            .await?;

        let plan = strip_code_fences(&output).to_string();
        if plan.is_empty() {
            return Err(CarenoteError::schema(
                Stage::Planning.as_str(),
                "plan is empty",
                output,
            ));
        }
        Ok(plan)
    }
}
