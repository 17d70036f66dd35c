use std::sync::Arc;

use carenote_core::{
    CarenoteError, GoalPriority, GoalStatus, InferenceClient, InferenceOptions,
    JsonOutputParser, StructuredNotes, TreatmentGoal, MAX_PROGRESS,
};
use carenote_prompt::ChatPromptTemplate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::context::HistoryEntry;
use crate::prompts;
use crate::StageOptions;
use crate::Stage;

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct GoalSuggestion {
    pub title: String,
    pub description: String,
    pub priority: GoalPriority,
    /// 0 to 100.
    pub progress: f64,
    pub status: GoalStatus,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct GoalsPayload {
    pub goals: Vec<GoalSuggestion>,
}

pub struct GoalSuggestionEngine {
    client: Arc<dyn InferenceClient>,
    options: InferenceOptions,
    prompt: ChatPromptTemplate,
}

impl GoalSuggestionEngine {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            options: StageOptions::default().goals,
            prompt: prompts::goals(),
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

    /// Suggests treatment goals. Every goal gets a fresh id; an empty list is
    /// a valid answer.
    pub async fn suggest(
        &self,
        notes: &StructuredNotes,
        history: &[HistoryEntry],
    ) -> Result<Vec<TreatmentGoal>, CarenoteError> {
        let rendered = self.prompt.format(&prompts::vars([
            ("schema", Value::from(prompts::schema_json::<GoalsPayload>()?)),
            ("summary", Value::from(notes.summary.as_str())),
            ("processed_notes", Value::from(notes.processed_notes.as_str())),
            ("primary_emotion", Value::from(notes.emotions.primary_emotion.as_str())),
            ("intensity", json!(notes.emotions.intensity)),
            ("history", Value::from(serde_json::to_string_pretty(history)?)),
        ]))?;
        let output = self
            .client
            .infer(&rendered.system, &rendered.user, self.options)
            .await?;

        let parser = JsonOutputParser::<GoalsPayload>::new(Stage::Goals.as_str());
        let payload = parser.parse(&output)?;

        payload
            .goals
            .into_iter()
            .enumerate()
            .map(|(idx, goal)| {
                let title = goal.title.trim().to_string();
                if title.is_empty() {
                    return Err(parser.error(format!("goals[{idx}].title is empty"), &output));
                }
                if !goal.progress.is_finite() || !(0.0..=f64::from(MAX_PROGRESS)).contains(&goal.progress)
                {
                    return Err(parser.error(
                        format!(
                            "goals[{idx}].progress {} outside 0..={MAX_PROGRESS}",
                            goal.progress
                        ),
                        &output,
                    ));
                }
                Ok(TreatmentGoal {
                    id: Uuid::new_v4(),
                    title,
                    description: goal.description.trim().to_string(),
                    priority: goal.priority,
                    progress: goal.progress.round() as u8,
                    status: goal.status,
                })
            })
            .collect()
    }
}
