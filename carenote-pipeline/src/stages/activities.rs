use std::sync::Arc;

use carenote_core::{
    Activity, ActivityType, CarenoteError, Frequency, InferenceClient, InferenceOptions,
    JsonOutputParser, StructuredNotes,
};
use carenote_prompt::ChatPromptTemplate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::context::PatientProfile;
use crate::prompts;
use crate::StageOptions;
use crate::Stage;

const MAX_ACTIVITY_MINUTES: u32 = 480;

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ActivitySuggestion {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Minutes.
    pub duration: u32,
    pub frequency: Frequency,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ActivitiesPayload {
    pub activities: Vec<ActivitySuggestion>,
}

pub struct ActivitySuggestionEngine {
    client: Arc<dyn InferenceClient>,
    options: InferenceOptions,
    prompt: ChatPromptTemplate,
}

impl ActivitySuggestionEngine {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            options: StageOptions::default().activities,
            prompt: prompts::activities(),
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

    pub async fn suggest(
        &self,
        notes: &StructuredNotes,
        profile: &PatientProfile,
    ) -> Result<Vec<Activity>, CarenoteError> {
        let rendered = self.prompt.format(&prompts::vars([
            ("schema", Value::from(prompts::schema_json::<ActivitiesPayload>()?)),
            ("summary", Value::from(notes.summary.as_str())),
            ("primary_emotion", Value::from(notes.emotions.primary_emotion.as_str())),
            ("intensity", json!(notes.emotions.intensity)),
            ("profile", Value::from(serde_json::to_string_pretty(profile)?)),
        ]))?;
        let output = self
            .client
            .infer(&rendered.system, &rendered.user, self.options)
            .await?;

        let parser = JsonOutputParser::<ActivitiesPayload>::new(Stage::Activities.as_str());
        let payload = parser.parse(&output)?;

        payload
            .activities
            .into_iter()
            .enumerate()
            .map(|(idx, activity)| {
                let title = activity.title.trim().to_string();
                if title.is_empty() {
                    return Err(parser.error(format!("activities[{idx}].title is empty"), &output));
                }
                if !(1..=MAX_ACTIVITY_MINUTES).contains(&activity.duration) {
                    return Err(parser.error(
                        format!(
                            "activities[{idx}].duration {} outside 1..={MAX_ACTIVITY_MINUTES}",
                            activity.duration
                        ),
                        &output,
                    ));
                }
                Ok(Activity {
                    id: Uuid::new_v4(),
                    title,
                    description: activity.description.trim().to_string(),
                    activity_type: activity.activity_type,
                    duration: activity.duration,
                    frequency: activity.frequency,
                })
            })
            .collect()
    }
}
