//! Prompt templates for each inference stage.
//!
//! Stages that expect JSON embed the JSON Schema of their payload in the
//! system prompt through the `{{schema}}` placeholder.

use std::collections::HashMap;

use carenote_core::CarenoteError;
use carenote_prompt::ChatPromptTemplate;
use schemars::JsonSchema;
use serde_json::Value;

const LANGUAGE_RULE: &str = "Write every free-text field in the same language as the therapist's notes. \
Never invent facts that are not supported by the notes.";

const STRUCTURING_SYSTEM: &str = "You are a clinical documentation assistant at a therapy center. \
Rewrite the therapist's raw session notes as clear, organized notes, write a short summary of \
the session, and identify the patient's emotional state. Intensity is a number from 0 (absent) \
to 10 (overwhelming). {{language_rule}}\n\n\
Respond with a single JSON object that conforms to this JSON Schema and nothing else:\n{{schema}}";

const STRUCTURING_USER: &str = "Raw session notes:\n{{raw_notes}}";

const GOALS_SYSTEM: &str = "You are a treatment planning assistant at a therapy center. \
Propose one to five concrete, measurable treatment goals for the patient based on the session. \
Priority is one of low, medium or high. Progress is an estimate from 0 to 100 of how far the \
patient already is toward the goal. {{language_rule}}\n\n\
Respond with a single JSON object that conforms to this JSON Schema and nothing else:\n{{schema}}";

const GOALS_USER: &str = "Session summary:\n{{summary}}\n\n\
Organized notes:\n{{processed_notes}}\n\n\
Primary emotion: {{primary_emotion}} (intensity {{intensity}}/10)\n\n\
Earlier sessions (JSON, oldest first, may be empty):\n{{history}}";

const ACTIVITIES_SYSTEM: &str = "You are a therapy activity planner. Suggest one to five \
therapeutic activities suited to the patient. Type is one of individual, group or family. \
Duration is in minutes. Frequency is one of daily, weekly or monthly. {{language_rule}}\n\n\
Respond with a single JSON object that conforms to this JSON Schema and nothing else:\n{{schema}}";

const ACTIVITIES_USER: &str = "Session summary:\n{{summary}}\n\n\
Primary emotion: {{primary_emotion}} (intensity {{intensity}}/10)\n\n\
Patient profile (JSON):\n{{profile}}";

const PLANNING_SYSTEM: &str = "You are a clinical supervisor preparing the next therapy \
session. Write a concise plan covering focus areas, techniques to use and items to follow up \
on. Use plain text, at most 150 words, without JSON or Markdown headings. {{language_rule}}";

const PLANNING_USER: &str = "Session summary:\n{{summary}}\n\n\
Organized notes:\n{{processed_notes}}\n\n\
Current progress (JSON):\n{{progress}}";

const ANALYSIS_SYSTEM: &str = "You are a senior clinician reviewing a completed therapy \
session. Produce categorized observations: insights about the patient, recommendations for \
treatment, risk factors that need attention, and positive indicators. Every list must be \
present; use an empty list when nothing applies. {{language_rule}}\n\n\
Respond with a single JSON object that conforms to this JSON Schema and nothing else:\n{{schema}}";

const ANALYSIS_USER: &str = "Session record (JSON):\n{{session}}";

pub fn structuring() -> ChatPromptTemplate {
    ChatPromptTemplate::new(STRUCTURING_SYSTEM, STRUCTURING_USER)
}

pub fn goals() -> ChatPromptTemplate {
    ChatPromptTemplate::new(GOALS_SYSTEM, GOALS_USER)
}

pub fn activities() -> ChatPromptTemplate {
    ChatPromptTemplate::new(ACTIVITIES_SYSTEM, ACTIVITIES_USER)
}

pub fn planning() -> ChatPromptTemplate {
    ChatPromptTemplate::new(PLANNING_SYSTEM, PLANNING_USER)
}

pub fn analysis() -> ChatPromptTemplate {
    ChatPromptTemplate::new(ANALYSIS_SYSTEM, ANALYSIS_USER)
}

pub(crate) fn schema_json<T: JsonSchema>() -> Result<String, CarenoteError> {
    Ok(serde_json::to_string_pretty(&schemars::schema_for!(T))?)
}

/// Variables shared by every template plus the stage-specific ones.
pub(crate) fn vars<I>(pairs: I) -> HashMap<String, Value>
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    let mut vars: HashMap<String, Value> = pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    vars.insert("language_rule".to_string(), Value::from(LANGUAGE_RULE));
    vars
}
