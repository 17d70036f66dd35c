use std::sync::Arc;

use carenote_core::{
    Activity, AnalysisResult, CarenoteError, InferenceClient, InferenceOptions,
    JsonOutputParser, SessionDraft, SessionType, StructuredNotes, TherapistAssessment, TreatmentGoal,
};
use carenote_prompt::ChatPromptTemplate;
use serde::Serialize;
use serde_json::Value;

use super::clean_list;
use crate::prompts;
use crate::StageOptions;
use crate::Stage;

/// The analysis stage answers in the stored shape directly.
pub type AnalysisPayload = AnalysisResult;

/// Everything the analysis stage reviews. Field order is fixed, so the
/// rendered prompt does not depend on which upstream stage finished first.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisRequest<'a> {
    pub session_type: SessionType,
    pub duration: u32,
    pub current_progress: u8,
    pub therapist_assessment: &'a TherapistAssessment,
    pub structured_notes: &'a StructuredNotes,
    pub treatment_goals: &'a [TreatmentGoal],
    pub activities: &'a [Activity],
    pub next_session_plan: &'a str,
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(
        draft: &'a SessionDraft,
        structured_notes: &'a StructuredNotes,
        treatment_goals: &'a [TreatmentGoal],
        activities: &'a [Activity],
        next_session_plan: &'a str,
    ) -> Self {
        Self {
            session_type: draft.session_type,
            duration: draft.duration,
            current_progress: draft.current_progress,
            therapist_assessment: &draft.therapist_assessment,
            structured_notes,
            treatment_goals,
            activities,
            next_session_plan,
        }
    }
}

pub struct ComprehensiveAnalyzer {
    client: Arc<dyn InferenceClient>,
    options: InferenceOptions,
    prompt: ChatPromptTemplate,
}

impl ComprehensiveAnalyzer {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            options: StageOptions::default().analysis,
            prompt: prompts::analysis(),
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

    pub async fn analyze(
        &self,
        request: &AnalysisRequest<'_>,
    ) -> Result<AnalysisResult, CarenoteError> {
        let rendered = self.prompt.format(&prompts::vars([
            ("schema", Value::from(prompts::schema_json::<AnalysisPayload>()?)),
            ("session", Value::from(serde_json::to_string_pretty(request)?)),
        ]))?;
        let output = self
            .client
            .infer(&rendered.system, &rendered.user, self.options)
            .await?;

        let parsed = JsonOutputParser::<AnalysisPayload>::new(Stage::Analysis.as_str())
            .parse(&output)?;
        Ok(AnalysisResult {
            insights: clean_list(parsed.insights),
            recommendations: clean_list(parsed.recommendations),
            risk_factors: clean_list(parsed.risk_factors),
            positive_indicators: clean_list(parsed.positive_indicators),
        })
    }
}
