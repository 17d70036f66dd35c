use carenote_core::{
    Activity, AnalysisResult, GoalStatus, Session, StructuredNotes, TreatmentGoal,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything one attempt has derived so far.
///
/// A controller only replaces its context with a fully populated one, so a
/// failed attempt leaves the previous context untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AttemptContext {
    pub attempt_id: Option<Uuid>,
    pub structured_notes: Option<StructuredNotes>,
    pub treatment_goals: Option<Vec<TreatmentGoal>>,
    pub activities: Option<Vec<Activity>>,
    pub next_session_plan: Option<String>,
    pub analysis: Option<AnalysisResult>,
}

impl AttemptContext {
    pub fn new(attempt_id: Uuid) -> Self {
        Self {
            attempt_id: Some(attempt_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub session_date: NaiveDate,
    pub summary: String,
    pub goals: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PatientProfile {
    pub patient_id: String,
    pub age: Option<u8>,
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct PatientProgress {
    pub current_progress: Option<u8>,
    pub active_goals: Vec<TreatmentGoal>,
}

/// Background handed to the goal, activity and planning stages.
///
/// The default is empty; stages then work from the current notes alone.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct PatientContext {
    pub history: Vec<HistoryEntry>,
    pub profile: PatientProfile,
    pub progress: PatientProgress,
}

impl PatientContext {
    pub const MAX_HISTORY: usize = 5;

    pub fn for_patient(patient_id: impl Into<String>) -> Self {
        Self {
            profile: PatientProfile {
                patient_id: patient_id.into(),
                ..PatientProfile::default()
            },
            ..Self::default()
        }
    }

    /// Builds context from earlier sessions of `patient_id`. Other patients'
    /// sessions are ignored. Keeps the most recent [`Self::MAX_HISTORY`]
    /// summaries, oldest first.
    pub fn from_sessions(patient_id: &str, sessions: &[Session]) -> Self {
        let mut own: Vec<&Session> = sessions
            .iter()
            .filter(|session| session.record.patient_id == patient_id)
            .collect();
        own.sort_by_key(|session| (session.record.session_date, session.record.session_time));

        let history = own
            .iter()
            .filter_map(|session| {
                let record = &session.record;
                let summary = record.session_summary.as_deref()?.trim();
                (!summary.is_empty()).then(|| HistoryEntry {
                    session_date: record.session_date,
                    summary: summary.to_string(),
                    goals: record
                        .treatment_goals
                        .iter()
                        .map(|goal| goal.title.clone())
                        .collect(),
                })
            })
            .collect::<Vec<_>>();
        let skip = history.len().saturating_sub(Self::MAX_HISTORY);
        let history = history.into_iter().skip(skip).collect();

        let progress = own
            .last()
            .map(|latest| PatientProgress {
                current_progress: Some(latest.record.current_progress),
                active_goals: latest
                    .record
                    .treatment_goals
                    .iter()
                    .filter(|goal| goal.status != GoalStatus::Achieved)
                    .cloned()
                    .collect(),
            })
            .unwrap_or_default();

        let mut context = Self::for_patient(patient_id);
        context.history = history;
        context.progress = progress;
        context
    }
}
