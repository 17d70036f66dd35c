use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CarenoteError;

pub const MAX_EMOTION_INTENSITY: f32 = 10.0;
pub const MAX_PROGRESS: u8 = 100;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    Individual,
    Group,
    Family,
}

/// Activities share the session taxonomy.
pub type ActivityType = SessionType;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    #[default]
    Completed,
    Cancelled,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    NotStarted,
    InProgress,
    Achieved,
    OnHold,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Emotions {
    pub primary_emotion: String,
    /// 0 (absent) to 10 (overwhelming).
    pub intensity: f32,
    #[serde(default)]
    pub secondary_emotions: Vec<String>,
}

impl Emotions {
    pub fn validate(&self) -> Result<(), String> {
        if self.primary_emotion.trim().is_empty() {
            return Err("primary_emotion is empty".to_string());
        }
        if !self.intensity.is_finite() || !(0.0..=MAX_EMOTION_INTENSITY).contains(&self.intensity)
        {
            return Err(format!(
                "intensity {} outside 0..={MAX_EMOTION_INTENSITY}",
                self.intensity
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TreatmentGoal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: GoalPriority,
    pub progress: u8,
    pub status: GoalStatus,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Activity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Minutes.
    pub duration: u32,
    pub frequency: Frequency,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
    pub positive_indicators: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TherapistAssessment {
    /// 1..=10
    pub patient_cooperation: u8,
    /// 1..=10
    pub session_effectiveness: u8,
    #[serde(default)]
    pub challenges_faced: Vec<String>,
    #[serde(default)]
    pub positive_developments: Vec<String>,
}

impl Default for TherapistAssessment {
    fn default() -> Self {
        Self {
            patient_cooperation: 5,
            session_effectiveness: 5,
            challenges_faced: Vec::new(),
            positive_developments: Vec::new(),
        }
    }
}

/// Output of the structuring stage.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StructuredNotes {
    pub processed_notes: String,
    pub summary: String,
    pub emotions: Emotions,
}

/// A session as entered by the therapist, before any derivation has run.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SessionDraft {
    pub patient_id: String,
    pub therapist_id: String,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    /// Minutes.
    pub duration: u32,
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub raw_notes: String,
    pub current_progress: u8,
    pub therapist_assessment: TherapistAssessment,
}

impl SessionDraft {
    pub fn new(
        patient_id: impl Into<String>,
        therapist_id: impl Into<String>,
        raw_notes: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            patient_id: patient_id.into(),
            therapist_id: therapist_id.into(),
            session_date: now.date_naive(),
            session_time: now.time(),
            duration: 60,
            session_type: SessionType::Individual,
            status: SessionStatus::Completed,
            raw_notes: raw_notes.into(),
            current_progress: 0,
            therapist_assessment: TherapistAssessment::default(),
        }
    }

    pub fn with_session_type(mut self, session_type: SessionType) -> Self {
        self.session_type = session_type;
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = minutes;
        self
    }

    pub fn with_schedule(mut self, date: NaiveDate, time: NaiveTime) -> Self {
        self.session_date = date;
        self.session_time = time;
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.current_progress = progress;
        self
    }

    pub fn with_assessment(mut self, assessment: TherapistAssessment) -> Self {
        self.therapist_assessment = assessment;
        self
    }

    /// Rejects drafts the pipeline must never send to the inference boundary.
    pub fn validate(&self) -> Result<(), CarenoteError> {
        if self.raw_notes.trim().is_empty() {
            return Err(CarenoteError::Validation("raw_notes is empty".to_string()));
        }
        if self.patient_id.trim().is_empty() {
            return Err(CarenoteError::Validation("patient_id is empty".to_string()));
        }
        if self.duration == 0 {
            return Err(CarenoteError::Validation(
                "duration must be greater than 0".to_string(),
            ));
        }
        if self.current_progress > MAX_PROGRESS {
            return Err(CarenoteError::Validation(format!(
                "current_progress {} outside 0..={MAX_PROGRESS}",
                self.current_progress
            )));
        }
        let assessment = &self.therapist_assessment;
        for (name, value) in [
            ("patient_cooperation", assessment.patient_cooperation),
            ("session_effectiveness", assessment.session_effectiveness),
        ] {
            if !(1..=10).contains(&value) {
                return Err(CarenoteError::Validation(format!(
                    "{name} {value} outside 1..=10"
                )));
            }
        }
        Ok(())
    }
}

/// A fully assembled session that has not been persisted yet.
///
/// `attempt_id` identifies the pipeline attempt that produced the record and
/// doubles as the store's dedup key.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SessionRecord {
    pub attempt_id: Uuid,
    pub patient_id: String,
    pub therapist_id: String,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
    pub duration: u32,
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub raw_notes: String,
    pub ai_processed_notes: Option<String>,
    pub session_summary: Option<String>,
    pub emotions: Option<Emotions>,
    pub treatment_goals: Vec<TreatmentGoal>,
    pub current_progress: u8,
    pub next_session_plan: String,
    pub therapist_assessment: TherapistAssessment,
    pub activities_planned: Vec<Activity>,
    pub analysis: Option<AnalysisResult>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: SessionRecord,
}

impl Session {
    pub fn from_record(record: SessionRecord) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            record,
        }
    }
}

/// Organization-level objective tracked by the center, independent of any
/// single patient.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CenterGoal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub target_date: Option<NaiveDate>,
    pub progress: u8,
}

impl CenterGoal {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            target_date: None,
            progress: 0,
        }
    }
}
