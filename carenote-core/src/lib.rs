//! Core types for the carenote session-processing pipeline.
//!
//! This crate holds the clinical data model, the error taxonomy, and the two
//! seams the pipeline talks through: [`InferenceClient`] for the language
//! inference service and [`SessionStore`] for persistence.

mod error;
mod llm;
mod model;
pub mod output_parsers;
mod retry;
mod stats;
mod store;

pub use error::CarenoteError;
pub use llm::{ensure_prompts, InferenceClient, InferenceOptions};
pub use model::{
    Activity, ActivityType, AnalysisResult, CenterGoal, Emotions, Frequency, GoalPriority,
    GoalStatus, Session, SessionDraft, SessionRecord, SessionStatus, SessionType,
    StructuredNotes, TherapistAssessment, TreatmentGoal, MAX_EMOTION_INTENSITY, MAX_PROGRESS,
};
pub use output_parsers::JsonOutputParser;
pub use retry::{RetryPolicy, RetryingClient};
pub use stats::{GoalStats, SessionStats};
pub use store::SessionStore;
