//! Session-processing pipeline.
//!
//! [`PipelineController`] turns a [`SessionDraft`](carenote_core::SessionDraft)
//! into a [`SessionRecord`](carenote_core::SessionRecord) through five
//! inference stages and hands it to a
//! [`SessionStore`](carenote_core::SessionStore):
//!
//! ```text
//! Idle -> Validating -> Inferring(structuring)
//!      -> SuggestingGoals | SuggestingActivities | Planning
//!      -> Analyzing -> Assembled -> Persisting -> Done
//! ```
//!
//! Any failure moves the controller to `Failed` without committing partial
//! results. Goals, activities and plan run concurrently by default; see
//! [`Scheduling`].

mod assembler;
mod config;
mod context;
mod controller;
mod observer;
pub mod prompts;
mod state;
pub mod stages;

pub use assembler::SessionRecordAssembler;
pub use config::{
    PipelineConfig, PipelineOptions, Scheduling, StageOptions, DEFAULT_STAGE_TIMEOUT,
};
pub use context::{AttemptContext, HistoryEntry, PatientContext, PatientProfile, PatientProgress};
pub use controller::PipelineController;
pub use observer::PipelineObserver;
pub use stages::{
    ActivitySuggestionEngine, ComprehensiveAnalyzer, GoalSuggestionEngine, NextSessionPlanner,
    NotesStructurer,
};
pub use state::{PipelineState, Stage};
pub use tokio_util::sync::CancellationToken;
