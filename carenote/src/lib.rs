//! Turns therapists' free-text session notes into structured clinical
//! records with treatment goals, activities, a next-session plan and a
//! risk/insight analysis.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use carenote::prelude::*;
//!
//! # async fn run() -> Result<(), CarenoteError> {
//! let client = OpenAiCompatibleBuilder::from_env()?.build()?;
//! let store = InMemorySessionStore::new();
//!
//! let mut controller = PipelineController::new(Arc::new(client), Arc::new(store));
//! let draft = SessionDraft::new("patient-1", "therapist-1", "Patient was cooperative today.");
//! let record = controller.process(&draft).await?;
//! println!("{} goals suggested", record.treatment_goals.len());
//! controller.save().await?;
//! # Ok(())
//! # }
//! ```

pub use carenote_core as core;
pub use carenote_prompt as prompt;

#[cfg(feature = "openai")]
pub use carenote_llm as llm;
#[cfg(feature = "pipeline")]
pub use carenote_pipeline as pipeline;
#[cfg(feature = "store")]
pub use carenote_store as store;

pub mod prelude {
    pub use carenote_core::{
        Activity, AnalysisResult, CarenoteError, Emotions, InferenceClient, InferenceOptions,
        RetryPolicy, RetryingClient, Session, SessionDraft, SessionRecord, SessionStore,
        StructuredNotes, TherapistAssessment, TreatmentGoal,
    };
    pub use carenote_prompt::{ChatPromptTemplate, PromptTemplate};

    #[cfg(feature = "openai")]
    pub use carenote_llm::{OpenAiCompatibleBuilder, OpenAiCompatibleClient};
    #[cfg(feature = "pipeline")]
    pub use carenote_pipeline::{
        CancellationToken, PatientContext, PipelineConfig, PipelineController, PipelineObserver,
        PipelineOptions, PipelineState, Scheduling,
    };
    #[cfg(feature = "store")]
    pub use carenote_store::{FileSessionStore, InMemorySessionStore};
}
