//! One component per inference stage. Each renders its prompt, makes a
//! single call through the shared [`InferenceClient`](carenote_core::InferenceClient)
//! and validates the answer into domain types.

mod activities;
mod analyzer;
mod goals;
mod notes;
mod planner;

pub use activities::{ActivitiesPayload, ActivitySuggestion, ActivitySuggestionEngine};
pub use analyzer::{AnalysisPayload, AnalysisRequest, ComprehensiveAnalyzer};
pub use goals::{GoalSuggestion, GoalSuggestionEngine, GoalsPayload};
pub use notes::{NotesPayload, NotesStructurer};
pub use planner::NextSessionPlanner;

/// Trims entries and drops blank or repeated ones, keeping first occurrence.
pub(crate) fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !cleaned.iter().any(|seen| seen == item) {
            cleaned.push(item.to_string());
        }
    }
    cleaned
}
