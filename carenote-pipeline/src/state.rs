use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    Validating,
    /// Structuring the raw notes.
    Inferring,
    SuggestingGoals,
    SuggestingActivities,
    Planning,
    Analyzing,
    Assembled,
    Persisting,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Validating => "validating",
            PipelineState::Inferring => "inferring(structuring)",
            PipelineState::SuggestingGoals => "suggesting_goals",
            PipelineState::SuggestingActivities => "suggesting_activities",
            PipelineState::Planning => "planning",
            PipelineState::Analyzing => "analyzing",
            PipelineState::Assembled => "assembled",
            PipelineState::Persisting => "persisting",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }

    /// `Done` and `Failed` end an attempt. A controller in `Failed` still
    /// accepts a fresh attempt.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// States that only exist while `process_with` or `save` is running.
    pub fn is_in_flight(self) -> bool {
        !matches!(
            self,
            PipelineState::Idle
                | PipelineState::Assembled
                | PipelineState::Done
                | PipelineState::Failed
        )
    }

    /// Where an interrupted operation lands: a dropped write falls back to
    /// `Assembled`, a dropped attempt to `Failed`. Resting states map to
    /// themselves.
    pub fn settled(self) -> PipelineState {
        match self {
            PipelineState::Persisting => PipelineState::Assembled,
            state if state.is_in_flight() => PipelineState::Failed,
            state => state,
        }
    }

    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;

        match (self, next) {
            (_, Idle) => true,
            (from, Failed) => !from.is_terminal(),
            (Idle | Failed, Validating) => true,
            (Validating, Inferring) => true,
            (Inferring, SuggestingGoals) => true,
            (SuggestingGoals, SuggestingActivities) => true,
            // concurrent fan-out joins straight into analysis
            (SuggestingGoals, Analyzing) => true,
            (SuggestingActivities, Planning) => true,
            (Planning, Analyzing) => true,
            (Analyzing, Assembled) => true,
            (Assembled, Persisting) => true,
            (Persisting, Done) => true,
            // failed write keeps the assembled record for another save
            (Persisting, Assembled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Units of work that call the inference service or the store.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Structuring,
    Goals,
    Activities,
    Planning,
    Analysis,
    Persistence,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Structuring => "structuring",
            Stage::Goals => "goals",
            Stage::Activities => "activities",
            Stage::Planning => "planning",
            Stage::Analysis => "analysis",
            Stage::Persistence => "persistence",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
