use std::time::Duration;

use carenote_core::CarenoteError;

use crate::{PipelineState, Stage};

/// Hooks into a controller's progress. Every method defaults to a no-op.
///
/// Callbacks run inline on the pipeline task and must not block.
pub trait PipelineObserver: Send + Sync {
    fn on_transition(&self, _from: PipelineState, _to: PipelineState) {}
    fn on_stage_started(&self, _stage: Stage) {}
    fn on_stage_finished(&self, _stage: Stage, _elapsed: Duration) {}
    fn on_stage_failed(&self, _stage: Stage, _error: &CarenoteError) {}
}
