use carenote_core::{CarenoteError, SessionDraft, SessionRecord};

use crate::AttemptContext;

/// Combines a draft with a fully populated attempt context.
///
/// Assembly is all-or-nothing: any missing derivation is reported, none is
/// defaulted.
pub struct SessionRecordAssembler;

impl SessionRecordAssembler {
    pub fn assemble(
        draft: &SessionDraft,
        context: &AttemptContext,
    ) -> Result<SessionRecord, CarenoteError> {
        let mut missing = Vec::new();
        if context.attempt_id.is_none() {
            missing.push("attempt_id");
        }
        if context.structured_notes.is_none() {
            missing.push("structured_notes");
        }
        if context.treatment_goals.is_none() {
            missing.push("treatment_goals");
        }
        if context.activities.is_none() {
            missing.push("activities");
        }
        if context.next_session_plan.is_none() {
            missing.push("next_session_plan");
        }
        if context.analysis.is_none() {
            missing.push("analysis");
        }

        let (
            Some(attempt_id),
            Some(notes),
            Some(goals),
            Some(activities),
            Some(plan),
            Some(analysis),
        ) = (
            context.attempt_id,
            context.structured_notes.as_ref(),
            context.treatment_goals.as_ref(),
            context.activities.as_ref(),
            context.next_session_plan.as_ref(),
            context.analysis.as_ref(),
        )
        else {
            return Err(CarenoteError::IncompleteAssembly {
                missing: missing.into_iter().map(str::to_string).collect(),
            });
        };

        Ok(SessionRecord {
            attempt_id,
            patient_id: draft.patient_id.clone(),
            therapist_id: draft.therapist_id.clone(),
            session_date: draft.session_date,
            session_time: draft.session_time,
            duration: draft.duration,
            session_type: draft.session_type,
            status: draft.status,
            raw_notes: draft.raw_notes.clone(),
            ai_processed_notes: Some(notes.processed_notes.clone()),
            session_summary: Some(notes.summary.clone()),
            emotions: Some(notes.emotions.clone()),
            treatment_goals: goals.clone(),
            current_progress: draft.current_progress,
            next_session_plan: plan.clone(),
            therapist_assessment: draft.therapist_assessment.clone(),
            activities_planned: activities.clone(),
            analysis: Some(analysis.clone()),
        })
    }
}
