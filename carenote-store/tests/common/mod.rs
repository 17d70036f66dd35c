#![allow(dead_code)]

use carenote_core::{
    Activity, AnalysisResult, Emotions, Frequency, GoalPriority, GoalStatus, SessionDraft,
    SessionRecord, SessionStatus, SessionType, TreatmentGoal,
};
use uuid::Uuid;

pub fn record(patient_id: &str, progress: u8) -> SessionRecord {
    let draft = SessionDraft::new(patient_id, "therapist-1", "patient was cooperative")
        .with_progress(progress);
    SessionRecord {
        attempt_id: Uuid::new_v4(),
        patient_id: draft.patient_id,
        therapist_id: draft.therapist_id,
        session_date: draft.session_date,
        session_time: draft.session_time,
        duration: draft.duration,
        session_type: draft.session_type,
        status: draft.status,
        raw_notes: draft.raw_notes,
        ai_processed_notes: Some("cooperative, improved mood".to_string()),
        session_summary: Some("good session".to_string()),
        emotions: Some(Emotions {
            primary_emotion: "hope".to_string(),
            intensity: 6.5,
            secondary_emotions: vec!["relief".to_string()],
        }),
        treatment_goals: vec![goal("Sleep routine", GoalPriority::High, 20)],
        current_progress: draft.current_progress,
        next_session_plan: "Review sleep diary".to_string(),
        therapist_assessment: draft.therapist_assessment,
        activities_planned: vec![activity("Evening walk")],
        analysis: Some(AnalysisResult::default()),
    }
}

pub fn goal(title: &str, priority: GoalPriority, progress: u8) -> TreatmentGoal {
    TreatmentGoal {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("{title} description"),
        priority,
        progress,
        status: GoalStatus::InProgress,
    }
}

pub fn activity(title: &str) -> Activity {
    Activity {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "gentle exercise".to_string(),
        activity_type: SessionType::Individual,
        duration: 30,
        frequency: Frequency::Daily,
    }
}

pub fn with_status(mut record: SessionRecord, status: SessionStatus, kind: SessionType) -> SessionRecord {
    record.status = status;
    record.session_type = kind;
    record
}
