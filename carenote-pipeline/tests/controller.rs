mod common;

use std::sync::Arc;
use std::time::Duration;

use carenote_core::{CarenoteError, SessionStore, TherapistAssessment};
use carenote_pipeline::stages::{NextSessionPlanner, NotesStructurer};
use carenote_pipeline::{PatientProgress, PipelineController, PipelineState, Stage, StageOptions};
use carenote_store::InMemorySessionStore;
use common::{
    draft, init_tracing, shared, test_config, FailureMode, FlakyStore, Reply, ScriptedClient,
    ARABIC_NOTES,
};

#[tokio::test]
async fn processes_arabic_notes_end_to_end() {
    init_tracing();
    let client = shared(ScriptedClient::healthy());
    let store = Arc::new(InMemorySessionStore::new());
    let mut controller =
        PipelineController::new(client.clone(), store.clone()).with_config(test_config());

    let record = controller.process(&draft()).await.unwrap();
    assert_eq!(controller.state(), PipelineState::Assembled);
    assert_eq!(record.raw_notes, ARABIC_NOTES);
    assert!(record.ai_processed_notes.as_deref().is_some_and(|notes| !notes.is_empty()));
    assert_eq!(record.session_summary.as_deref(), Some("جلسة إيجابية مع تحسن ملحوظ"));

    let emotions = record.emotions.as_ref().unwrap();
    assert_eq!(emotions.primary_emotion, "متفائل");
    assert!((0.0..=10.0).contains(&emotions.intensity));
    assert_eq!(emotions.secondary_emotions, vec!["هادئ".to_string()]);

    assert_eq!(record.treatment_goals.len(), 2);
    assert!(record.treatment_goals.iter().all(|goal| goal.progress <= 100));
    assert_eq!(record.treatment_goals[0].progress, 35);
    assert_ne!(record.treatment_goals[0].id, record.treatment_goals[1].id);
    assert_eq!(record.activities_planned.len(), 1);
    assert_eq!(record.activities_planned[0].duration, 10);
    assert!(!record.next_session_plan.is_empty());
    let analysis = record.analysis.as_ref().unwrap();
    assert_eq!(analysis.positive_indicators, vec!["تحسن المزاج".to_string()]);
    assert!(analysis.risk_factors.is_empty());

    assert_eq!(client.calls().len(), 5);
    for stage in [
        Stage::Structuring,
        Stage::Goals,
        Stage::Activities,
        Stage::Planning,
        Stage::Analysis,
    ] {
        assert_eq!(client.calls_for(stage), 1, "{stage}");
    }

    assert_eq!(controller.context().attempt_id, Some(record.attempt_id));
    assert_eq!(controller.assembled(), Some(&record));

    let session = controller.save().await.unwrap();
    assert_eq!(controller.state(), PipelineState::Done);
    assert_eq!(session.record, record);

    let stored = store.get_sessions().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, session.id);
}

#[tokio::test]
async fn per_stage_options_reach_the_client() {
    let client = shared(ScriptedClient::healthy());
    let mut controller =
        PipelineController::new(client.clone(), Arc::new(InMemorySessionStore::new()))
            .with_config(test_config());
    controller.process(&draft()).await.unwrap();

    let options = controller.config().stages.clone();
    for call in client.calls() {
        let expected = match call.stage {
            Stage::Structuring => options.structuring,
            Stage::Goals => options.goals,
            Stage::Activities => options.activities,
            Stage::Planning => options.planning,
            Stage::Analysis => options.analysis,
            Stage::Persistence => unreachable!(),
        };
        assert_eq!(call.options, expected, "{}", call.stage);
    }
}

#[tokio::test]
async fn standalone_stages_use_default_stage_options() {
    let client = shared(ScriptedClient::healthy());
    let notes = NotesStructurer::new(client.clone())
        .structure(ARABIC_NOTES)
        .await
        .unwrap();
    NextSessionPlanner::new(client.clone())
        .plan(&notes, &PatientProgress::default())
        .await
        .unwrap();

    let defaults = StageOptions::default();
    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].options, defaults.structuring);
    assert_eq!(calls[1].options, defaults.planning);
}

#[tokio::test]
async fn structuring_prompt_carries_notes_and_schema() {
    let client = shared(ScriptedClient::healthy());
    let mut controller =
        PipelineController::new(client.clone(), Arc::new(InMemorySessionStore::new()))
            .with_config(test_config());
    controller.process(&draft()).await.unwrap();

    let call = client
        .calls()
        .into_iter()
        .find(|call| call.stage == Stage::Structuring)
        .unwrap();
    assert!(call.user.contains(ARABIC_NOTES));
    assert!(call.system.contains("\"processed_notes\""));
    assert!(call.system.contains("same language"));
}

#[tokio::test]
async fn blank_notes_fail_validation_without_inference() {
    for notes in ["", "   ", "\n\t "] {
        let client = shared(ScriptedClient::healthy());
        let mut controller =
            PipelineController::new(client.clone(), Arc::new(InMemorySessionStore::new()));

        let draft = common::draft();
        let draft = carenote_core::SessionDraft {
            raw_notes: notes.to_string(),
            ..draft
        };
        let err = controller.process(&draft).await.unwrap_err();
        assert!(matches!(err, CarenoteError::Validation(_)), "{err}");
        assert_eq!(controller.state(), PipelineState::Failed);
        assert!(client.calls().is_empty());
    }
}

#[tokio::test]
async fn out_of_range_draft_fields_fail_validation() {
    let client = shared(ScriptedClient::healthy());
    let mut controller =
        PipelineController::new(client.clone(), Arc::new(InMemorySessionStore::new()));

    let err = controller
        .process(&draft().with_progress(101))
        .await
        .unwrap_err();
    assert!(matches!(err, CarenoteError::Validation(_)));

    let assessment = TherapistAssessment {
        patient_cooperation: 0,
        ..TherapistAssessment::default()
    };
    let err = controller
        .process(&draft().with_assessment(assessment))
        .await
        .unwrap_err();
    assert!(matches!(err, CarenoteError::Validation(_)));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn save_requires_assembled_state() {
    let client = shared(ScriptedClient::healthy());
    let store = Arc::new(InMemorySessionStore::new());
    let mut controller = PipelineController::new(client, store.clone());

    let err = controller.save().await.unwrap_err();
    assert!(matches!(err, CarenoteError::Precondition { ref action, .. } if action == "save"));
    assert_eq!(controller.state(), PipelineState::Idle);

    let _ = controller.process(&draft().with_duration(0)).await.unwrap_err();
    assert_eq!(controller.state(), PipelineState::Failed);
    let err = controller.save().await.unwrap_err();
    assert!(matches!(err, CarenoteError::Precondition { ref state, .. } if state == "failed"));
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn process_is_rejected_until_reset() {
    let client = shared(ScriptedClient::healthy());
    let mut controller =
        PipelineController::new(client.clone(), Arc::new(InMemorySessionStore::new()))
            .with_config(test_config());

    controller.process(&draft()).await.unwrap();
    let err = controller.process(&draft()).await.unwrap_err();
    assert!(matches!(err, CarenoteError::Precondition { ref action, .. } if action == "process"));
    assert_eq!(controller.state(), PipelineState::Assembled);

    controller.save().await.unwrap();
    assert!(controller.process(&draft()).await.is_err());

    controller.reset();
    assert_eq!(controller.state(), PipelineState::Idle);
    assert!(controller.context().is_empty());
    assert!(controller.assembled().is_none());

    controller.process(&draft()).await.unwrap();
    assert_eq!(client.calls().len(), 10);
}

#[tokio::test]
async fn failed_write_keeps_record_and_retry_stores_once() {
    for mode in [FailureMode::BeforeWrite, FailureMode::AfterWrite] {
        let client = shared(ScriptedClient::healthy());
        let store = Arc::new(FlakyStore::new(1, mode));
        let mut controller =
            PipelineController::new(client.clone(), store.clone()).with_config(test_config());

        let record = controller.process(&draft()).await.unwrap();
        let err = controller.save().await.unwrap_err();
        assert!(matches!(err, CarenoteError::Persistence(_)), "{mode:?}");
        assert_eq!(controller.state(), PipelineState::Assembled);
        assert_eq!(controller.assembled(), Some(&record));

        let session = controller.save().await.unwrap();
        assert_eq!(controller.state(), PipelineState::Done);
        assert_eq!(session.record.attempt_id, record.attempt_id);

        let stored = store.get_sessions().await.unwrap();
        assert_eq!(stored.len(), 1, "{mode:?}");
        assert_eq!(stored[0].id, session.id);
        // persistence retries never re-run inference
        assert_eq!(client.calls().len(), 5);
    }
}

#[tokio::test]
async fn patient_context_loads_from_store() {
    let client = shared(ScriptedClient::healthy());
    let store = Arc::new(InMemorySessionStore::new());
    let mut controller =
        PipelineController::new(client.clone(), store.clone()).with_config(test_config());
    controller.process(&draft()).await.unwrap();
    controller.save().await.unwrap();

    let context = controller.load_patient_context("patient-1").await.unwrap();
    assert_eq!(context.history.len(), 1);
    assert_eq!(context.progress.current_progress, Some(40));
    assert_eq!(context.progress.active_goals.len(), 2);

    let other = controller.load_patient_context("patient-2").await.unwrap();
    assert!(other.history.is_empty());
    assert_eq!(other.profile.patient_id, "patient-2");
}

#[tokio::test]
async fn dropped_save_can_be_retried() {
    let client = shared(ScriptedClient::healthy());
    let store = Arc::new(FlakyStore::new(1, FailureMode::Hang));
    let mut controller =
        PipelineController::new(client.clone(), store.clone()).with_config(test_config());

    let record = controller.process(&draft()).await.unwrap();
    let dropped = tokio::time::timeout(Duration::from_millis(50), controller.save()).await;
    assert!(dropped.is_err());
    assert_eq!(controller.state(), PipelineState::Assembled);
    assert_eq!(controller.assembled(), Some(&record));

    let session = controller.save().await.unwrap();
    assert_eq!(controller.state(), PipelineState::Done);
    assert_eq!(session.record.attempt_id, record.attempt_id);
    assert_eq!(store.get_sessions().await.unwrap().len(), 1);
    assert_eq!(client.calls().len(), 5);
}

#[tokio::test]
async fn dropped_attempt_settles_as_failed() {
    let client = shared(ScriptedClient::healthy().then(Stage::Goals, Reply::Hang));
    let store = Arc::new(InMemorySessionStore::new());
    let mut controller = PipelineController::new(client.clone(), store.clone()).with_config(
        carenote_pipeline::PipelineConfig {
            stage_timeout: None,
            ..test_config()
        },
    );

    let dropped = tokio::time::timeout(Duration::from_millis(50), controller.process(&draft())).await;
    assert!(dropped.is_err());
    assert_eq!(controller.state(), PipelineState::Failed);
    assert!(controller.context().is_empty());
    assert!(controller.assembled().is_none());

    let err = controller.save().await.unwrap_err();
    assert!(matches!(err, CarenoteError::Precondition { ref state, .. } if state == "failed"));

    controller.process(&draft()).await.unwrap();
    controller.save().await.unwrap();
    assert_eq!(store.len().unwrap(), 1);
}
