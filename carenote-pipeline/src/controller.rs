use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use carenote_core::{
    CarenoteError, InferenceClient, RetryingClient, Session, SessionDraft, SessionRecord,
    SessionStore,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::stages::{
    ActivitySuggestionEngine, AnalysisRequest, ComprehensiveAnalyzer, GoalSuggestionEngine,
    NextSessionPlanner, NotesStructurer,
};
use crate::{
    AttemptContext, PatientContext, PipelineConfig, PipelineObserver, PipelineState, Scheduling,
    SessionRecordAssembler, Stage,
};

/// Drives one session draft through structuring, derivation, analysis,
/// assembly and persistence.
///
/// A controller owns at most one in-flight attempt; `&mut self` on
/// [`process_with`](Self::process_with) and [`save`](Self::save) makes
/// concurrent attempts on the same controller impossible.
pub struct PipelineController {
    client: Arc<dyn InferenceClient>,
    store: Arc<dyn SessionStore>,
    config: PipelineConfig,
    observers: Vec<Arc<dyn PipelineObserver>>,
    state: PipelineState,
    context: AttemptContext,
    assembled: Option<SessionRecord>,
}

impl PipelineController {
    pub fn new(client: Arc<dyn InferenceClient>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            config: PipelineConfig::default(),
            observers: Vec::new(),
            state: PipelineState::Idle,
            context: AttemptContext::default(),
            assembled: None,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current state. Operations take `&mut self`, so an in-flight state
    /// seen here belongs to a dropped future and is reported settled.
    pub fn state(&self) -> PipelineState {
        self.state.settled()
    }

    /// Committed derivations. Empty unless the controller is `Assembled` or
    /// `Done`.
    pub fn context(&self) -> &AttemptContext {
        &self.context
    }

    pub fn assembled(&self) -> Option<&SessionRecord> {
        self.assembled.as_ref()
    }

    /// Loads earlier sessions of `patient_id` from the store as context for
    /// the derivation stages.
    pub async fn load_patient_context(
        &self,
        patient_id: &str,
    ) -> Result<PatientContext, CarenoteError> {
        let sessions = self.store.get_sessions().await?;
        Ok(PatientContext::from_sessions(patient_id, &sessions))
    }

    pub async fn process(&mut self, draft: &SessionDraft) -> Result<SessionRecord, CarenoteError> {
        self.process_with(draft, &PatientContext::default(), &CancellationToken::new())
            .await
    }

    /// Runs one attempt. Accepted from `Idle` and `Failed`.
    ///
    /// On success the controller is `Assembled` and holds the record for
    /// [`save`](Self::save). On failure it is `Failed` and the committed
    /// context is left as it was before the attempt.
    pub async fn process_with(
        &mut self,
        draft: &SessionDraft,
        patient: &PatientContext,
        cancel: &CancellationToken,
    ) -> Result<SessionRecord, CarenoteError> {
        self.settle();
        if !matches!(self.state, PipelineState::Idle | PipelineState::Failed) {
            return Err(CarenoteError::precondition("process", self.state));
        }

        let attempt_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "pipeline_attempt",
            %attempt_id,
            patient_id = %draft.patient_id
        );
        let started = Instant::now();

        let outcome = self
            .run_attempt(attempt_id, draft, patient, cancel)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match outcome {
            Ok((context, record)) => {
                self.context = context;
                self.assembled = Some(record.clone());
                self.advance(PipelineState::Assembled);
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    goals = record.treatment_goals.len(),
                    activities = record.activities_planned.len(),
                    "session assembled"
                );
                Ok(record)
            }
            Err(error) => {
                tracing::error!(state = %self.state, error = %error, "pipeline attempt failed");
                self.advance(PipelineState::Failed);
                Err(error)
            }
        }
    }

    /// Persists the assembled record. Only accepted in `Assembled`.
    ///
    /// A store failure returns the controller to `Assembled` with the same
    /// record, so calling `save` again cannot write a second session.
    pub async fn save(&mut self) -> Result<Session, CarenoteError> {
        self.settle();
        if self.state != PipelineState::Assembled {
            return Err(CarenoteError::precondition("save", self.state));
        }
        let Some(record) = self.assembled.clone() else {
            return Err(CarenoteError::IncompleteAssembly {
                missing: vec!["assembled record".to_string()],
            });
        };

        let attempt_id = record.attempt_id;
        self.advance(PipelineState::Persisting);
        self.notify(|observer| observer.on_stage_started(Stage::Persistence));
        let started = Instant::now();

        match self.store.create_session(record).await {
            Ok(session) => {
                self.notify(|observer| {
                    observer.on_stage_finished(Stage::Persistence, started.elapsed())
                });
                tracing::info!(%attempt_id, session_id = %session.id, "session persisted");
                self.advance(PipelineState::Done);
                Ok(session)
            }
            Err(error) => {
                let error = match error {
                    CarenoteError::Persistence(_) => error,
                    other => CarenoteError::Persistence(other.to_string()),
                };
                self.notify(|observer| observer.on_stage_failed(Stage::Persistence, &error));
                tracing::error!(%attempt_id, error = %error, "session write failed");
                self.advance(PipelineState::Assembled);
                Err(error)
            }
        }
    }

    /// Back to `Idle`, discarding the committed context and any assembled
    /// record.
    pub fn reset(&mut self) {
        self.settle();
        self.context = AttemptContext::default();
        self.assembled = None;
        self.advance(PipelineState::Idle);
    }

    async fn run_attempt(
        &mut self,
        attempt_id: Uuid,
        draft: &SessionDraft,
        patient: &PatientContext,
        cancel: &CancellationToken,
    ) -> Result<(AttemptContext, SessionRecord), CarenoteError> {
        self.advance(PipelineState::Validating);
        draft.validate()?;

        let stages = Stages::new(self.client.clone(), &self.config);
        let observers = self.observers.clone();
        let runner = StageRunner {
            observers: &observers,
            cancel,
            timeout: self.config.stage_timeout,
        };

        self.advance(PipelineState::Inferring);
        let notes = runner
            .run(Stage::Structuring, stages.notes.structure(&draft.raw_notes))
            .await?;

        self.advance(PipelineState::SuggestingGoals);
        let (goals, activities, plan) = match self.config.scheduling {
            Scheduling::Concurrent => tokio::try_join!(
                runner.run(Stage::Goals, stages.goals.suggest(&notes, &patient.history)),
                runner.run(
                    Stage::Activities,
                    stages.activities.suggest(&notes, &patient.profile)
                ),
                runner.run(Stage::Planning, stages.planner.plan(&notes, &patient.progress)),
            )?,
            Scheduling::Sequential => {
                let goals = runner
                    .run(Stage::Goals, stages.goals.suggest(&notes, &patient.history))
                    .await?;
                self.advance(PipelineState::SuggestingActivities);
                let activities = runner
                    .run(
                        Stage::Activities,
                        stages.activities.suggest(&notes, &patient.profile),
                    )
                    .await?;
                self.advance(PipelineState::Planning);
                let plan = runner
                    .run(Stage::Planning, stages.planner.plan(&notes, &patient.progress))
                    .await?;
                (goals, activities, plan)
            }
        };

        self.advance(PipelineState::Analyzing);
        let request = AnalysisRequest::new(draft, &notes, &goals, &activities, &plan);
        let analysis = runner
            .run(Stage::Analysis, stages.analyzer.analyze(&request))
            .await?;

        let context = AttemptContext {
            attempt_id: Some(attempt_id),
            structured_notes: Some(notes),
            treatment_goals: Some(goals),
            activities: Some(activities),
            next_session_plan: Some(plan),
            analysis: Some(analysis),
        };
        let record = SessionRecordAssembler::assemble(draft, &context)?;
        Ok((context, record))
    }

    /// Recovers from a `process_with` or `save` future that was dropped
    /// before it finished. The committed context and assembled record were
    /// never touched by it, so only the state needs repair.
    fn settle(&mut self) {
        let settled = self.state.settled();
        if settled != self.state {
            tracing::warn!(
                from = %self.state,
                to = %settled,
                "pipeline operation was dropped before finishing"
            );
            self.advance(settled);
        }
    }

    fn advance(&mut self, next: PipelineState) {
        let from = self.state;
        if from == next {
            return;
        }
        debug_assert!(
            from.can_transition_to(next),
            "illegal pipeline transition {from} -> {next}"
        );
        self.state = next;
        tracing::info!(from = %from, to = %next, "pipeline transition");
        self.notify(|observer| observer.on_transition(from, next));
    }

    fn notify(&self, event: impl Fn(&dyn PipelineObserver)) {
        for observer in &self.observers {
            event(observer.as_ref());
        }
    }
}

struct Stages {
    notes: NotesStructurer,
    goals: GoalSuggestionEngine,
    activities: ActivitySuggestionEngine,
    planner: NextSessionPlanner,
    analyzer: ComprehensiveAnalyzer,
}

impl Stages {
    fn new(client: Arc<dyn InferenceClient>, config: &PipelineConfig) -> Self {
        let client: Arc<dyn InferenceClient> = if config.retry.max_attempts == 1 {
            client
        } else {
            Arc::new(RetryingClient::new(client, config.retry.clone()))
        };
        let options = &config.stages;
        Self {
            notes: NotesStructurer::new(client.clone()).with_options(options.structuring),
            goals: GoalSuggestionEngine::new(client.clone()).with_options(options.goals),
            activities: ActivitySuggestionEngine::new(client.clone())
                .with_options(options.activities),
            planner: NextSessionPlanner::new(client.clone()).with_options(options.planning),
            analyzer: ComprehensiveAnalyzer::new(client).with_options(options.analysis),
        }
    }
}

/// Wraps a stage future with its tracing span, timeout, cancellation and
/// observer callbacks.
struct StageRunner<'a> {
    observers: &'a [Arc<dyn PipelineObserver>],
    cancel: &'a CancellationToken,
    timeout: Option<Duration>,
}

impl StageRunner<'_> {
    async fn run<T, F>(&self, stage: Stage, work: F) -> Result<T, CarenoteError>
    where
        F: Future<Output = Result<T, CarenoteError>>,
    {
        let span = tracing::info_span!("stage", stage = stage.as_str());
        async {
            for observer in self.observers {
                observer.on_stage_started(stage);
            }
            let started = Instant::now();

            let bounded = async {
                match self.timeout {
                    Some(limit) => match tokio::time::timeout(limit, work).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(CarenoteError::inference(
                            None,
                            format!("{stage} stage timed out after {}ms", limit.as_millis()),
                        )),
                    },
                    None => work.await,
                }
            };

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(CarenoteError::Cancelled),
                outcome = bounded => outcome,
            };

            match &outcome {
                Ok(_) => {
                    let elapsed = started.elapsed();
                    tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "stage finished");
                    for observer in self.observers {
                        observer.on_stage_finished(stage, elapsed);
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "stage failed");
                    for observer in self.observers {
                        observer.on_stage_failed(stage, error);
                    }
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }
}
