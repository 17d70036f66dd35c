#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use carenote_core::{
    Activity, CarenoteError, CenterGoal, GoalStats, InferenceClient, InferenceOptions,
    RetryPolicy, Session, SessionDraft, SessionRecord, SessionStats, SessionStore,
    TreatmentGoal,
};
use carenote_pipeline::{PipelineConfig, PipelineObserver, PipelineState, Stage};
use carenote_store::InMemorySessionStore;

pub const ARABIC_NOTES: &str = "المريض متعاون وبدا تحسن ملحوظ";

pub const NOTES_REPLY: &str = r#"{
  "processed_notes": "المريض متعاون خلال الجلسة ويظهر تحسناً ملحوظاً في المزاج.",
  "summary": "جلسة إيجابية مع تحسن ملحوظ",
  "emotions": {"primary_emotion": "متفائل", "intensity": 6, "secondary_emotions": ["هادئ", " هادئ "]}
}"#;

pub const GOALS_REPLY: &str = "```json\n{\"goals\": [\
{\"title\": \"تحسين التواصل\", \"description\": \"المشاركة في الحوار\", \"priority\": \"high\", \"progress\": 35, \"status\": \"in_progress\"},\
{\"title\": \"تنظيم النوم\", \"description\": \"روتين نوم ثابت\", \"priority\": \"medium\", \"progress\": 0, \"status\": \"not_started\"}\
]}\n```";

pub const ACTIVITIES_REPLY: &str = r#"Here are the activities:
{"activities": [{"title": "تمارين التنفس", "description": "عشر دقائق يومياً", "type": "individual", "duration": 10, "frequency": "daily"}]}"#;

pub const PLAN_REPLY: &str = "Review the breathing exercises and continue building rapport.";

pub const ANALYSIS_REPLY: &str = r#"{
  "insights": ["تعاون جيد"],
  "recommendations": ["الاستمرار في الخطة الحالية"],
  "riskFactors": [],
  "positiveIndicators": ["تحسن المزاج"]
}"#;

#[derive(Clone, Debug)]
pub enum Reply {
    Text(String),
    Error { status: Option<u16>, message: String },
    /// Never answers.
    Hang,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }

    pub fn status(code: u16) -> Self {
        Reply::Error {
            status: Some(code),
            message: format!("upstream returned {code}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Call {
    pub stage: Stage,
    pub system: String,
    pub user: String,
    pub options: InferenceOptions,
}

/// In-process inference fake that answers by stage, recognised from the
/// system prompt.
pub struct ScriptedClient {
    defaults: HashMap<Stage, Reply>,
    queued: Mutex<HashMap<Stage, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn healthy() -> Self {
        let defaults = HashMap::from([
            (Stage::Structuring, Reply::text(NOTES_REPLY)),
            (Stage::Goals, Reply::text(GOALS_REPLY)),
            (Stage::Activities, Reply::text(ACTIVITIES_REPLY)),
            (Stage::Planning, Reply::text(PLAN_REPLY)),
            (Stage::Analysis, Reply::text(ANALYSIS_REPLY)),
        ]);
        Self {
            defaults,
            queued: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the standing reply for `stage`.
    pub fn with_reply(mut self, stage: Stage, reply: Reply) -> Self {
        self.defaults.insert(stage, reply);
        self
    }

    /// Queues a one-shot reply served before the standing one.
    pub fn then(self, stage: Stage, reply: Reply) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(stage)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, stage: Stage) -> usize {
        self.calls().iter().filter(|call| call.stage == stage).count()
    }

    fn classify(system: &str) -> Stage {
        if system.contains("clinical documentation assistant") {
            Stage::Structuring
        } else if system.contains("treatment planning assistant") {
            Stage::Goals
        } else if system.contains("therapy activity planner") {
            Stage::Activities
        } else if system.contains("preparing the next therapy") {
            Stage::Planning
        } else if system.contains("reviewing a completed therapy") {
            Stage::Analysis
        } else {
            panic!("unrecognised system prompt: {system}")
        }
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    async fn infer(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: InferenceOptions,
    ) -> Result<String, CarenoteError> {
        let stage = Self::classify(system_prompt);
        self.calls.lock().unwrap().push(Call {
            stage,
            system: system_prompt.to_string(),
            user: user_prompt.to_string(),
            options,
        });

        let reply = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&stage)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.defaults.get(&stage).cloned())
            .unwrap_or(Reply::Hang);

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Error { status, message } => Err(CarenoteError::inference(status, message)),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureMode {
    /// Rejects the write without storing anything.
    BeforeWrite,
    /// Stores the session but reports failure, like a lost acknowledgement.
    AfterWrite,
    /// Never answers.
    Hang,
}

/// Wraps the in-memory store and fails the next `failures` writes.
pub struct FlakyStore {
    pub inner: InMemorySessionStore,
    failures: AtomicUsize,
    mode: FailureMode,
    pub writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(failures: usize, mode: FailureMode) -> Self {
        Self {
            inner: InMemorySessionStore::new(),
            failures: AtomicUsize::new(failures),
            mode,
            writes: AtomicUsize::new(0),
        }
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn create_session(&self, record: SessionRecord) -> Result<Session, CarenoteError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if !self.take_failure() {
            return self.inner.create_session(record).await;
        }
        match self.mode {
            FailureMode::BeforeWrite => {}
            FailureMode::AfterWrite => {
                self.inner.create_session(record).await?;
            }
            FailureMode::Hang => return std::future::pending().await,
        }
        Err(CarenoteError::Persistence("connection reset".to_string()))
    }

    async fn get_sessions(&self) -> Result<Vec<Session>, CarenoteError> {
        self.inner.get_sessions().await
    }

    async fn get_treatment_goals(&self) -> Result<Vec<TreatmentGoal>, CarenoteError> {
        self.inner.get_treatment_goals().await
    }

    async fn get_activities(&self) -> Result<Vec<Activity>, CarenoteError> {
        self.inner.get_activities().await
    }

    async fn get_center_goals(&self) -> Result<Vec<CenterGoal>, CarenoteError> {
        self.inner.get_center_goals().await
    }

    async fn get_session_stats(&self) -> Result<SessionStats, CarenoteError> {
        self.inner.get_session_stats().await
    }

    async fn get_goal_stats(&self) -> Result<GoalStats, CarenoteError> {
        self.inner.get_goal_stats().await
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub transitions: Mutex<Vec<(PipelineState, PipelineState)>>,
    pub started: Mutex<Vec<Stage>>,
    pub finished: Mutex<Vec<Stage>>,
    pub failed: Mutex<Vec<(Stage, String)>>,
}

impl PipelineObserver for RecordingObserver {
    fn on_transition(&self, from: PipelineState, to: PipelineState) {
        self.transitions.lock().unwrap().push((from, to));
    }

    fn on_stage_started(&self, stage: Stage) {
        self.started.lock().unwrap().push(stage);
    }

    fn on_stage_finished(&self, stage: Stage, _elapsed: Duration) {
        self.finished.lock().unwrap().push(stage);
    }

    fn on_stage_failed(&self, stage: Stage, error: &CarenoteError) {
        self.failed.lock().unwrap().push((stage, error.to_string()));
    }
}

pub fn draft() -> SessionDraft {
    SessionDraft::new("patient-1", "therapist-1", ARABIC_NOTES).with_progress(40)
}

/// No retries and a short stage timeout.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        retry: RetryPolicy::no_retry(),
        stage_timeout: Some(Duration::from_secs(5)),
        ..PipelineConfig::default()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn shared(client: ScriptedClient) -> Arc<ScriptedClient> {
    Arc::new(client)
}
