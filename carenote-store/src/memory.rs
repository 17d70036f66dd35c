use std::sync::{Arc, RwLock};

use carenote_core::{
    Activity, CarenoteError, CenterGoal, GoalStats, Session, SessionRecord, SessionStats,
    SessionStore, TreatmentGoal,
};

use crate::{flatten_activities, flatten_goals};

fn poisoned(action: &str) -> CarenoteError {
    CarenoteError::Persistence(format!(
        "cannot {action}: in-memory store lock poisoned by a panicked writer"
    ))
}

#[derive(Default)]
struct Inner {
    sessions: Vec<Session>,
    center_goals: Vec<CenterGoal>,
}

#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_center_goals(goals: Vec<CenterGoal>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                sessions: Vec::new(),
                center_goals: goals,
            })),
        }
    }

    pub fn len(&self) -> Result<usize, CarenoteError> {
        let guard = self.inner.read().map_err(|_| poisoned("count sessions"))?;
        Ok(guard.sessions.len())
    }

    pub fn is_empty(&self) -> Result<bool, CarenoteError> {
        Ok(self.len()? == 0)
    }

    fn read_sessions(&self) -> Result<Vec<Session>, CarenoteError> {
        let guard = self.inner.read().map_err(|_| poisoned("read sessions"))?;
        Ok(guard.sessions.clone())
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, record: SessionRecord) -> Result<Session, CarenoteError> {
        let mut guard = self.inner.write().map_err(|_| poisoned("write session"))?;

        if let Some(existing) = guard
            .sessions
            .iter()
            .find(|session| session.record.attempt_id == record.attempt_id)
        {
            tracing::debug!(attempt_id = %record.attempt_id, "attempt already stored");
            return Ok(existing.clone());
        }

        let session = Session::from_record(record);
        guard.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_sessions(&self) -> Result<Vec<Session>, CarenoteError> {
        self.read_sessions()
    }

    async fn get_treatment_goals(&self) -> Result<Vec<TreatmentGoal>, CarenoteError> {
        Ok(flatten_goals(&self.read_sessions()?))
    }

    async fn get_activities(&self) -> Result<Vec<Activity>, CarenoteError> {
        Ok(flatten_activities(&self.read_sessions()?))
    }

    async fn get_center_goals(&self) -> Result<Vec<CenterGoal>, CarenoteError> {
        let guard = self.inner.read().map_err(|_| poisoned("read center goals"))?;
        Ok(guard.center_goals.clone())
    }

    async fn get_session_stats(&self) -> Result<SessionStats, CarenoteError> {
        Ok(SessionStats::from_sessions(&self.read_sessions()?))
    }

    async fn get_goal_stats(&self) -> Result<GoalStats, CarenoteError> {
        Ok(GoalStats::from_goals(&flatten_goals(&self.read_sessions()?)))
    }
}
