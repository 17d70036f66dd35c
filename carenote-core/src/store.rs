use std::sync::Arc;

use crate::{Activity, CarenoteError, CenterGoal, GoalStats, Session, SessionRecord, SessionStats, TreatmentGoal};

/// Persistence boundary for assembled sessions.
///
/// `create_session` must be idempotent on `SessionRecord::attempt_id`: writing
/// the same attempt twice returns the session stored the first time.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, record: SessionRecord) -> Result<Session, CarenoteError>;
    async fn get_sessions(&self) -> Result<Vec<Session>, CarenoteError>;
    async fn get_treatment_goals(&self) -> Result<Vec<TreatmentGoal>, CarenoteError>;
    async fn get_activities(&self) -> Result<Vec<Activity>, CarenoteError>;
    async fn get_center_goals(&self) -> Result<Vec<CenterGoal>, CarenoteError>;
    async fn get_session_stats(&self) -> Result<SessionStats, CarenoteError>;
    async fn get_goal_stats(&self) -> Result<GoalStats, CarenoteError>;
}

#[async_trait::async_trait]
impl<T> SessionStore for Arc<T>
where
    T: SessionStore + ?Sized,
{
    async fn create_session(&self, record: SessionRecord) -> Result<Session, CarenoteError> {
        (**self).create_session(record).await
    }

    async fn get_sessions(&self) -> Result<Vec<Session>, CarenoteError> {
        (**self).get_sessions().await
    }

    async fn get_treatment_goals(&self) -> Result<Vec<TreatmentGoal>, CarenoteError> {
        (**self).get_treatment_goals().await
    }

    async fn get_activities(&self) -> Result<Vec<Activity>, CarenoteError> {
        (**self).get_activities().await
    }

    async fn get_center_goals(&self) -> Result<Vec<CenterGoal>, CarenoteError> {
        (**self).get_center_goals().await
    }

    async fn get_session_stats(&self) -> Result<SessionStats, CarenoteError> {
        (**self).get_session_stats().await
    }

    async fn get_goal_stats(&self) -> Result<GoalStats, CarenoteError> {
        (**self).get_goal_stats().await
    }
}
