use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{GoalPriority, GoalStatus, Session, SessionStatus, SessionType, TreatmentGoal};

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub by_status: BTreeMap<SessionStatus, usize>,
    pub by_type: BTreeMap<SessionType, usize>,
    pub distinct_patients: usize,
    pub total_minutes: u64,
    /// `None` when there are no sessions.
    pub average_progress: Option<f64>,
    pub average_cooperation: Option<f64>,
    pub average_effectiveness: Option<f64>,
}

impl SessionStats {
    pub fn from_sessions(sessions: &[Session]) -> Self {
        let mut stats = Self {
            total_sessions: sessions.len(),
            ..Self::default()
        };

        let mut patients: Vec<&str> = Vec::with_capacity(sessions.len());
        for session in sessions {
            let record = &session.record;
            *stats.by_status.entry(record.status).or_default() += 1;
            *stats.by_type.entry(record.session_type).or_default() += 1;
            stats.total_minutes += u64::from(record.duration);
            patients.push(record.patient_id.as_str());
        }
        patients.sort_unstable();
        patients.dedup();
        stats.distinct_patients = patients.len();

        stats.average_progress = mean(sessions.iter().map(|s| f64::from(s.record.current_progress)));
        stats.average_cooperation = mean(
            sessions
                .iter()
                .map(|s| f64::from(s.record.therapist_assessment.patient_cooperation)),
        );
        stats.average_effectiveness = mean(
            sessions
                .iter()
                .map(|s| f64::from(s.record.therapist_assessment.session_effectiveness)),
        );
        stats
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GoalStats {
    pub total_goals: usize,
    pub by_priority: BTreeMap<GoalPriority, usize>,
    pub by_status: BTreeMap<GoalStatus, usize>,
    pub average_progress: Option<f64>,
}

impl GoalStats {
    pub fn from_goals(goals: &[TreatmentGoal]) -> Self {
        let mut stats = Self {
            total_goals: goals.len(),
            ..Self::default()
        };
        for goal in goals {
            *stats.by_priority.entry(goal.priority).or_default() += 1;
            *stats.by_status.entry(goal.status).or_default() += 1;
        }
        stats.average_progress = mean(goals.iter().map(|g| f64::from(g.progress)));
        stats
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
