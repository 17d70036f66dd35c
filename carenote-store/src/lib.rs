//! Session stores for carenote.
//!
//! Both stores key writes by `SessionRecord::attempt_id`, so persisting the
//! same pipeline attempt twice yields one stored session.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::InMemorySessionStore;

use carenote_core::{Activity, Session, TreatmentGoal};

pub(crate) fn flatten_goals(sessions: &[Session]) -> Vec<TreatmentGoal> {
    sessions
        .iter()
        .flat_map(|session| session.record.treatment_goals.iter().cloned())
        .collect()
}

pub(crate) fn flatten_activities(sessions: &[Session]) -> Vec<Activity> {
    sessions
        .iter()
        .flat_map(|session| session.record.activities_planned.iter().cloned())
        .collect()
}
