use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use carenote_core::{
    Activity, CarenoteError, CenterGoal, GoalStats, Session, SessionRecord, SessionStats,
    SessionStore, TreatmentGoal,
};
use tokio::sync::Mutex;

use crate::{flatten_activities, flatten_goals};

/// Append-only JSONL store: one serialized [`Session`] per line.
pub struct FileSessionStore {
    path: PathBuf,
    center_goals: Vec<CenterGoal>,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            center_goals: Vec::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_center_goals(mut self, goals: Vec<CenterGoal>) -> Self {
        self.center_goals = goals;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every complete line. A final line without a trailing newline
    /// is a torn write from an interrupted append and is skipped; the
    /// returned length marks where the complete lines end.
    fn load(&self) -> Result<(Vec<Session>, u64), CarenoteError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok((Vec::new(), 0)),
            Err(err) => return Err(CarenoteError::Persistence(err.to_string())),
        };

        // a torn tail may end inside a multi-byte character, so cut on bytes
        let complete = bytes
            .iter()
            .rposition(|byte| *byte == b'\n')
            .map_or(0, |idx| idx + 1);
        if complete < bytes.len() {
            tracing::warn!(
                path = %self.path.display(),
                torn_bytes = bytes.len() - complete,
                "ignoring incomplete trailing record"
            );
        }
        let contents = std::str::from_utf8(&bytes[..complete])
            .map_err(|err| CarenoteError::Persistence(format!("log is not valid UTF-8: {err}")))?;

        let mut sessions = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let session = serde_json::from_str(line).map_err(|err| {
                CarenoteError::Persistence(format!("corrupt record on line {}: {err}", index + 1))
            })?;
            sessions.push(session);
        }
        Ok((sessions, complete as u64))
    }

    async fn sessions(&self) -> Result<Vec<Session>, CarenoteError> {
        let _guard = self.write_lock.lock().await;
        Ok(self.load()?.0)
    }

    /// Appends one line, first cutting any torn tail back to `complete`.
    fn append(&self, session: &Session, complete: u64) -> Result<(), CarenoteError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| CarenoteError::Persistence(err.to_string()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| CarenoteError::Persistence(err.to_string()))?;
        let len = file
            .metadata()
            .map_err(|err| CarenoteError::Persistence(err.to_string()))?
            .len();
        if len > complete {
            file.set_len(complete)
                .map_err(|err| CarenoteError::Persistence(err.to_string()))?;
        }
        let line = serde_json::to_string(session)
            .map_err(|err| CarenoteError::Persistence(err.to_string()))?;
        file.write_all(format!("{line}\n").as_bytes())
            .map_err(|err| CarenoteError::Persistence(err.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for FileSessionStore {
    async fn create_session(&self, record: SessionRecord) -> Result<Session, CarenoteError> {
        let _guard = self.write_lock.lock().await;

        let (sessions, complete) = self.load()?;
        if let Some(existing) = sessions
            .into_iter()
            .find(|session| session.record.attempt_id == record.attempt_id)
        {
            tracing::debug!(attempt_id = %record.attempt_id, "attempt already stored");
            return Ok(existing);
        }

        let session = Session::from_record(record);
        self.append(&session, complete)?;
        tracing::debug!(session_id = %session.id, path = %self.path.display(), "session appended");
        Ok(session)
    }

    async fn get_sessions(&self) -> Result<Vec<Session>, CarenoteError> {
        self.sessions().await
    }

    async fn get_treatment_goals(&self) -> Result<Vec<TreatmentGoal>, CarenoteError> {
        Ok(flatten_goals(&self.sessions().await?))
    }

    async fn get_activities(&self) -> Result<Vec<Activity>, CarenoteError> {
        Ok(flatten_activities(&self.sessions().await?))
    }

    async fn get_center_goals(&self) -> Result<Vec<CenterGoal>, CarenoteError> {
        Ok(self.center_goals.clone())
    }

    async fn get_session_stats(&self) -> Result<SessionStats, CarenoteError> {
        Ok(SessionStats::from_sessions(&self.sessions().await?))
    }

    async fn get_goal_stats(&self) -> Result<GoalStats, CarenoteError> {
        Ok(GoalStats::from_goals(&flatten_goals(&self.sessions().await?)))
    }
}
