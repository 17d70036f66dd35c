use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarenoteError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("inference failed (status={status:?}): {message}")]
    Inference {
        status: Option<u16>,
        message: String,
    },
    #[error("{stage} output did not match the expected shape: {reason}")]
    Schema {
        stage: String,
        reason: String,
        output: String,
    },
    #[error("cannot assemble session, missing: {}", .missing.join(", "))]
    IncompleteAssembly { missing: Vec<String> },
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("cannot {action} while pipeline is {state}")]
    Precondition { action: String, state: String },
    #[error("pipeline attempt was cancelled")]
    Cancelled,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CarenoteError {
    pub fn inference(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Inference {
            status,
            message: message.into(),
        }
    }

    pub fn schema(
        stage: impl Into<String>,
        reason: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::Schema {
            stage: stage.into(),
            reason: reason.into(),
            output: output.into(),
        }
    }

    pub fn precondition(action: impl Into<String>, state: impl ToString) -> Self {
        Self::Precondition {
            action: action.into(),
            state: state.to_string(),
        }
    }

    /// Transport failures, timeouts, 408, 429 and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            CarenoteError::Inference { status: None, .. } => true,
            CarenoteError::Inference {
                status: Some(code), ..
            } => matches!(code, 408 | 429) || (500..600).contains(code),
            _ => false,
        }
    }

    /// Short message suitable for showing to the therapist. The `Display`
    /// output keeps the underlying cause for logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            CarenoteError::Validation(_) => "Session notes are missing or invalid.",
            CarenoteError::Inference { .. } => {
                "The analysis service is unavailable. Please try again."
            }
            CarenoteError::Schema { .. } => {
                "The analysis service returned an unexpected answer. Please try again."
            }
            CarenoteError::IncompleteAssembly { .. } => {
                "The session could not be prepared. Please process the notes again."
            }
            CarenoteError::Persistence(_) => "The session could not be saved. Please retry.",
            CarenoteError::Precondition { .. } => {
                "This action is not available at the current step."
            }
            CarenoteError::Cancelled => "Processing was cancelled.",
            CarenoteError::InvalidConfig(_) | CarenoteError::Serde(_) => {
                "An internal error occurred."
            }
        }
    }
}
