use std::time::Duration;

use carenote_core::{InferenceOptions, RetryPolicy};
use serde::{Deserialize, Serialize};

/// How the three independent derivations (goals, activities, plan) run.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scheduling {
    /// One after another, in goals, activities, plan order.
    Sequential,
    /// Fanned out after structuring and joined before analysis.
    #[default]
    Concurrent,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StageOptions {
    pub structuring: InferenceOptions,
    pub goals: InferenceOptions,
    pub activities: InferenceOptions,
    pub planning: InferenceOptions,
    pub analysis: InferenceOptions,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            structuring: InferenceOptions::new(1000, 0.3),
            goals: InferenceOptions::new(800, 0.5),
            activities: InferenceOptions::new(800, 0.6),
            planning: InferenceOptions::new(400, 0.5),
            analysis: InferenceOptions::new(1200, 0.3),
        }
    }
}

/// Three 60 s requests plus the default backoff between them.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(200);

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PipelineConfig {
    pub stages: StageOptions,
    pub retry: RetryPolicy,
    pub scheduling: Scheduling,
    /// Upper bound on a single stage, retries included. Keep it above
    /// `retry.max_attempts` request timeouts plus backoff, or the last
    /// attempts never run.
    pub stage_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: StageOptions::default(),
            retry: RetryPolicy::default(),
            scheduling: Scheduling::Concurrent,
            stage_timeout: Some(DEFAULT_STAGE_TIMEOUT),
        }
    }
}

impl PipelineConfig {
    pub fn merge(&self, overrides: &PipelineOptions) -> Self {
        let stages = &self.stages;
        Self {
            stages: StageOptions {
                structuring: overrides.structuring.unwrap_or(stages.structuring),
                goals: overrides.goals.unwrap_or(stages.goals),
                activities: overrides.activities.unwrap_or(stages.activities),
                planning: overrides.planning.unwrap_or(stages.planning),
                analysis: overrides.analysis.unwrap_or(stages.analysis),
            },
            retry: overrides.retry.clone().unwrap_or_else(|| self.retry.clone()),
            scheduling: overrides.scheduling.unwrap_or(self.scheduling),
            stage_timeout: overrides.stage_timeout.or(self.stage_timeout),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct PipelineOptions {
    pub structuring: Option<InferenceOptions>,
    pub goals: Option<InferenceOptions>,
    pub activities: Option<InferenceOptions>,
    pub planning: Option<InferenceOptions>,
    pub analysis: Option<InferenceOptions>,
    pub retry: Option<RetryPolicy>,
    pub scheduling: Option<Scheduling>,
    pub stage_timeout: Option<Duration>,
}
