use std::collections::HashMap;

use carenote_core::{ensure_prompts, CarenoteError};
use serde_json::Value;

use crate::PromptTemplate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// System and user templates for one inference exchange.
#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    system: PromptTemplate,
    user: PromptTemplate,
}

impl ChatPromptTemplate {
    pub fn new(system: &str, user: &str) -> Self {
        Self {
            system: PromptTemplate::new(system),
            user: PromptTemplate::new(user),
        }
    }

    pub fn format(&self, vars: &HashMap<String, Value>) -> Result<RenderedPrompt, CarenoteError> {
        let system = self.system.render(vars)?;
        let user = self.user.render(vars)?;
        ensure_prompts(&system, &user)?;
        Ok(RenderedPrompt { system, user })
    }
}
