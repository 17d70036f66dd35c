use std::collections::HashMap;

use carenote_core::CarenoteError;
use regex::Regex;
use serde_json::Value;

fn placeholder_pattern() -> Result<Regex, CarenoteError> {
    Regex::new(r"\{\{\s*(\w+)\s*\}\}").map_err(|e| CarenoteError::InvalidConfig(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn variables(&self) -> Result<Vec<String>, CarenoteError> {
        Ok(placeholder_pattern()?
            .captures_iter(&self.template)
            .map(|caps| caps[1].to_string())
            .collect())
    }

    /// Substitutes `{{name}}` placeholders. Strings are inserted verbatim,
    /// other values as compact JSON. A placeholder without a value is an
    /// error rather than an empty string.
    pub fn render(&self, vars: &HashMap<String, Value>) -> Result<String, CarenoteError> {
        let pattern = placeholder_pattern()?;
        if let Some(missing) = self.variables()?.into_iter().find(|key| !vars.contains_key(key)) {
            return Err(CarenoteError::InvalidConfig(format!(
                "missing prompt variable '{missing}'"
            )));
        }

        let rendered = pattern.replace_all(&self.template, |caps: &regex::Captures| {
            match vars.get(&caps[1]) {
                Some(Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            }
        });
        Ok(rendered.into_owned())
    }
}
