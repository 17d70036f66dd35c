use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::CarenoteError;

const MAX_ECHOED_OUTPUT: usize = 512;

/// Parses model output into a typed payload.
///
/// Accepts bare JSON, JSON wrapped in a Markdown code block, and JSON
/// surrounded by prose. Anything else is a `Schema` error tagged with the stage
/// name.
#[derive(Clone, Debug)]
pub struct JsonOutputParser<T> {
    stage: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> JsonOutputParser<T> {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            _marker: PhantomData,
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn parse(&self, output: &str) -> Result<T, CarenoteError> {
        let cleaned = strip_code_fences(output);
        if cleaned.is_empty() {
            return Err(self.error("empty output", output));
        }

        let first_err = match serde_json::from_str::<T>(cleaned) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match extract_json_span(cleaned) {
            Some(span) if span.len() != cleaned.len() => serde_json::from_str::<T>(span)
                .map_err(|err| self.error(err.to_string(), output)),
            _ => Err(self.error(first_err.to_string(), output)),
        }
    }

    /// Builds a `Schema` error for this stage, echoing a bounded prefix of the
    /// offending output.
    pub fn error(&self, reason: impl Into<String>, output: &str) -> CarenoteError {
        CarenoteError::schema(self.stage.clone(), reason, truncate(output, MAX_ECHOED_OUTPUT))
    }
}

pub fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (`json`, `JSON`, ...) up to the first newline
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Outermost `{...}` or `[...]` span, whichever opens first.
pub fn extract_json_span(input: &str) -> Option<&str> {
    let start = input.find(['{', '['])?;
    let close = if input[start..].starts_with('{') { '}' } else { ']' };
    let end = input.rfind(close)?;
    (end > start).then(|| &input[start..=end])
}

fn truncate(input: &str, max: usize) -> String {
    if input.len() <= max {
        return input.to_string();
    }
    let mut end = max;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &input[..end])
}
