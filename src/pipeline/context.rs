//! The context bag: outputs of completed stages, keyed by stage name.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StageError;
use crate::request::RevisionRequest;

/// State visible to a running stage.
///
/// Holds the request and every completed stage's output in run order.
/// Each run owns its own context; nothing is shared between runs.
#[derive(Debug, Clone)]
pub struct StageContext {
    request: RevisionRequest,
    outputs: Vec<(String, Value)>,
    current: String,
}

impl StageContext {
    pub fn new(request: RevisionRequest) -> Self {
        Self {
            request,
            outputs: Vec::new(),
            current: String::new(),
        }
    }

    pub fn request(&self) -> &RevisionRequest {
        &self.request
    }

    /// Names of completed stages, oldest first.
    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(name, _)| name.as_str())
    }

    /// Raw output of a completed stage.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.outputs
            .iter()
            .find(|(stage, _)| stage == name)
            .map(|(_, value)| value)
    }

    /// Typed output of a completed stage.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, StageError> {
        let value = self.raw(name).ok_or_else(|| StageError::MissingContext {
            stage: self.current.clone(),
            key: name.to_string(),
        })?;

        serde_json::from_value(value.clone()).map_err(|e| StageError::InvalidInput {
            stage: self.current.clone(),
            reason: format!("output of '{}' has unexpected shape: {}", name, e),
        })
    }

    /// Replace every `{{stage_name}}` placeholder with that stage's output.
    ///
    /// String outputs are inserted as-is, anything else as pretty JSON.
    /// An unknown name is an error rather than being left in place.
    pub fn render(&self, template: &str) -> Result<String, StageError> {
        let mut rendered = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            rendered.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];

            let Some(close) = after_open.find("}}") else {
                rendered.push_str(&rest[open..]);
                return Ok(rendered);
            };

            let name = after_open[..close].trim();
            let value = self.raw(name).ok_or_else(|| StageError::MissingContext {
                stage: self.current.clone(),
                key: name.to_string(),
            })?;

            match value {
                Value::String(text) => rendered.push_str(text),
                other => rendered.push_str(
                    &serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
                ),
            }

            rest = &after_open[close + 2..];
        }

        rendered.push_str(rest);
        Ok(rendered)
    }

    pub(crate) fn enter(&mut self, stage: &str) {
        self.current = stage.to_string();
    }

    pub(crate) fn record(&mut self, stage: &str, output: Value) {
        self.outputs.push((stage.to_string(), output));
    }
}
