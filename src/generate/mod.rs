//! Release log generation.
//!
//! The stage builds a prompt from the comparison and classification, hands
//! it to a [`TextGenerator`], and parses the JSON answer into a [`ReleaseLog`].

pub mod claude;
pub mod json;
pub mod prompt;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

pub use claude::{ClaudeExecutor, ClaudeGenerator, CliExecutor, DEFAULT_TIMEOUT};
pub use json::extract_json;
pub use prompt::{ReleaseLogInput, build_prompt, sanitize_for_prompt};
pub use retry::{RetryPolicy, retry_with_backoff};

/// Turns a prompt into model text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// The generated release log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLog {
    pub version: String,
    pub date: String,
    pub repository: String,
    pub summary: String,
    pub features: Vec<String>,
    pub bug_fixes: Vec<String>,
    pub breaking_changes: Vec<String>,
    pub technical_details: Vec<String>,
}

/// The part of the release log the model writes.
#[derive(Debug, Default, Deserialize)]
struct ReleaseLogDraft {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    bug_fixes: Vec<String>,
    #[serde(default)]
    breaking_changes: Vec<String>,
    #[serde(default)]
    technical_details: Vec<String>,
}

impl ReleaseLog {
    /// Parse a model response, filling in the header fields.
    pub fn from_response(
        response: &str,
        version: impl Into<String>,
        date: impl Into<String>,
        repository: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let json = extract_json(response).ok_or_else(|| {
            GenerationError::InvalidJson(format!(
                "no JSON object found in response: {}",
                preview(response)
            ))
        })?;

        let draft: ReleaseLogDraft =
            serde_json::from_str(&json).map_err(|e| GenerationError::InvalidJson(e.to_string()))?;

        Ok(Self {
            version: version.into(),
            date: date.into(),
            repository: repository.into(),
            summary: draft.summary.trim().to_string(),
            features: draft.features,
            bug_fixes: draft.bug_fixes,
            breaking_changes: draft.breaking_changes,
            technical_details: draft.technical_details,
        })
    }

    /// Render as the markdown body of the notification.
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# Release {} - {}\n\n_{}_\n",
            self.version, self.repository, self.date
        );

        if !self.summary.is_empty() {
            out.push_str(&format!("\n## Summary\n\n{}\n", self.summary));
        }

        for (heading, items) in [
            ("Breaking Changes", &self.breaking_changes),
            ("New Features", &self.features),
            ("Bug Fixes", &self.bug_fixes),
            ("Technical Details", &self.technical_details),
        ] {
            if items.is_empty() {
                continue;
            }
            out.push_str(&format!("\n## {}\n\n", heading));
            for item in items {
                out.push_str(&format!("- {}\n", item));
            }
        }

        out
    }
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > 200 {
        format!("{}...", trimmed.chars().take(200).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fenced_response() {
        let response = r#"Here is the release log:
```json
{"summary": " Adds widgets. ", "features": ["Widget support"], "bug_fixes": []}
```"#;
        let log = ReleaseLog::from_response(response, "1.1.0", "2024-05-01", "octo/demo").unwrap();

        assert_eq!(log.version, "1.1.0");
        assert_eq!(log.repository, "octo/demo");
        assert_eq!(log.summary, "Adds widgets.");
        assert_eq!(log.features, vec!["Widget support"]);
        assert!(log.breaking_changes.is_empty());
        assert!(log.technical_details.is_empty());
    }

    #[test]
    fn test_no_json_is_error() {
        let result = ReleaseLog::from_response("I cannot help with that", "1", "d", "o/r");
        assert!(matches!(result, Err(GenerationError::InvalidJson(_))));
    }

    #[test]
    fn test_wrong_shape_is_error() {
        let result = ReleaseLog::from_response(r#"{"features": "not a list"}"#, "1", "d", "o/r");
        assert!(matches!(result, Err(GenerationError::InvalidJson(_))));
    }

    #[test]
    fn test_to_markdown_skips_empty_sections() {
        let log = ReleaseLog {
            version: "1.1.0".to_string(),
            date: "2024-05-01".to_string(),
            repository: "octo/demo".to_string(),
            summary: "Adds widgets.".to_string(),
            features: vec!["Widget support".to_string()],
            bug_fixes: vec![],
            breaking_changes: vec![],
            technical_details: vec!["Refactored renderer".to_string()],
        };

        let markdown = log.to_markdown();
        assert!(markdown.starts_with("# Release 1.1.0 - octo/demo\n"));
        assert!(markdown.contains("## Summary\n\nAdds widgets."));
        assert!(markdown.contains("## New Features\n\n- Widget support\n"));
        assert!(markdown.contains("## Technical Details\n\n- Refactored renderer\n"));
        assert!(!markdown.contains("Bug Fixes"));
        assert!(!markdown.contains("Breaking Changes"));
    }
}
