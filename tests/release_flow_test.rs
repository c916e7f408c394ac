//! End-to-end release runs: mocked GitHub, canned generator, mocked mail API.

mod common;

use std::sync::Mutex;

use async_trait::async_trait;
use common::{comparison_json, commit_json, demo_request, file_json, mock_client, repository_json};
use releasecast::delivery::HttpMailer;
use releasecast::error::GenerationError;
use releasecast::generate::TextGenerator;
use releasecast::github::{GitHubApi, RevisionComparator};
use releasecast::pipeline::{PipelineOutcome, RunState, StageState};
use releasecast::stages::default_pipeline;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Returns a fixed response and keeps the prompts it was given.
struct CannedGenerator {
    response: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    fn ok(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response
            .clone()
            .map_err(GenerationError::ExecutionFailed)
    }
}

const RELEASE_JSON: &str = r#"```json
{
  "summary": "Adds the widget.",
  "features": ["Widget support"],
  "bug_fixes": [],
  "breaking_changes": [],
  "technical_details": ["Widget lives in src/a.py"]
}
```"#;

async fn mock_github() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_json("octo", "demo")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/compare/v1.0.0...v1.1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comparison_json(
            1,
            vec![commit_json("a1b2c3d4e5f6", "feat: add widget")],
            vec![
                file_json("src/a.py", 10, 2, "modified"),
                file_json("README.md", 3, 0, "modified"),
            ],
        )))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_full_release_run() {
    let github = mock_github().await;
    let mail = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message_id": "m-1" })))
        .expect(1)
        .mount(&mail)
        .await;

    let comparator = RevisionComparator::new(GitHubApi::with_client(mock_client(&github.uri())));
    let mailer = HttpMailer::new(format!("{}/send", mail.uri()), "bot@example.com", None).unwrap();
    let pipeline = default_pipeline(
        comparator,
        CannedGenerator::ok(RELEASE_JSON),
        mailer,
        Some("Classification was: {{code_analysis}}".to_string()),
    );

    let run = pipeline.execute(&demo_request()).await;

    assert_eq!(run.state, RunState::Succeeded, "{:?}", run.outcome);
    assert!(run.stages.iter().all(|s| s.state == StageState::Completed));

    let outcome = serde_json::to_value(&run.outcome).unwrap();
    assert_eq!(outcome["status"], "success");
    assert_eq!(outcome["repository"], "octo/demo");
    assert_eq!(outcome["result"]["delivered"], Value::Bool(true));
    assert_eq!(outcome["result"]["message_id"], "m-1");
    assert_eq!(
        outcome["result"]["subject"],
        "🚀 Release Log: octo/demo (v1.0.0→v1.1.0)"
    );

    let requests = mail.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["to"], "team@example.com");
    let text = sent["text"].as_str().unwrap();
    assert!(text.starts_with("# Release 1.1.0 - octo/demo"));
    assert!(text.contains("- Widget support"));
}

#[tokio::test]
async fn test_generation_failure_skips_delivery() {
    let github = mock_github().await;
    let mail = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mail)
        .await;

    let comparator = RevisionComparator::new(GitHubApi::with_client(mock_client(&github.uri())));
    let mailer = HttpMailer::new(format!("{}/send", mail.uri()), "bot@example.com", None).unwrap();
    let pipeline = default_pipeline(
        comparator,
        CannedGenerator::failing("model overloaded"),
        mailer,
        None,
    );

    let run = pipeline.execute(&demo_request()).await;

    assert_eq!(run.state, RunState::Failed);
    assert_eq!(
        run.stages.iter().map(|s| s.state).collect::<Vec<_>>(),
        vec![
            StageState::Completed,
            StageState::Completed,
            StageState::Failed,
            StageState::Pending
        ]
    );
    assert_eq!(
        run.outcome.error_message(),
        Some("Claude reported an error: model overloaded")
    );
}

#[tokio::test]
async fn test_bad_revision_reports_request_fields() {
    let github = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_json("octo", "demo")))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/compare/v1.0.0...v1.1.0"))
        .respond_with(ResponseTemplate::new(404).set_body_json(common::error_json("Not Found")))
        .mount(&github)
        .await;

    let comparator = RevisionComparator::new(GitHubApi::with_client(mock_client(&github.uri())));
    let generator = CannedGenerator::ok(RELEASE_JSON);
    let mailer = releasecast::DryRunMailer::default();
    let pipeline = default_pipeline(comparator, generator, mailer, None);

    let outcome = pipeline.run(&demo_request()).await;

    match &outcome {
        PipelineOutcome::Failure {
            repository,
            from_revision,
            to_revision,
            notify_address,
            error,
        } => {
            assert_eq!(repository, "octo/demo");
            assert_eq!(from_revision, "v1.0.0");
            assert_eq!(to_revision, "v1.1.0");
            assert_eq!(notify_address, "team@example.com");
            assert!(error.starts_with("Revision not found in octo/demo"), "{error}");
        }
        other => panic!("Expected failure, got {:?}", other),
    }

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "error");
}
