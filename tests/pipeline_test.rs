//! Integration tests for pipeline sequencing, context propagation and failure handling.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use common::demo_request;
use releasecast::error::StageError;
use releasecast::pipeline::{Pipeline, PipelineOutcome, RunState, Stage, StageContext, StageState};
use releasecast::RevisionRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Count {
    value: u32,
}

/// Reads the request and emits a fixed count.
struct Seed(u32);

#[async_trait]
impl Stage for Seed {
    type Input = RevisionRequest;
    type Output = Count;

    fn name(&self) -> &str {
        "seed"
    }

    async fn run(&self, _request: RevisionRequest, _ctx: &StageContext) -> Result<Count, StageError> {
        Ok(Count { value: self.0 })
    }
}

/// Adds a constant to its predecessor's count.
struct AddStage {
    name: &'static str,
    amount: u32,
}

#[async_trait]
impl Stage for AddStage {
    type Input = Count;
    type Output = Count;

    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, input: Count, _ctx: &StageContext) -> Result<Count, StageError> {
        Ok(Count {
            value: input.value + self.amount,
        })
    }
}

/// Always fails with a fixed message.
struct Boom;

#[async_trait]
impl Stage for Boom {
    type Input = Count;
    type Output = Count;

    fn name(&self) -> &str {
        "boom"
    }

    async fn run(&self, _input: Count, _ctx: &StageContext) -> Result<Count, StageError> {
        Err(StageError::Failed("recipient mailbox unavailable".to_string()))
    }
}

/// Records that it ran.
struct SideEffect {
    ran: Arc<AtomicBool>,
}

#[async_trait]
impl Stage for SideEffect {
    type Input = Count;
    type Output = bool;

    fn name(&self) -> &str {
        "side_effect"
    }

    async fn run(&self, _input: Count, _ctx: &StageContext) -> Result<bool, StageError> {
        self.ran.store(true, Ordering::SeqCst);
        Ok(true)
    }
}

/// Combines two earlier outputs by name and renders a template.
struct Combine;

#[async_trait]
impl Stage for Combine {
    type Input = Count;
    type Output = String;

    fn name(&self) -> &str {
        "combine"
    }

    fn requires(&self) -> &[&'static str] {
        &["seed", "double"]
    }

    async fn run(&self, input: Count, ctx: &StageContext) -> Result<String, StageError> {
        let seed: Count = ctx.get("seed")?;
        let double: Count = ctx.get("double")?;
        let note = ctx.render("seed={{seed}}")?;
        Ok(format!(
            "{} {} {} | {}",
            seed.value,
            double.value,
            input.value,
            note.replace(char::is_whitespace, "")
        ))
    }
}

#[tokio::test]
async fn test_stages_run_in_order_and_last_output_wins() {
    let pipeline = Pipeline::new()
        .stage(Seed(1))
        .stage(AddStage {
            name: "double",
            amount: 1,
        })
        .stage(AddStage {
            name: "triple",
            amount: 1,
        });

    let run = pipeline.execute(&demo_request()).await;

    assert_eq!(run.state, RunState::Succeeded);
    assert!(run.stages.iter().all(|s| s.state == StageState::Completed));
    assert_eq!(run.outcome.result(), Some(&json!({ "value": 3 })));
}

#[tokio::test]
async fn test_failure_short_circuits() {
    let ran = Arc::new(AtomicBool::new(false));
    let pipeline = Pipeline::new()
        .stage(Seed(1))
        .stage(Boom)
        .stage(SideEffect { ran: ran.clone() });

    let run = pipeline.execute(&demo_request()).await;

    assert_eq!(run.state, RunState::Failed);
    assert_eq!(
        run.stages.iter().map(|s| s.state).collect::<Vec<_>>(),
        vec![StageState::Completed, StageState::Failed, StageState::Pending]
    );
    assert!(!ran.load(Ordering::SeqCst), "stage after failure must not run");

    match run.outcome {
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
            assert_eq!(error, "recipient mailbox unavailable");
        }
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_later_stage_reads_all_earlier_outputs() {
    let pipeline = Pipeline::new()
        .stage(Seed(2))
        .stage(AddStage {
            name: "double",
            amount: 2,
        })
        .stage(AddStage {
            name: "plus_ten",
            amount: 10,
        })
        .stage(Combine);

    let outcome = pipeline.run(&demo_request()).await;

    assert!(outcome.is_success());
    assert_eq!(
        outcome.result(),
        Some(&json!("2 4 14 | seed={\"value\":2}"))
    );
}

#[tokio::test]
async fn test_input_shape_mismatch_fails_stage() {
    // `Boom` expects a count but receives the request.
    let pipeline = Pipeline::new().stage(Boom);

    let outcome = pipeline.run(&demo_request()).await;

    let error = outcome.error_message().expect("should fail");
    assert!(error.contains("Stage 'boom' could not decode its input"), "{error}");
}

#[tokio::test]
async fn test_validation_failure_runs_nothing() {
    let ran = Arc::new(AtomicBool::new(false));
    // `combine` needs `double`, which is not an earlier stage.
    let pipeline = Pipeline::new()
        .stage(Seed(1))
        .stage(SideEffect { ran: ran.clone() })
        .stage(Combine);

    let errors = pipeline.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("double"));

    let run = pipeline.execute(&demo_request()).await;
    assert_eq!(run.state, RunState::Failed);
    assert!(run.stages.iter().all(|s| s.state == StageState::Pending));
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_duplicate_names_rejected() {
    let pipeline = Pipeline::new().stage(Seed(1)).stage(AddStage {
        name: "seed",
        amount: 1,
    });

    let outcome = pipeline.run(&demo_request()).await;
    assert!(outcome.error_message().unwrap().contains("Duplicate stage name 'seed'"));
}

#[tokio::test]
async fn test_empty_pipeline_fails() {
    let outcome = Pipeline::new().run(&demo_request()).await;
    assert!(!outcome.is_success());
    assert_eq!(outcome.exit_code(), 1);
}

/// Counts invocations across runs.
struct Counter {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Stage for Counter {
    type Input = RevisionRequest;
    type Output = String;

    fn name(&self) -> &str {
        "counter"
    }

    async fn run(&self, request: RevisionRequest, _ctx: &StageContext) -> Result<String, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(request.repository().to_string())
    }
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Arc::new(Pipeline::new().stage(Counter {
        calls: calls.clone(),
    }));

    let first = RevisionRequest::new("octo/one", "a", "b", "team@example.com").unwrap();
    let second = RevisionRequest::new("octo/two", "a", "b", "team@example.com").unwrap();

    let p1 = pipeline.clone();
    let p2 = pipeline.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { p1.run(&first).await }),
        tokio::spawn(async move { p2.run(&second).await }),
    );

    assert_eq!(a.unwrap().result(), Some(&json!("octo/one")));
    assert_eq!(b.unwrap().result(), Some(&json!("octo/two")));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
