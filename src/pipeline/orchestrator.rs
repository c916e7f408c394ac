//! Sequential execution of stages with failure short-circuiting.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::request::RevisionRequest;

use super::context::StageContext;
use super::outcome::PipelineOutcome;
use super::stage::{DynStage, Erased, Stage};

/// Lifecycle of one stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Final state of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub name: String,
    pub state: StageState,
}

/// A finished run: the outcome plus what happened to each stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub outcome: PipelineOutcome,
    pub state: RunState,
    pub stages: Vec<StageRecord>,
}

/// An ordered chain of stages.
///
/// Holds no per-run state, so one pipeline may serve concurrent runs.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn DynStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage.
    #[must_use]
    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(Erased(stage)));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Check names are unique and every required output comes from an earlier stage.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut available: HashSet<&str> = HashSet::new();
        let mut errors = Vec::new();

        if self.stages.is_empty() {
            errors.push("Pipeline has no stages".to_string());
        }

        for stage in &self.stages {
            for &required in stage.requires() {
                if !available.contains(required) {
                    errors.push(format!(
                        "Stage '{}' requires '{}' but no earlier stage produces it",
                        stage.name(),
                        required
                    ));
                }
            }

            if !available.insert(stage.name()) {
                errors.push(format!("Duplicate stage name '{}'", stage.name()));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Run all stages and return the outcome.
    pub async fn run(&self, request: &RevisionRequest) -> PipelineOutcome {
        self.execute(request).await.outcome
    }

    /// Run all stages, reporting per-stage state alongside the outcome.
    ///
    /// Stops at the first failing stage; later stages stay `Pending`.
    pub async fn execute(&self, request: &RevisionRequest) -> PipelineRun {
        let mut records: Vec<StageRecord> = self
            .stages
            .iter()
            .map(|s| StageRecord {
                name: s.name().to_string(),
                state: StageState::Pending,
            })
            .collect();
        let mut state = RunState::Idle;

        if let Err(errors) = self.validate() {
            warn!("Pipeline rejected before start: {}", errors.join("; "));
            return PipelineRun {
                outcome: PipelineOutcome::failure(request, errors.join("; ")),
                state: RunState::Failed,
                stages: records,
            };
        }

        let mut input = match serde_json::to_value(request) {
            Ok(value) => value,
            Err(e) => {
                return PipelineRun {
                    outcome: PipelineOutcome::failure(request, e.to_string()),
                    state: RunState::Failed,
                    stages: records,
                };
            }
        };

        debug!("Run state {:?} -> {:?}", state, RunState::Running);
        state = RunState::Running;
        info!(
            "Starting release run for {} ({}...{})",
            request.repository(),
            request.from_revision(),
            request.to_revision()
        );

        let mut ctx = StageContext::new(request.clone());

        for (idx, stage) in self.stages.iter().enumerate() {
            records[idx].state = StageState::Running;
            info!("Stage '{}' running", stage.name());
            ctx.enter(stage.name());

            match stage.run_value(input, &ctx).await {
                Ok(output) => {
                    records[idx].state = StageState::Completed;
                    info!("Stage '{}' completed", stage.name());
                    ctx.record(stage.name(), output.clone());
                    input = output;
                }
                Err(e) => {
                    records[idx].state = StageState::Failed;
                    warn!("Stage '{}' failed: {}", stage.name(), e);
                    debug!("Run state {:?} -> {:?}", state, RunState::Failed);

                    return PipelineRun {
                        outcome: PipelineOutcome::failure(request, e.to_string()),
                        state: RunState::Failed,
                        stages: records,
                    };
                }
            }
        }

        debug!("Run state {:?} -> {:?}", state, RunState::Succeeded);
        PipelineRun {
            outcome: PipelineOutcome::success(request, input),
            state: RunState::Succeeded,
            stages: records,
        }
    }
}
