//! Release pipeline: typed stages, a context bag, and the orchestrator.

pub mod context;
pub mod orchestrator;
pub mod outcome;
pub mod stage;

pub use context::StageContext;
pub use orchestrator::{Pipeline, PipelineRun, RunState, StageRecord, StageState};
pub use outcome::PipelineOutcome;
pub use stage::{DynStage, Stage};
