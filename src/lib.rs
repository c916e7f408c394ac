//! releasecast - turns a revision range into an emailed release log.
//!
//! # Overview
//!
//! releasecast compares two revisions of a GitHub repository, classifies the
//! changed files and commits, asks Claude Code CLI for a release log, and
//! emails it. The steps run as a typed [`Pipeline`] of named stages that share
//! a context bag of earlier outputs.

pub mod classify;
pub mod config;
pub mod delivery;
pub mod error;
pub mod generate;
pub mod github;
pub mod pipeline;
pub mod request;
pub mod stages;

// Re-export commonly used types
pub use classify::{BumpType, ChangeClassification, FileCategory};
pub use config::Settings;
pub use delivery::{DeliveryReceipt, DryRunMailer, EmailMessage, HttpMailer, Mailer};
pub use error::{
    CompareError, ConfigError, DeliveryError, GenerationError, InvalidRepositoryFormat,
    RequestError, StageError,
};
pub use generate::{ClaudeGenerator, ReleaseLog, TextGenerator};
pub use github::{CommitRecord, DiffSummary, FileChange, GitHubApi, RepoSlug, RevisionComparator};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineRun, Stage, StageContext};
pub use request::RevisionRequest;
pub use stages::default_pipeline;
