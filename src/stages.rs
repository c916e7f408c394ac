//! The release stages and the default pipeline.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::classify::{ChangeClassification, classify, next_version};
use crate::delivery::{DeliveryReceipt, EmailMessage, Mailer, subject_line};
use crate::error::{DeliveryError, StageError};
use crate::generate::{
    ReleaseLog, ReleaseLogInput, TextGenerator, build_prompt, sanitize_for_prompt,
};
use crate::github::{DiffSummary, HostingApi, RevisionComparator};
use crate::pipeline::{Pipeline, Stage, StageContext};
use crate::request::{RevisionRequest, is_commit_sha, shorten_sha};

pub const GITHUB_ANALYSIS: &str = "github_analysis";
pub const CODE_ANALYSIS: &str = "code_analysis";
pub const RELEASE_LOG: &str = "release_log";
pub const EMAIL_DELIVERY: &str = "email_delivery";

/// Fetches the comparison for the request.
pub struct CompareStage<H> {
    comparator: RevisionComparator<H>,
}

impl<H: HostingApi> CompareStage<H> {
    pub fn new(comparator: RevisionComparator<H>) -> Self {
        Self { comparator }
    }
}

#[async_trait]
impl<H: HostingApi> Stage for CompareStage<H> {
    type Input = RevisionRequest;
    type Output = DiffSummary;

    fn name(&self) -> &str {
        GITHUB_ANALYSIS
    }

    async fn run(&self, request: RevisionRequest, _ctx: &StageContext) -> Result<DiffSummary, StageError> {
        Ok(self
            .comparator
            .compare(
                request.repository(),
                request.from_revision(),
                request.to_revision(),
            )
            .await?)
    }
}

/// Buckets the changed files and suggests a bump.
pub struct ClassifyStage;

#[async_trait]
impl Stage for ClassifyStage {
    type Input = DiffSummary;
    type Output = ChangeClassification;

    fn name(&self) -> &str {
        CODE_ANALYSIS
    }

    async fn run(&self, diff: DiffSummary, _ctx: &StageContext) -> Result<ChangeClassification, StageError> {
        let classification = classify(diff.file_changes(), diff.commits());
        info!(
            "Classified {} files, suggested bump: {}",
            diff.total_files_changed(),
            classification.suggested_bump
        );
        Ok(classification)
    }
}

/// Writes the release log with a [`TextGenerator`].
pub struct ReleaseLogStage<G> {
    generator: G,
    instructions: Option<String>,
}

impl<G: TextGenerator> ReleaseLogStage<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            instructions: None,
        }
    }

    /// Extra operator instructions. `{{stage_name}}` placeholders are
    /// replaced with that stage's output before the prompt is built.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

#[async_trait]
impl<G: TextGenerator> Stage for ReleaseLogStage<G> {
    type Input = ChangeClassification;
    type Output = ReleaseLog;

    fn name(&self) -> &str {
        RELEASE_LOG
    }

    fn requires(&self) -> &[&'static str] {
        &[GITHUB_ANALYSIS, CODE_ANALYSIS]
    }

    async fn run(
        &self,
        classification: ChangeClassification,
        ctx: &StageContext,
    ) -> Result<ReleaseLog, StageError> {
        let diff: DiffSummary = ctx.get(GITHUB_ANALYSIS)?;
        // Only the operator's text is sanitized; substituted outputs go in whole.
        let instructions = self
            .instructions
            .as_deref()
            .map(|template| ctx.render(&sanitize_for_prompt(template)))
            .transpose()?;

        let next = next_version(diff.from_revision(), classification.suggested_bump);
        let prompt = build_prompt(&ReleaseLogInput {
            diff: &diff,
            classification: &classification,
            next_version: next.as_ref().map(ToString::to_string),
            instructions,
        });

        let response = self.generator.generate(&prompt).await?;

        let version = match next {
            Some(v) => v.to_string(),
            None if is_commit_sha(diff.to_revision()) => shorten_sha(diff.to_revision(), 7),
            None => diff.to_revision().to_string(),
        };
        let date = Utc::now().format("%Y-%m-%d").to_string();

        Ok(ReleaseLog::from_response(
            &response,
            version,
            date,
            diff.repository(),
        )?)
    }
}

/// Emails the release log to the request's notify address.
pub struct DeliveryStage<M> {
    mailer: M,
}

impl<M: Mailer> DeliveryStage<M> {
    pub fn new(mailer: M) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl<M: Mailer> Stage for DeliveryStage<M> {
    type Input = ReleaseLog;
    type Output = DeliveryReceipt;

    fn name(&self) -> &str {
        EMAIL_DELIVERY
    }

    fn requires(&self) -> &[&'static str] {
        &[RELEASE_LOG]
    }

    async fn run(&self, log: ReleaseLog, ctx: &StageContext) -> Result<DeliveryReceipt, StageError> {
        let request = ctx.request();
        let message = EmailMessage::new(
            self.mailer.sender(),
            request.notify_address(),
            subject_line(
                request.repository(),
                request.from_revision(),
                request.to_revision(),
            ),
            log.to_markdown(),
        )?;

        let receipt = self.mailer.send(&message).await?;
        if !receipt.delivered && !receipt.dry_run {
            return Err(DeliveryError::NotDelivered(receipt.recipient).into());
        }

        Ok(receipt)
    }
}

/// `github_analysis` → `code_analysis` → `release_log` → `email_delivery`.
pub fn default_pipeline<H, G, M>(
    comparator: RevisionComparator<H>,
    generator: G,
    mailer: M,
    instructions: Option<String>,
) -> Pipeline
where
    H: HostingApi + 'static,
    G: TextGenerator + 'static,
    M: Mailer + 'static,
{
    let mut release_log = ReleaseLogStage::new(generator);
    if let Some(instructions) = instructions {
        release_log = release_log.with_instructions(instructions);
    }

    Pipeline::new()
        .stage(CompareStage::new(comparator))
        .stage(ClassifyStage)
        .stage(release_log)
        .stage(DeliveryStage::new(mailer))
}
