//! The stage abstraction and its type-erased form.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StageError;

use super::context::StageContext;

/// A named unit of work in a release pipeline.
///
/// `Input` is decoded from the previous stage's output (or from the
/// request, for the first stage). Earlier outputs are reachable by name
/// through the [`StageContext`]; every name a stage reads that way should
/// be listed in [`Stage::requires`] so the pipeline can check it up front.
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: DeserializeOwned + Send;
    type Output: Serialize + Send;

    /// Unique name; the key this stage's output is stored under.
    fn name(&self) -> &str;

    /// Names of earlier stages whose outputs this stage reads.
    fn requires(&self) -> &[&'static str] {
        &[]
    }

    async fn run(&self, input: Self::Input, ctx: &StageContext) -> Result<Self::Output, StageError>;
}

/// Object-safe view of a [`Stage`] working on JSON values.
#[async_trait]
pub trait DynStage: Send + Sync {
    fn name(&self) -> &str;

    fn requires(&self) -> &[&'static str];

    async fn run_value(&self, input: Value, ctx: &StageContext) -> Result<Value, StageError>;
}

pub(crate) struct Erased<S>(pub(crate) S);

#[async_trait]
impl<S: Stage> DynStage for Erased<S> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn requires(&self) -> &[&'static str] {
        self.0.requires()
    }

    async fn run_value(&self, input: Value, ctx: &StageContext) -> Result<Value, StageError> {
        let input: S::Input =
            serde_json::from_value(input).map_err(|e| StageError::InvalidInput {
                stage: self.0.name().to_string(),
                reason: e.to_string(),
            })?;

        let output = self.0.run(input, ctx).await?;

        serde_json::to_value(output).map_err(|e| StageError::Serialization {
            stage: self.0.name().to_string(),
            reason: e.to_string(),
        })
    }
}
