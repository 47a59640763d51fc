//! Stage executor trait.
//!
//! Each stage wraps exactly one external call and turns its result into a
//! typed output or a classified [`FailureRecord`]. Executors hold no run
//! state; everything run-specific travels through the input and the context.

use std::time::Duration;

use async_trait::async_trait;
use autoblog_core::{FailureRecord, PipelineStage};
use uuid::Uuid;

/// Data an executor needs for a single invocation.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub run_id: Uuid,
    /// Upper bound for the external call
    pub timeout: Duration,
}

impl StageContext {
    pub fn new(run_id: Uuid, timeout: Duration) -> Self {
        Self { run_id, timeout }
    }
}

#[async_trait]
pub trait StageExecutor: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    fn stage(&self) -> PipelineStage;

    async fn run(
        &self,
        input: &Self::Input,
        ctx: &StageContext,
    ) -> Result<Self::Output, FailureRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_context() {
        let run_id = Uuid::new_v4();
        let ctx = StageContext::new(run_id, Duration::from_secs(5));
        assert_eq!(ctx.run_id, run_id);
        assert_eq!(ctx.timeout, Duration::from_secs(5));
    }
}
