//! Bounded execution of collaborator calls.
//!
//! Every external call made by a stage goes through [`bounded`], which
//! applies the stage timeout and converts the collaborator's error into a
//! [`FailureRecord`] so nothing unstructured escapes the executor boundary.

use std::future::Future;

use autoblog_core::{FailureRecord, PipelineStage};
use tracing::{debug, warn};

use super::stage::StageContext;
use crate::error::{timeout_kind, CollaboratorError};

/// Map a collaborator error to the failure record for `stage`.
pub fn classify(stage: PipelineStage, error: &CollaboratorError) -> FailureRecord {
    FailureRecord::new(stage.into(), error.failure_kind(), error.to_string())
}

/// Run `call` under the context's timeout.
pub async fn bounded<T, F>(
    stage: PipelineStage,
    ctx: &StageContext,
    call: F,
) -> Result<T, FailureRecord>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    match tokio::time::timeout(ctx.timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => {
            debug!(
                run_id = %ctx.run_id,
                stage = %stage,
                error = %error,
                "Collaborator call failed"
            );
            Err(classify(stage, &error))
        }
        Err(_) => {
            warn!(
                run_id = %ctx.run_id,
                stage = %stage,
                timeout_ms = ctx.timeout.as_millis() as u64,
                "Collaborator call timed out"
            );
            Err(FailureRecord::new(
                stage.into(),
                timeout_kind(stage),
                format!("{} call timed out after {:?}", stage, ctx.timeout),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoblog_core::{FailureKind, FailureStage};
    use std::time::Duration;
    use uuid::Uuid;

    fn ctx(timeout: Duration) -> StageContext {
        StageContext::new(Uuid::new_v4(), timeout)
    }

    #[tokio::test]
    async fn test_bounded_passes_value_through() {
        let result = bounded(PipelineStage::Topic, &ctx(Duration::from_secs(1)), async {
            Ok::<_, CollaboratorError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_bounded_classifies_errors() {
        let failure = bounded(PipelineStage::Content, &ctx(Duration::from_secs(1)), async {
            Err::<(), _>(CollaboratorError::invalid_input("empty topic"))
        })
        .await
        .unwrap_err();

        assert_eq!(failure.stage, FailureStage::Content);
        assert_eq!(failure.kind, FailureKind::InvalidInput);
        assert!(!failure.retryable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_timeout_is_transient_for_content() {
        let failure = bounded(PipelineStage::Content, &ctx(Duration::from_secs(2)), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, CollaboratorError>(())
        })
        .await
        .unwrap_err();

        assert_eq!(failure.kind, FailureKind::Transient);
        assert!(failure.retryable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_timeout_is_ambiguous_for_publication() {
        let failure = bounded(PipelineStage::Publication, &ctx(Duration::from_secs(2)), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, CollaboratorError>(())
        })
        .await
        .unwrap_err();

        assert_eq!(failure.stage, FailureStage::Publication);
        assert!(failure.is_ambiguous());
        assert!(failure.retryable);
    }
}
