//! Content generation stage.

use std::sync::Arc;

use async_trait::async_trait;
use autoblog_core::{Draft, FailureKind, FailureRecord, FailureStage, PipelineStage, Topic};
use tracing::{debug, info};

use crate::collaborators::ContentGenerator;
use crate::core::{bounded, StageContext, StageExecutor};

#[derive(Debug, Clone)]
pub struct ContentInput {
    pub topic: Topic,
    pub niche: Option<String>,
    pub account: Option<String>,
}

pub struct ContentStage {
    generator: Arc<dyn ContentGenerator>,
}

impl ContentStage {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StageExecutor for ContentStage {
    type Input = ContentInput;
    type Output = Draft;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Content
    }

    async fn run(&self, input: &ContentInput, ctx: &StageContext) -> Result<Draft, FailureRecord> {
        input.topic.validate().map_err(|e| {
            FailureRecord::new(FailureStage::Content, FailureKind::InvalidInput, e.to_string())
        })?;

        debug!(
            run_id = %ctx.run_id,
            topic = %input.topic.text,
            timeout_ms = ctx.timeout.as_millis() as u64,
            "Requesting draft"
        );

        let draft = bounded(
            PipelineStage::Content,
            ctx,
            self.generator.generate(
                &input.topic,
                input.niche.as_deref(),
                input.account.as_deref(),
            ),
        )
        .await?;

        // Empty provider output counts as transient.
        draft.validate().map_err(|e| {
            FailureRecord::new(
                FailureStage::Content,
                FailureKind::Transient,
                format!("generator returned unusable draft: {}", e),
            )
        })?;

        info!(
            run_id = %ctx.run_id,
            title = %draft.title,
            body_length = draft.body.len(),
            labels = draft.labels.len(),
            "Draft generated"
        );
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollaboratorResult;
    use crate::error::CollaboratorError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    struct Counting {
        calls: AtomicUsize,
        result: CollaboratorResult<Draft>,
    }

    #[async_trait]
    impl ContentGenerator for Counting {
        async fn generate(
            &self,
            _topic: &Topic,
            _niche: Option<&str>,
            _account: Option<&str>,
        ) -> CollaboratorResult<Draft> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn input(text: &str) -> ContentInput {
        ContentInput {
            topic: Topic::new(text, "hook"),
            niche: None,
            account: None,
        }
    }

    fn ctx() -> StageContext {
        StageContext::new(Uuid::new_v4(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_empty_topic_fails_without_calling_generator() {
        let generator = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            result: Ok(Draft::new("T", "B")),
        });
        let stage = ContentStage::new(generator.clone());

        let failure = stage.run(&input(""), &ctx()).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidInput);
        assert!(!failure.retryable);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_error_is_retryable() {
        let stage = ContentStage::new(Arc::new(Counting {
            calls: AtomicUsize::new(0),
            result: Err(CollaboratorError::RateLimited("slow down".to_string())),
        }));

        let failure = stage.run(&input("Rust"), &ctx()).await.unwrap_err();
        assert_eq!(failure.stage, FailureStage::Content);
        assert!(failure.retryable);
    }

    #[tokio::test]
    async fn test_empty_draft_is_transient() {
        let stage = ContentStage::new(Arc::new(Counting {
            calls: AtomicUsize::new(0),
            result: Ok(Draft::new("Title", "")),
        }));

        let failure = stage.run(&input("Rust"), &ctx()).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Transient);
    }
}
