//! Topic discovery stage.

use std::sync::Arc;

use async_trait::async_trait;
use autoblog_core::{FailureKind, FailureRecord, FailureStage, PipelineStage, Topic};
use tracing::info;

use crate::collaborators::TopicSource;
use crate::core::{bounded, StageContext, StageExecutor};

#[derive(Debug, Clone, Default)]
pub struct TopicInput {
    pub niche: Option<String>,
}

pub struct TopicStage {
    source: Arc<dyn TopicSource>,
}

impl TopicStage {
    pub fn new(source: Arc<dyn TopicSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl StageExecutor for TopicStage {
    type Input = TopicInput;
    type Output = Topic;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Topic
    }

    async fn run(&self, input: &TopicInput, ctx: &StageContext) -> Result<Topic, FailureRecord> {
        let topic = bounded(
            PipelineStage::Topic,
            ctx,
            self.source.discover(input.niche.as_deref()),
        )
        .await?;

        // Unusable provider output counts as transient, same as an empty draft.
        topic.validate().map_err(|e| {
            FailureRecord::new(
                FailureStage::Topic,
                FailureKind::Transient,
                format!("topic source returned unusable topic: {}", e),
            )
        })?;

        info!(
            run_id = %ctx.run_id,
            niche = ?input.niche,
            topic = %topic.text,
            "Topic discovered"
        );
        Ok(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollaboratorResult;
    use crate::error::CollaboratorError;
    use std::time::Duration;
    use uuid::Uuid;

    struct Fixed(CollaboratorResult<Topic>);

    #[async_trait]
    impl TopicSource for Fixed {
        async fn discover(&self, _niche: Option<&str>) -> CollaboratorResult<Topic> {
            self.0.clone()
        }
    }

    fn ctx() -> StageContext {
        StageContext::new(Uuid::new_v4(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_topic_stage_success() {
        let stage = TopicStage::new(Arc::new(Fixed(Ok(Topic::new("Rust", "Trending")))));
        let topic = stage.run(&TopicInput::default(), &ctx()).await.unwrap();
        assert_eq!(topic.text, "Rust");
        assert_eq!(stage.stage(), PipelineStage::Topic);
    }

    #[tokio::test]
    async fn test_topic_stage_transient_failure() {
        let stage = TopicStage::new(Arc::new(Fixed(Err(CollaboratorError::transient(
            "connection reset",
        )))));
        let failure = stage.run(&TopicInput::default(), &ctx()).await.unwrap_err();
        assert_eq!(failure.stage, FailureStage::Topic);
        assert!(failure.retryable);
    }

    #[tokio::test]
    async fn test_blank_topic_from_source_is_transient() {
        let stage = TopicStage::new(Arc::new(Fixed(Ok(Topic::new(" ", "")))));
        let failure = stage.run(&TopicInput::default(), &ctx()).await.unwrap_err();
        assert_eq!(failure.stage, FailureStage::Topic);
        assert_eq!(failure.kind, FailureKind::Transient);
        assert!(failure.retryable);
    }
}
