//! Publication stage.

use std::sync::Arc;

use async_trait::async_trait;
use autoblog_core::{
    Destination, Draft, FailureKind, FailureRecord, FailureStage, PipelineStage, PublishedArtifact,
};
use tracing::info;

use crate::collaborators::Publisher;
use crate::core::{bounded, StageContext, StageExecutor};

#[derive(Debug, Clone)]
pub struct PublicationInput {
    pub draft: Draft,
    pub destination: Destination,
}

pub struct PublicationStage {
    publisher: Arc<dyn Publisher>,
}

impl PublicationStage {
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl StageExecutor for PublicationStage {
    type Input = PublicationInput;
    type Output = PublishedArtifact;

    fn stage(&self) -> PipelineStage {
        PipelineStage::Publication
    }

    async fn run(
        &self,
        input: &PublicationInput,
        ctx: &StageContext,
    ) -> Result<PublishedArtifact, FailureRecord> {
        input.draft.validate().map_err(|e| {
            FailureRecord::new(
                FailureStage::Publication,
                FailureKind::InvalidInput,
                format!("malformed draft: {}", e),
            )
        })?;

        let artifact = bounded(
            PipelineStage::Publication,
            ctx,
            self.publisher.publish(&input.draft, &input.destination),
        )
        .await?;

        info!(
            run_id = %ctx.run_id,
            destination = %input.destination.id,
            external_id = %artifact.external_id,
            url = %artifact.external_url,
            "Draft published"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollaboratorResult;
    use crate::error::CollaboratorError;
    use std::time::Duration;
    use uuid::Uuid;

    struct Fixed(CollaboratorResult<PublishedArtifact>);

    #[async_trait]
    impl Publisher for Fixed {
        async fn publish(
            &self,
            _draft: &Draft,
            _destination: &Destination,
        ) -> CollaboratorResult<PublishedArtifact> {
            self.0.clone()
        }
    }

    fn input(draft: Draft) -> PublicationInput {
        PublicationInput {
            draft,
            destination: Destination::new("blog-1", "Blog", true),
        }
    }

    fn ctx() -> StageContext {
        StageContext::new(Uuid::new_v4(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_publication_success() {
        let stage = PublicationStage::new(Arc::new(Fixed(Ok(PublishedArtifact::new(
            "42",
            "https://blog.example.com/42",
        )))));
        let artifact = stage.run(&input(Draft::new("T", "B")), &ctx()).await.unwrap();
        assert_eq!(artifact.external_id, "42");
    }

    #[tokio::test]
    async fn test_credential_expiry_is_retryable_and_distinct() {
        let stage = PublicationStage::new(Arc::new(Fixed(Err(
            CollaboratorError::credential_expired("blog-1", "token expired"),
        ))));
        let failure = stage.run(&input(Draft::new("T", "B")), &ctx()).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::CredentialExpired);
        assert!(failure.retryable);
        assert!(failure.user_message().contains("Reconnect"));
    }

    #[tokio::test]
    async fn test_malformed_draft_is_not_retryable() {
        let stage = PublicationStage::new(Arc::new(Fixed(Ok(PublishedArtifact::new("1", "u")))));
        let failure = stage.run(&input(Draft::new("", "B")), &ctx()).await.unwrap_err();
        assert_eq!(failure.stage, FailureStage::Publication);
        assert_eq!(failure.kind, FailureKind::InvalidInput);
        assert!(!failure.retryable);
    }
}
