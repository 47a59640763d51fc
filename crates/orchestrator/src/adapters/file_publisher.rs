use async_trait::async_trait;
use autoblog_core::{Destination, Draft, PublishedArtifact};
use tracing::info;
use uuid::Uuid;

use crate::collaborators::{CollaboratorResult, Publisher};
use crate::error::CollaboratorError;
use crate::files::FileManager;

/// Publishes posts as standalone HTML files under `.autoblog/published/`.
#[derive(Debug, Clone)]
pub struct FilePublisher {
    files: FileManager,
}

impl FilePublisher {
    pub fn new(files: FileManager) -> Self {
        Self { files }
    }
}

#[async_trait]
impl Publisher for FilePublisher {
    async fn publish(
        &self,
        draft: &Draft,
        destination: &Destination,
    ) -> CollaboratorResult<PublishedArtifact> {
        draft
            .validate()
            .map_err(|e| CollaboratorError::invalid_input(e.to_string()))?;

        let id = Uuid::new_v4().simple().to_string();
        let short_id = &id[..8];
        let file_name = format!("{}-{}.html", draft.slug(), short_id);

        let path = self
            .files
            .write_published(&file_name, draft)
            .await
            .map_err(|e| CollaboratorError::transient(e.to_string()))?;

        info!(
            destination = %destination.id,
            path = %path.display(),
            "Post published to file"
        );

        Ok(PublishedArtifact::new(
            id,
            format!("file://{}", path.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_publish_writes_file() {
        let temp = TempDir::new().unwrap();
        let files = FileManager::new(temp.path());
        let publisher = FilePublisher::new(files.clone());

        let draft = Draft::new("Hello World", "<p>Body</p>");
        let artifact = publisher
            .publish(&draft, &Destination::new("local", "Local", true))
            .await
            .unwrap();

        assert_eq!(artifact.external_id.len(), 32);
        assert!(artifact.external_url.starts_with("file://"));
        assert!(artifact.external_url.ends_with(".html"));

        let file_name = format!("hello-world-{}.html", &artifact.external_id[..8]);
        let written = std::fs::read_to_string(files.published_dir().join(file_name)).unwrap();
        assert!(written.contains("<p>Body</p>"));
    }

    #[tokio::test]
    async fn test_publish_rejects_invalid_draft() {
        let temp = TempDir::new().unwrap();
        let publisher = FilePublisher::new(FileManager::new(temp.path()));

        let err = publisher
            .publish(&Draft::new("", "body"), &Destination::new("local", "Local", true))
            .await
            .unwrap_err();

        assert!(matches!(err, CollaboratorError::InvalidInput(_)));
        assert!(!temp.path().join(".autoblog/published").exists());
    }
}
