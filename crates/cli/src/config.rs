use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use autoblog_core::Destination;
use orchestrator::adapters::{
    ConfiguredTopicSource, FileHistory, FilePublisher, PublisherRouter, TemplateContentGenerator,
    WebhookEndpoint, WebhookPublisher,
};
use orchestrator::{CredentialSnapshot, FileManager, Orchestrator, PipelineConfig, SnapshotCredentialStore};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Serialize, Deserialize)]
pub struct AutoblogConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
    #[serde(default)]
    pub topics: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub topic_timeout_secs: u64,
    pub content_timeout_secs: u64,
    pub publish_timeout_secs: u64,
}

impl Default for PipelineSection {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            topic_timeout_secs: defaults.topic_timeout.as_secs(),
            content_timeout_secs: defaults.content_timeout.as_secs(),
            publish_timeout_secs: defaults.publish_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationSection {
    /// Configured content-generation providers
    #[serde(default)]
    pub credentials: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    File,
    Webhook,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub id: String,
    pub name: String,
    #[serde(default = "default_connected")]
    pub connected: bool,
    pub kind: DestinationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Environment variable holding the bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

fn default_connected() -> bool {
    true
}

impl DestinationConfig {
    fn token(&self) -> Option<String> {
        self.token_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|t| !t.is_empty())
    }

    /// A webhook whose token variable is unset counts as disconnected.
    fn is_connected(&self) -> bool {
        self.connected && (self.token_env.is_none() || self.token().is_some())
    }
}

impl AutoblogConfig {
    pub fn for_project(name: impl Into<String>) -> Self {
        let mut topics = BTreeMap::new();
        topics.insert(
            "tech".to_string(),
            vec![
                "Rust in production".to_string(),
                "Local-first software".to_string(),
                "WebAssembly outside the browser".to_string(),
            ],
        );

        Self {
            project: ProjectConfig { name: name.into() },
            pipeline: PipelineSection::default(),
            generation: GenerationSection {
                credentials: vec!["template".to_string()],
                byline: None,
            },
            destinations: vec![DestinationConfig {
                id: "local".to_string(),
                name: "Local files".to_string(),
                connected: true,
                kind: DestinationKind::File,
                url: None,
                token_env: None,
            }],
            topics,
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_topic_timeout(Duration::from_secs(self.pipeline.topic_timeout_secs))
            .with_content_timeout(Duration::from_secs(self.pipeline.content_timeout_secs))
            .with_publish_timeout(Duration::from_secs(self.pipeline.publish_timeout_secs))
    }

    pub fn credential_snapshot(&self) -> CredentialSnapshot {
        let mut snapshot = CredentialSnapshot::new();
        for provider in &self.generation.credentials {
            snapshot = snapshot.with_generation_credential(provider.clone());
        }
        for dest in &self.destinations {
            snapshot = snapshot.with_destination(Destination::new(
                dest.id.clone(),
                dest.name.clone(),
                dest.is_connected(),
            ));
        }
        snapshot
    }

    pub fn publisher_router(&self, files: &FileManager) -> Result<PublisherRouter> {
        let mut router = PublisherRouter::new();
        for dest in &self.destinations {
            router = match dest.kind {
                DestinationKind::File => {
                    router.route(dest.id.clone(), Arc::new(FilePublisher::new(files.clone())))
                }
                DestinationKind::Webhook => {
                    let Some(ref url) = dest.url else {
                        bail!("Webhook destination '{}' has no url", dest.id);
                    };
                    let mut endpoint = WebhookEndpoint::new(url.clone());
                    if let Some(token) = dest.token() {
                        endpoint = endpoint.with_token(token);
                    }
                    router.route(dest.id.clone(), Arc::new(WebhookPublisher::new(endpoint)))
                }
            };
        }
        Ok(router)
    }

    /// Wire the local collaborators into an orchestrator rooted at `base_path`.
    pub fn build_orchestrator(&self, base_path: &Path) -> Result<Orchestrator> {
        let files = FileManager::new(base_path);

        let mut generator = TemplateContentGenerator::new();
        if let Some(ref byline) = self.generation.byline {
            generator = generator.with_byline(byline.clone());
        }

        Ok(Orchestrator::new(
            Arc::new(SnapshotCredentialStore::new(self.credential_snapshot())),
            Arc::new(ConfiguredTopicSource::new(self.topics.clone())),
            Arc::new(generator),
            Arc::new(self.publisher_router(&files)?),
        )
        .with_config(self.pipeline_config())
        .with_history(Arc::new(FileHistory::new(files))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = AutoblogConfig::for_project("demo");
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = AutoblogConfig::parse(&text).unwrap();

        assert_eq!(parsed.project.name, "demo");
        assert_eq!(parsed.destinations.len(), 1);
        assert_eq!(parsed.destinations[0].kind, DestinationKind::File);
        assert_eq!(parsed.pipeline.content_timeout_secs, 180);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = AutoblogConfig::parse(
            r#"
            [project]
            name = "blog"

            [pipeline]
            topic_timeout_secs = 5
            content_timeout_secs = 10
            publish_timeout_secs = 15

            [[destinations]]
            id = "hook"
            name = "Webhook"
            kind = "webhook"
            url = "https://example.com/posts"
            token_env = "AUTOBLOG_TEST_TOKEN_THAT_IS_NOT_SET"
            "#,
        )
        .unwrap();

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.publish_timeout, Duration::from_secs(15));
        assert!(config.generation.credentials.is_empty());
        assert!(config.destinations[0].connected);
        assert!(!config.destinations[0].is_connected());
    }

    #[test]
    fn test_partial_pipeline_section_keeps_defaults() {
        let config = AutoblogConfig::parse(
            r#"
            [project]
            name = "blog"

            [pipeline]
            publish_timeout_secs = 20
            "#,
        )
        .unwrap();

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.topic_timeout, Duration::from_secs(60));
        assert_eq!(pipeline.content_timeout, Duration::from_secs(180));
        assert_eq!(pipeline.publish_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_webhook_without_url_is_rejected() {
        let config = AutoblogConfig::parse(
            r#"
            [project]
            name = "blog"

            [[destinations]]
            id = "hook"
            name = "Webhook"
            kind = "webhook"
            "#,
        )
        .unwrap();

        let err = config
            .publisher_router(&FileManager::new("."))
            .unwrap_err();
        assert!(err.to_string().contains("no url"));
    }
}
