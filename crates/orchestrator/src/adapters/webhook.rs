use async_trait::async_trait;
use autoblog_core::{Destination, Draft, PublishedArtifact};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collaborators::{CollaboratorResult, Publisher};
use crate::error::CollaboratorError;

/// Target of a [`WebhookPublisher`].
#[derive(Debug, Clone)]
pub struct WebhookEndpoint {
    pub url: String,
    pub token: Option<String>,
}

impl WebhookEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[derive(Debug, Serialize)]
struct PublishPayload<'a> {
    destination_id: &'a str,
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    id: String,
    url: String,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

/// Publishes drafts by POSTing them as JSON to an HTTP endpoint.
///
/// The endpoint answers with `{"id", "url", "published_at"?}`. Status codes
/// map onto [`CollaboratorError`] so the publication stage can classify them.
/// A timeout, a dropped connection after sending, a 504 or an unreadable 2xx
/// body are reported as ambiguous: the post may exist remotely.
#[derive(Debug, Clone)]
pub struct WebhookPublisher {
    client: reqwest::Client,
    endpoint: WebhookEndpoint,
}

impl WebhookPublisher {
    pub fn new(endpoint: WebhookEndpoint) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: WebhookEndpoint) -> Self {
        Self { client, endpoint }
    }

    /// Only a failed connect proves the post never reached the endpoint.
    fn send_error(error: &reqwest::Error) -> CollaboratorError {
        if error.is_connect() {
            CollaboratorError::transient(error.to_string())
        } else if error.is_builder() {
            CollaboratorError::rejected(error.to_string())
        } else {
            CollaboratorError::ambiguous(error.to_string())
        }
    }

    fn status_error(destination: &Destination, status: StatusCode, body: String) -> CollaboratorError {
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        };

        match status {
            StatusCode::UNAUTHORIZED => {
                CollaboratorError::credential_expired(destination.id.clone(), message)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                CollaboratorError::invalid_input(message)
            }
            StatusCode::TOO_MANY_REQUESTS => CollaboratorError::RateLimited(message),
            StatusCode::GATEWAY_TIMEOUT => CollaboratorError::ambiguous(message),
            s if s.is_server_error() => CollaboratorError::transient(message),
            _ => CollaboratorError::rejected(message),
        }
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    async fn publish(
        &self,
        draft: &Draft,
        destination: &Destination,
    ) -> CollaboratorResult<PublishedArtifact> {
        draft
            .validate()
            .map_err(|e| CollaboratorError::invalid_input(e.to_string()))?;

        let payload = PublishPayload {
            destination_id: &destination.id,
            title: &draft.title,
            body: &draft.body,
            excerpt: draft.excerpt.as_deref(),
            image_url: draft.image_url.as_deref(),
            labels: &draft.labels,
        };

        debug!(url = %self.endpoint.url, destination = %destination.id, "POST publish webhook");

        let mut request = self.client.post(&self.endpoint.url).json(&payload);
        if let Some(ref token) = self.endpoint.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, destination = %destination.id, "Publish request failed");
            Self::send_error(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(destination, status, body));
        }

        let body: PublishResponse = response
            .json()
            .await
            .map_err(|e| {
                warn!(error = %e, destination = %destination.id, "Publish accepted with unreadable response");
                CollaboratorError::ambiguous(format!(
                    "HTTP {} but unreadable publish response: {}",
                    status, e
                ))
            })?;

        info!(destination = %destination.id, external_id = %body.id, "Post published via webhook");

        Ok(PublishedArtifact {
            external_id: body.id,
            external_url: body.url,
            published_at: body.published_at.unwrap_or_else(Utc::now),
        })
    }
}
