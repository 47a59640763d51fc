use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use autoblog_core::{Destination, Draft, PublishedArtifact};

use crate::collaborators::{CollaboratorResult, Publisher};
use crate::error::CollaboratorError;

/// Dispatches each publish call to the publisher registered for the
/// destination id, falling back to a default when one is set.
#[derive(Default)]
pub struct PublisherRouter {
    routes: HashMap<String, Arc<dyn Publisher>>,
    fallback: Option<Arc<dyn Publisher>>,
}

impl PublisherRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, destination_id: impl Into<String>, publisher: Arc<dyn Publisher>) -> Self {
        self.routes.insert(destination_id.into(), publisher);
        self
    }

    pub fn with_fallback(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.fallback = Some(publisher);
        self
    }

    pub fn has_route(&self, destination_id: &str) -> bool {
        self.routes.contains_key(destination_id) || self.fallback.is_some()
    }
}

impl fmt::Debug for PublisherRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        routes.sort_unstable();
        f.debug_struct("PublisherRouter")
            .field("routes", &routes)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[async_trait]
impl Publisher for PublisherRouter {
    async fn publish(
        &self,
        draft: &Draft,
        destination: &Destination,
    ) -> CollaboratorResult<PublishedArtifact> {
        let publisher = self
            .routes
            .get(&destination.id)
            .or(self.fallback.as_ref())
            .ok_or_else(|| {
                CollaboratorError::rejected(format!(
                    "No publisher configured for destination '{}'",
                    destination.id
                ))
            })?;

        publisher.publish(draft, destination).await
    }
}
