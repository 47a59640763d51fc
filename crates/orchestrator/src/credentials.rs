//! Snapshot-based credential store.
//!
//! Readers clone an `Arc` to the current snapshot and never hold the lock
//! across an await point; writers swap in a whole new snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use autoblog_core::Destination;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collaborators::CredentialStore;

/// Immutable view of credentials and destinations at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSnapshot {
    /// Names of configured content-generation providers
    #[serde(default)]
    pub generation_credentials: Vec<String>,
    #[serde(default)]
    pub destinations: Vec<Destination>,
}

impl CredentialSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generation_credential(mut self, provider: impl Into<String>) -> Self {
        self.generation_credentials.push(provider.into());
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destinations.push(destination);
        self
    }
}

#[derive(Debug, Default)]
pub struct SnapshotCredentialStore {
    current: RwLock<Arc<CredentialSnapshot>>,
}

impl SnapshotCredentialStore {
    pub fn new(snapshot: CredentialSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Arc<CredentialSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new snapshot. Runs already holding the old one keep it.
    pub fn replace(&self, snapshot: CredentialSnapshot) {
        debug!(
            generation_credentials = snapshot.generation_credentials.len(),
            destinations = snapshot.destinations.len(),
            "Credential snapshot replaced"
        );
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }

    /// Copy-on-write edit of the current snapshot.
    pub fn update(&self, edit: impl FnOnce(&mut CredentialSnapshot)) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = CredentialSnapshot::clone(&guard);
        edit(&mut next);
        *guard = Arc::new(next);
    }
}

impl CredentialStore for SnapshotCredentialStore {
    fn has_generation_credential(&self) -> bool {
        !self.snapshot().generation_credentials.is_empty()
    }

    fn list_publish_destinations(&self) -> Vec<Destination> {
        self.snapshot().destinations.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let store = SnapshotCredentialStore::default();
        assert!(!store.has_generation_credential());
        assert!(store.list_publish_destinations().is_empty());
    }

    #[test]
    fn test_old_snapshot_survives_replace() {
        let store = SnapshotCredentialStore::new(
            CredentialSnapshot::new().with_generation_credential("openai"),
        );
        let held = store.snapshot();

        store.replace(CredentialSnapshot::new());

        assert_eq!(held.generation_credentials, vec!["openai".to_string()]);
        assert!(!store.has_generation_credential());
    }

    #[test]
    fn test_update_adds_destination() {
        let store = SnapshotCredentialStore::default();
        store.update(|s| s.destinations.push(Destination::new("blog-1", "Blog", true)));

        let destinations = store.list_publish_destinations();
        assert_eq!(destinations.len(), 1);
        assert_eq!(destinations[0].id, "blog-1");
    }
}
