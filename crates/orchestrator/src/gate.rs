//! Precondition gate evaluated before a run may start any stage.

use std::collections::BTreeSet;
use std::sync::Arc;

use autoblog_core::{Destination, FailureRecord, PipelineRequest};
use tracing::debug;

use crate::collaborators::CredentialStore;

pub const MISSING_GENERATION_CREDENTIAL: &str = "no content-generation credential is configured";
pub const MISSING_CONNECTED_DESTINATION: &str = "no publishing destination is connected";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResult {
    Allowed,
    Blocked { reasons: BTreeSet<String> },
}

impl GateResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn reasons(&self) -> Vec<&str> {
        match self {
            Self::Allowed => Vec::new(),
            Self::Blocked { reasons } => reasons.iter().map(String::as_str).collect(),
        }
    }
}

/// Read-only checks over the credential store. Safe to call from any number
/// of tasks while runs are in flight.
#[derive(Clone)]
pub struct PreconditionGate {
    store: Arc<dyn CredentialStore>,
}

impl PreconditionGate {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Evaluate every precondition; a blocked result lists all that failed.
    pub fn check(&self, request: &PipelineRequest) -> GateResult {
        let mut reasons = BTreeSet::new();

        if !self.store.has_generation_credential() {
            reasons.insert(MISSING_GENERATION_CREDENTIAL.to_string());
        }

        if !self
            .store
            .list_publish_destinations()
            .iter()
            .any(|d| d.is_connected)
        {
            reasons.insert(MISSING_CONNECTED_DESTINATION.to_string());
        }

        debug!(
            seed = request.seed.as_str(),
            blocked = !reasons.is_empty(),
            "Precondition gate evaluated"
        );

        if reasons.is_empty() {
            GateResult::Allowed
        } else {
            GateResult::Blocked { reasons }
        }
    }

    /// Pick the destination a run publishes to: the requested account if it is
    /// connected, otherwise the first connected destination.
    pub fn resolve_destination(
        &self,
        request: &PipelineRequest,
    ) -> std::result::Result<Destination, FailureRecord> {
        let destinations = self.store.list_publish_destinations();

        match request.account.as_deref() {
            Some(account) => match destinations.into_iter().find(|d| d.id == account) {
                Some(d) if d.is_connected => Ok(d),
                Some(d) => Err(FailureRecord::precondition(format!(
                    "destination '{}' is not connected",
                    d.name
                ))),
                None => Err(FailureRecord::precondition(format!(
                    "unknown destination '{}'",
                    account
                ))),
            },
            None => destinations
                .into_iter()
                .find(|d| d.is_connected)
                .ok_or_else(|| FailureRecord::precondition(MISSING_CONNECTED_DESTINATION)),
        }
    }
}
