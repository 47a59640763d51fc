use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use autoblog_core::Topic;
use tracing::debug;

use crate::collaborators::{CollaboratorResult, TopicSource};
use crate::error::CollaboratorError;

/// Topic source backed by a fixed list of topics per niche.
///
/// Successive calls walk the candidate list in order, wrapping around.
pub struct ConfiguredTopicSource {
    topics: BTreeMap<String, Vec<String>>,
    cursor: AtomicUsize,
}

impl ConfiguredTopicSource {
    pub fn new(topics: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            topics,
            cursor: AtomicUsize::new(0),
        }
    }

    fn candidates<'a>(&'a self, niche: Option<&'a str>) -> Vec<(&'a str, &'a str)> {
        match niche {
            Some(niche) => self
                .topics
                .get(niche)
                .map(|list| list.iter().map(|t| (niche, t.as_str())).collect())
                .unwrap_or_default(),
            None => self
                .topics
                .iter()
                .flat_map(|(niche, list)| list.iter().map(move |t| (niche.as_str(), t.as_str())))
                .collect(),
        }
    }
}

#[async_trait]
impl TopicSource for ConfiguredTopicSource {
    async fn discover(&self, niche: Option<&str>) -> CollaboratorResult<Topic> {
        let candidates = self.candidates(niche);
        if candidates.is_empty() {
            return Err(CollaboratorError::invalid_input(match niche {
                Some(niche) => format!("no topics configured for niche '{}'", niche),
                None => "no topics configured".to_string(),
            }));
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % candidates.len();
        let (source_niche, text) = candidates[index];
        debug!(niche = source_niche, index, "Picked configured topic");

        Ok(Topic::new(
            text,
            format!("One of the most talked-about subjects in {} right now.", source_niche),
        ))
    }
}
