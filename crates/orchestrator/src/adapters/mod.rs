//! Local collaborator implementations.
//!
//! - [`ConfiguredTopicSource`] - Rotates through configured topics per niche
//! - [`TemplateContentGenerator`] - Deterministic HTML article from a topic
//! - [`FilePublisher`] - Writes posts under `.autoblog/published/`
//! - [`WebhookPublisher`] - POSTs drafts to an HTTP endpoint
//! - [`PublisherRouter`] - Dispatches to a publisher per destination
//! - [`FileHistory`], [`MemoryHistory`] - Run history sinks

mod file_publisher;
mod history;
mod router;
mod template;
mod topics;
mod webhook;

pub use file_publisher::FilePublisher;
pub use history::{FileHistory, MemoryHistory};
pub use router::PublisherRouter;
pub use template::TemplateContentGenerator;
pub use topics::ConfiguredTopicSource;
pub use webhook::{WebhookEndpoint, WebhookPublisher};
