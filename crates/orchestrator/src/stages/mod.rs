//! Stage executors for the three pipeline stages.
//!
//! - [`TopicStage`] - Discovers a trending topic
//! - [`ContentStage`] - Generates a draft from a topic
//! - [`PublicationStage`] - Publishes a draft to a resolved destination

mod content;
mod publication;
mod topic;

pub use content::{ContentInput, ContentStage};
pub use publication::{PublicationInput, PublicationStage};
pub use topic::{TopicInput, TopicStage};
