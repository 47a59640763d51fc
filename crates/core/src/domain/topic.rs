use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A discovered subject plus the editorial hook that justifies writing about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Topic {
    pub text: String,
    pub hook: String,
}

impl Topic {
    pub fn new(text: impl Into<String>, hook: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hook: hook.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.text.trim().is_empty() {
            return Err(CoreError::Validation("topic text is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_validate() {
        assert!(Topic::new("Rust 2024 edition", "Lands this week").validate().is_ok());
        assert!(Topic::new("   ", "hook").validate().is_err());
        assert!(Topic::new("", "").validate().is_err());
    }
}
