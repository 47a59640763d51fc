use serde::{Deserialize, Serialize};

/// An external account/blog the publication stage can target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Destination {
    pub id: String,
    pub name: String,
    pub is_connected: bool,
}

impl Destination {
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_connected: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_connected,
        }
    }
}
