use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata the backend reports for a single object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobProperties {
    /// Object length in bytes.
    pub content_length: u64,
    /// Last modification time, if the backend reports one.
    pub last_modified: Option<DateTime<Utc>>,
    /// Creation time, if the backend reports one.
    pub created_on: Option<DateTime<Utc>>,
}

impl BlobProperties {
    pub fn new(content_length: u64) -> Self {
        Self {
            content_length,
            last_modified: None,
            created_on: None,
        }
    }
}

/// One entry of a container listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobItem {
    /// Full object name, including any virtual directory prefix.
    pub name: String,
    pub properties: BlobProperties,
}

/// One page of a container listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Items in ascending name order.
    pub items: Vec<BlobItem>,
    /// Marker to pass to the next `list_page` call; `None` on the last page.
    pub next_marker: Option<String>,
}

/// Precondition applied to an upload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteCondition {
    /// Replace any existing object.
    #[default]
    Overwrite,
    /// Fail with `AlreadyExists` if an object is present.
    IfNotExists,
}
