use serde::{Deserialize, Serialize};

/// Where a key falls relative to a query's cursor window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowPosition {
    /// At or below `after`: not yet in the window.
    Before,
    /// Strictly between `after` and `before`.
    Inside,
    /// At or above `before`: the window is exhausted.
    Beyond,
}

/// Enumeration query over a block store.
///
/// `after` and `before` bound a half-open window over hex-encoded block
/// identifiers, compared as raw strings: a key is inside the window when
/// `after < key < before`. `limit` caps the number of blocks yielded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ListQuery {
    /// An unbounded query: every block, in order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only yield keys strictly greater than `cursor`.
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Stop at the first key greater than or equal to `cursor`.
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    /// Yield at most `limit` blocks.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Classify `key` against the cursor window.
    pub fn position(&self, key: &str) -> WindowPosition {
        if let Some(ref before) = self.before {
            if key >= before.as_str() {
                return WindowPosition::Beyond;
            }
        }
        if let Some(ref after) = self.after {
            if key <= after.as_str() {
                return WindowPosition::Before;
            }
        }
        WindowPosition::Inside
    }

    /// Returns `true` if the query can never yield anything.
    pub fn is_empty(&self) -> bool {
        if self.limit == Some(0) {
            return true;
        }
        matches!((&self.after, &self.before), (Some(a), Some(b)) if a >= b)
    }
}
