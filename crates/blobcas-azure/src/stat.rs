//! Translation of backend object metadata into block stats.

use chrono::{DateTime, Utc};

use blobcas_container::{BlobContainer, BlobProperties};
use blobcas_store::BlockStats;

use crate::path;

/// Block stats plus the backend locator needed to read the block later.
///
/// The locator stays inside the adapter; only `stats` reaches callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ObjectStats {
    pub stats: BlockStats,
    /// Full object name within the container.
    pub name: String,
    /// Object URI as reported by the container.
    pub uri: String,
}

/// Build stats for the object `name`, or `None` if its last segment is not
/// a block identifier.
pub(crate) fn translate(
    container: &dyn BlobContainer,
    name: &str,
    properties: &BlobProperties,
) -> Option<ObjectStats> {
    let id = path::decode(name)?;
    Some(ObjectStats {
        stats: BlockStats {
            id,
            size: properties.content_length,
            stored_at: stored_at(properties),
        },
        name: name.to_string(),
        uri: container.blob_uri(name),
    })
}

/// Last-modified time, else creation time, else now.
fn stored_at(properties: &BlobProperties) -> DateTime<Utc> {
    properties
        .last_modified
        .or(properties.created_on)
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use url::Url;

    use blobcas_container::InMemoryContainer;
    use blobcas_types::ContentId;

    use super::*;

    fn container() -> InMemoryContainer {
        InMemoryContainer::new(Url::parse("https://acct.example.net/c").unwrap())
    }

    fn props(
        last_modified: Option<DateTime<Utc>>,
        created_on: Option<DateTime<Utc>>,
    ) -> BlobProperties {
        BlobProperties {
            content_length: 42,
            last_modified,
            created_on,
        }
    }

    #[test]
    fn translates_block_objects() {
        let c = container();
        let id = ContentId::blake3(b"x");
        let name = path::encode("r/", &id);
        let modified = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let object = translate(&c, &name, &props(Some(modified), None)).unwrap();
        assert_eq!(object.stats.id, id);
        assert_eq!(object.stats.size, 42);
        assert_eq!(object.stats.stored_at, modified);
        assert_eq!(object.name, name);
        assert_eq!(object.uri, format!("https://acct.example.net/c/{name}"));
    }

    #[test]
    fn rejects_foreign_objects() {
        let c = container();
        assert!(translate(&c, "r/notes.txt", &props(None, None)).is_none());
        assert!(translate(&c, "r/", &props(None, None)).is_none());
    }

    #[test]
    fn stored_at_prefers_last_modified() {
        let created = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let modified = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(stored_at(&props(Some(modified), Some(created))), modified);
    }

    #[test]
    fn stored_at_falls_back_to_creation_time() {
        let created = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(stored_at(&props(None, Some(created))), created);
    }

    #[test]
    fn stored_at_falls_back_to_now() {
        let before = Utc::now();
        let at = stored_at(&props(None, None));
        assert!(at >= before);
        assert!(at <= Utc::now());
    }
}
