use std::fmt;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use blobcas_types::{ContentId, HashAlgorithm};

use crate::error::{StoreError, StoreResult};

/// A stream of content chunks.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// A window into a block's content.
///
/// `offset` is zero-based. A `length` of `None` reads to the end of the
/// content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub offset: u64,
    pub length: Option<u64>,
}

impl ByteRange {
    /// The whole content.
    pub const fn full() -> Self {
        Self {
            offset: 0,
            length: None,
        }
    }

    /// From `offset` to the end of the content.
    pub const fn from_offset(offset: u64) -> Self {
        Self {
            offset,
            length: None,
        }
    }

    /// `length` bytes starting at `offset`.
    pub const fn new(offset: u64, length: u64) -> Self {
        Self {
            offset,
            length: Some(length),
        }
    }

    /// Clamp the range against a content of `size` bytes.
    ///
    /// Returns the half-open `[start, end)` window, or `None` when the
    /// offset lies past the end. An offset equal to `size` yields an empty
    /// window.
    pub fn resolve(&self, size: u64) -> Option<(u64, u64)> {
        if self.offset > size {
            return None;
        }
        let end = match self.length {
            Some(len) => self.offset.saturating_add(len).min(size),
            None => size,
        };
        Some((self.offset, end))
    }
}

/// Lazily readable block content.
///
/// Opening a source never materializes more than the caller reads; backend
/// implementations bind the source to an object and only issue a read when
/// [`open`](ContentSource::open) is called.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Open a stream over `range` of the content.
    async fn open(&self, range: ByteRange) -> StoreResult<ByteStream>;
}

/// Content held in memory.
#[derive(Clone, Debug)]
pub struct BytesContent {
    data: Bytes,
}

impl BytesContent {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl ContentSource for BytesContent {
    async fn open(&self, range: ByteRange) -> StoreResult<ByteStream> {
        let size = self.len();
        let (start, end) = range.resolve(size).ok_or(StoreError::InvalidRange {
            offset: range.offset,
            size,
        })?;
        let chunk = self.data.slice(start as usize..end as usize);
        Ok(stream::once(async move { Ok::<_, io::Error>(chunk) }).boxed())
    }
}

/// Point-in-time metadata for a stored block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStats {
    /// Content identifier of the block.
    pub id: ContentId,
    /// Content length in bytes.
    pub size: u64,
    /// When the block was stored.
    pub stored_at: DateTime<Utc>,
}

/// An immutable block: identifier, metadata, and a lazy content handle.
///
/// The store does not check that `id` matches the content; callers that
/// need that guarantee verify it with [`HashAlgorithm::verify`] after
/// reading.
#[derive(Clone)]
pub struct Block {
    pub id: ContentId,
    pub size: u64,
    pub stored_at: DateTime<Utc>,
    content: Arc<dyn ContentSource>,
}

impl Block {
    /// Assemble a block from its parts.
    pub fn new(
        id: ContentId,
        size: u64,
        stored_at: DateTime<Utc>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            id,
            size,
            stored_at,
            content,
        }
    }

    /// Build a block from stats and a content source.
    pub fn from_stats(stats: BlockStats, content: Arc<dyn ContentSource>) -> Self {
        Self::new(stats.id, stats.size, stats.stored_at, content)
    }

    /// Build an in-memory block, identified by the BLAKE3 hash of `data`.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::with_algorithm(HashAlgorithm::Blake3, data)
    }

    /// Build an in-memory block hashed with `algorithm`.
    pub fn with_algorithm(algorithm: HashAlgorithm, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let id = algorithm.digest(&data);
        let size = data.len() as u64;
        Self::new(id, size, Utc::now(), Arc::new(BytesContent::new(data)))
    }

    /// Metadata snapshot of this block.
    pub fn stats(&self) -> BlockStats {
        BlockStats {
            id: self.id,
            size: self.size,
            stored_at: self.stored_at,
        }
    }

    /// The content source backing this block.
    pub fn content(&self) -> &Arc<dyn ContentSource> {
        &self.content
    }

    /// Open a stream over `range` of the content.
    pub async fn open(&self, range: ByteRange) -> StoreResult<ByteStream> {
        self.content.open(range).await
    }

    /// Read `range` of the content into memory.
    pub async fn read_range(&self, range: ByteRange) -> StoreResult<Bytes> {
        let chunks = self.open(range).await?;
        collect(chunks).await
    }

    /// Read the whole content into memory.
    pub async fn read_all(&self) -> StoreResult<Bytes> {
        self.read_range(ByteRange::full()).await
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("stored_at", &self.stored_at)
            .finish_non_exhaustive()
    }
}

/// Drain a byte stream into a single buffer.
pub async fn collect(chunks: ByteStream) -> StoreResult<Bytes> {
    let buf = chunks
        .try_fold(BytesMut::new(), |mut buf, chunk| async move {
            buf.extend_from_slice(&chunk);
            Ok(buf)
        })
        .await?;
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // ByteRange
    // -----------------------------------------------------------------------

    #[test]
    fn full_range_resolves_to_whole_content() {
        assert_eq!(ByteRange::full().resolve(10), Some((0, 10)));
    }

    #[test]
    fn open_ended_range_reads_to_end() {
        assert_eq!(ByteRange::from_offset(4).resolve(10), Some((4, 10)));
    }

    #[test]
    fn bounded_range_is_clamped() {
        assert_eq!(ByteRange::new(2, 3).resolve(10), Some((2, 5)));
        assert_eq!(ByteRange::new(8, 100).resolve(10), Some((8, 10)));
        assert_eq!(ByteRange::new(1, u64::MAX).resolve(10), Some((1, 10)));
    }

    #[test]
    fn offset_at_end_is_empty_and_past_end_is_invalid() {
        assert_eq!(ByteRange::from_offset(10).resolve(10), Some((10, 10)));
        assert_eq!(ByteRange::from_offset(11).resolve(10), None);
    }

    // -----------------------------------------------------------------------
    // Block content
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn from_bytes_computes_id_and_size() {
        let block = Block::from_bytes(&b"hello world"[..]);
        assert_eq!(block.id, ContentId::blake3(b"hello world"));
        assert_eq!(block.size, 11);
        assert_eq!(block.read_all().await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn with_algorithm_uses_that_hash() {
        let block = Block::with_algorithm(HashAlgorithm::Sha256, &b"abc"[..]);
        assert_eq!(block.id.algorithm(), HashAlgorithm::Sha256);
        assert!(HashAlgorithm::Sha256.verify(b"abc", &block.id));
    }

    #[tokio::test]
    async fn range_reads() {
        let block = Block::from_bytes(&b"0123456789"[..]);
        let mid = block.read_range(ByteRange::new(3, 4)).await.unwrap();
        assert_eq!(&mid[..], b"3456");
        let tail = block.read_range(ByteRange::from_offset(7)).await.unwrap();
        assert_eq!(&tail[..], b"789");
        let empty = block.read_range(ByteRange::from_offset(10)).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn range_past_end_fails() {
        let block = Block::from_bytes(&b"abc"[..]);
        let err = block.read_range(ByteRange::from_offset(4)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRange { offset: 4, size: 3 }));
    }

    #[tokio::test]
    async fn collect_propagates_stream_errors() {
        let chunks: ByteStream = stream::iter(vec![
            Ok(Bytes::from_static(b"ok")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ])
        .boxed();
        let err = collect(chunks).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn stats_snapshot_matches_block() {
        let block = Block::from_bytes(&b"stats"[..]);
        let stats = block.stats();
        assert_eq!(stats.id, block.id);
        assert_eq!(stats.size, 5);
        assert_eq!(stats.stored_at, block.stored_at);
    }

    #[test]
    fn stats_serialize_id_as_hex() {
        let block = Block::from_bytes(&b"json"[..]);
        let json = serde_json::to_value(block.stats()).unwrap();
        assert_eq!(json["id"], block.id.to_hex());
        assert_eq!(json["size"], 4);
    }

    #[test]
    fn debug_omits_content() {
        let block = Block::from_bytes(&b"debug"[..]);
        let debug = format!("{block:?}");
        assert!(debug.contains("Block"));
        assert!(debug.contains("size: 5"));
        assert!(!debug.contains("content"));
    }
}
