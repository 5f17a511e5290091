use async_trait::async_trait;
use futures::stream::BoxStream;

use blobcas_types::ContentId;

use crate::block::{Block, BlockStats};
use crate::error::StoreResult;
use crate::query::ListQuery;

/// Lazy, ordered stream of blocks produced by [`BlockStore::list`].
///
/// A failure during enumeration is delivered as a final `Err` item; the
/// stream ends after it.
pub type BlockStream = BoxStream<'static, StoreResult<Block>>;

/// Content-addressed block store.
///
/// All implementations must satisfy these invariants:
/// - Blocks are immutable. The same identifier always names the same bytes,
///   so writing an identifier that is already stored is a no-op.
/// - A missing block is not an error: `stat`/`get` return `Ok(None)` and
///   `delete` returns `Ok(false)`.
/// - Backend failures are propagated, never silently ignored or retried.
/// - `list` yields blocks in ascending hex-identifier order.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Open backend resources. Calling `start` on a started store is a no-op.
    async fn start(&self) -> StoreResult<()>;

    /// Release backend resources. Calling `stop` on a stopped store is a no-op.
    async fn stop(&self) -> StoreResult<()>;

    /// Metadata for `id`, or `None` if it is not stored.
    async fn stat(&self, id: &ContentId) -> StoreResult<Option<BlockStats>>;

    /// The block stored under `id`, with lazily readable content.
    async fn get(&self, id: &ContentId) -> StoreResult<Option<Block>>;

    /// Store `block` unless its identifier is already present.
    ///
    /// Returns a block describing what the store now holds, which is the
    /// pre-existing object when the write was skipped.
    async fn put(&self, block: Block) -> StoreResult<Block>;

    /// Delete `id`. Returns `true` if an object was removed.
    async fn delete(&self, id: &ContentId) -> StoreResult<bool>;

    /// Enumerate stored blocks matching `query`.
    fn list(&self, query: ListQuery) -> BlockStream;

    /// Check whether `id` is stored.
    async fn contains(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(self.stat(id).await?.is_some())
    }
}
