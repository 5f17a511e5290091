use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, trace, warn};
use url::Url;

use blobcas_container::{
    validate_container_uri, BlobContainer, ContainerConnector, ContainerError, Credentials,
    WriteCondition,
};
use blobcas_store::{
    Block, BlockStats, BlockStore, BlockStream, ByteRange, ByteStream, ContentSource, ListQuery,
    StoreError, StoreResult, WindowPosition,
};
use blobcas_types::ContentId;

use crate::config::AdapterConfig;
use crate::location::Location;
use crate::path;
use crate::stat::{self, ObjectStats};

/// Block store persisting each block as one object in a blob container.
///
/// Blocks live at `root + hex(id)`. Objects under the root whose names do
/// not decode as identifiers are ignored by every operation.
///
/// The store starts stopped. [`start`](BlockStore::start) opens the
/// container through the connector; until then every operation fails with
/// [`StoreError::NotStarted`].
pub struct AzureBlockStore {
    container_uri: Url,
    credentials: Credentials,
    root: String,
    config: AdapterConfig,
    connector: Arc<dyn ContainerConnector>,
    container: RwLock<Option<Arc<dyn BlobContainer>>>,
}

impl AzureBlockStore {
    /// Create a stopped store for the container at `container_uri`.
    ///
    /// Fails if the configuration or the container URI is invalid.
    pub fn new(
        container_uri: Url,
        credentials: Credentials,
        config: AdapterConfig,
        connector: Arc<dyn ContainerConnector>,
    ) -> StoreResult<Self> {
        config.validate()?;
        validate_container_uri(&container_uri)?;
        let root = config.canonical_root();
        Ok(Self {
            container_uri,
            credentials,
            root,
            config,
            connector,
            container: RwLock::new(None),
        })
    }

    /// Create a stopped store from a `scheme://host/container?<sas>` location.
    pub fn from_location(
        location: &str,
        config: AdapterConfig,
        connector: Arc<dyn ContainerConnector>,
    ) -> StoreResult<Self> {
        let Location {
            container_uri,
            credentials,
        } = Location::parse(location)?;
        Self::new(container_uri, credentials, config, connector)
    }

    /// The canonical object name prefix.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn container_uri(&self) -> &Url {
        &self.container_uri
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Returns `true` while a container handle is held.
    pub fn is_started(&self) -> bool {
        self.container.read().expect("lock poisoned").is_some()
    }

    /// Backend object name for `id`.
    pub fn object_name(&self, id: &ContentId) -> String {
        path::encode(&self.root, id)
    }

    fn container(&self) -> StoreResult<Arc<dyn BlobContainer>> {
        self.container
            .read()
            .expect("lock poisoned")
            .clone()
            .ok_or(StoreError::NotStarted)
    }

    async fn lookup(
        &self,
        container: &Arc<dyn BlobContainer>,
        id: &ContentId,
    ) -> StoreResult<Option<ObjectStats>> {
        let name = self.object_name(id);
        match container.properties(&name).await {
            Ok(properties) => Ok(stat::translate(container.as_ref(), &name, &properties)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlockStore for AzureBlockStore {
    async fn start(&self) -> StoreResult<()> {
        if self.is_started() {
            return Ok(());
        }
        let container = self
            .connector
            .connect(&self.container_uri, &self.credentials)
            .await?;
        let mut slot = self.container.write().expect("lock poisoned");
        if slot.is_none() {
            *slot = Some(container);
            info!(uri = %self.container_uri, root = %self.root, "block store started");
        }
        Ok(())
    }

    async fn stop(&self) -> StoreResult<()> {
        if self.container.write().expect("lock poisoned").take().is_some() {
            info!(uri = %self.container_uri, "block store stopped");
        }
        Ok(())
    }

    async fn stat(&self, id: &ContentId) -> StoreResult<Option<BlockStats>> {
        let container = self.container()?;
        Ok(self.lookup(&container, id).await?.map(|object| object.stats))
    }

    async fn get(&self, id: &ContentId) -> StoreResult<Option<Block>> {
        let container = self.container()?;
        Ok(self
            .lookup(&container, id)
            .await?
            .map(|object| object_block(&container, object)))
    }

    async fn put(&self, block: Block) -> StoreResult<Block> {
        let container = self.container()?;
        if let Some(existing) = self.lookup(&container, &block.id).await? {
            debug!(id = %block.id.short_hex(), "block already stored; skipping upload");
            return Ok(object_block(&container, existing));
        }

        let name = self.object_name(&block.id);
        let body = block.open(ByteRange::full()).await?;
        match container.upload(&name, body, WriteCondition::IfNotExists).await {
            Ok(size) => {
                if size != block.size {
                    warn!(
                        id = %block.id.short_hex(),
                        declared = block.size,
                        written = size,
                        "stored size differs from declared block size"
                    );
                }
                debug!(id = %block.id.short_hex(), size, "block stored");
                let content = ObjectContent::new(&container, name);
                Ok(Block::new(block.id, size, Utc::now(), Arc::new(content)))
            }
            Err(ContainerError::AlreadyExists { .. }) => {
                // A concurrent writer created the object first; same id, same bytes.
                debug!(id = %block.id.short_hex(), "block stored concurrently; using existing object");
                match self.lookup(&container, &block.id).await? {
                    Some(existing) => Ok(object_block(&container, existing)),
                    None => Err(StoreError::Backend {
                        status: Some(409),
                        message: format!("{name} reported as existing but could not be read"),
                    }),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &ContentId) -> StoreResult<bool> {
        let container = self.container()?;
        let name = self.object_name(id);
        match container.delete(&name).await {
            Ok(()) => {
                debug!(id = %id.short_hex(), "block deleted");
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, query: ListQuery) -> BlockStream {
        let container = match self.container() {
            Ok(container) => container,
            Err(e) => return stream::once(async move { Err::<Block, _>(e) }).boxed(),
        };
        if query.is_empty() {
            return stream::empty().boxed();
        }
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "block listing requested outside a tokio runtime");
                let err = StoreError::Backend {
                    status: None,
                    message: format!("listing requires a tokio runtime: {e}"),
                };
                return stream::once(async move { Err::<Block, _>(err) }).boxed();
            }
        };

        let (tx, rx) = mpsc::channel(self.config.list_buffer);
        let lister = Lister {
            container,
            root: self.root.clone(),
            page_size: self.config.list_page_size,
            query,
        };
        runtime.spawn(lister.run(tx));
        ReceiverStream::new(rx).boxed()
    }
}

impl fmt::Debug for AzureBlockStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureBlockStore")
            .field("container_uri", &self.container_uri.as_str())
            .field("root", &self.root)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

/// Producer side of a [`BlockStore::list`] stream.
///
/// Walks the flat listing of the root one page at a time, starting after
/// the `after` cursor, and applies the cursor window and limit locally. Each block is sent through a bounded
/// channel, so a slow consumer stalls the walk before the next page is
/// requested.
struct Lister {
    container: Arc<dyn BlobContainer>,
    root: String,
    page_size: usize,
    query: ListQuery,
}

impl Lister {
    async fn run(self, tx: mpsc::Sender<StoreResult<Block>>) {
        let mut remaining = self.query.limit;
        // Names sort as root + hex, so the listing can resume right after the cursor.
        let mut marker = self
            .query
            .after
            .as_ref()
            .map(|after| format!("{}{after}", self.root));
        let mut emitted = 0usize;

        loop {
            if tx.is_closed() {
                debug!(emitted, "list consumer closed");
                return;
            }
            let page = match self
                .container
                .list_page(&self.root, marker.as_deref(), self.page_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(root = %self.root, error = %e, "block listing failed");
                    let _ = tx.send(Err(e.into())).await;
                    return;
                }
            };

            for item in &page.items {
                let Some(key) = path::relative_name(&self.root, &item.name) else {
                    continue;
                };
                // Nested names would break the hex ordering the window relies on.
                if key.contains(path::SEPARATOR) {
                    trace!(name = %item.name, "skipping nested object");
                    continue;
                }
                let Some(object) =
                    stat::translate(self.container.as_ref(), &item.name, &item.properties)
                else {
                    trace!(name = %item.name, "skipping non-block object");
                    continue;
                };

                match self.query.position(key) {
                    WindowPosition::Before => continue,
                    WindowPosition::Beyond => {
                        debug!(emitted, "list window exhausted");
                        return;
                    }
                    WindowPosition::Inside => {}
                }

                if tx.send(Ok(object_block(&self.container, object))).await.is_err() {
                    debug!(emitted, "list consumer closed");
                    return;
                }
                emitted += 1;

                if let Some(n) = remaining.as_mut() {
                    *n -= 1;
                    if *n == 0 {
                        debug!(emitted, "list limit reached");
                        return;
                    }
                }
            }

            match page.next_marker {
                Some(next) if !page.items.is_empty() => marker = Some(next),
                _ => break,
            }
        }
        debug!(emitted, "list complete");
    }
}

/// Content of a stored block, read from its backend object on demand.
struct ObjectContent {
    container: Arc<dyn BlobContainer>,
    name: String,
    uri: String,
}

impl ObjectContent {
    fn new(container: &Arc<dyn BlobContainer>, name: String) -> Self {
        let uri = container.blob_uri(&name);
        Self {
            container: Arc::clone(container),
            name,
            uri,
        }
    }
}

#[async_trait]
impl ContentSource for ObjectContent {
    async fn open(&self, range: ByteRange) -> StoreResult<ByteStream> {
        trace!(uri = %self.uri, offset = range.offset, length = ?range.length, "opening blob read");
        Ok(self.container.open_read(&self.name, range).await?)
    }
}

fn object_block(container: &Arc<dyn BlobContainer>, object: ObjectStats) -> Block {
    let content = ObjectContent {
        container: Arc::clone(container),
        name: object.name,
        uri: object.uri,
    };
    Block::from_stats(object.stats, Arc::new(content))
}
