use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::debug;
use url::Url;

use blobcas_store::{collect, ByteRange, ByteStream, StoreError};

use crate::credentials::Credentials;
use crate::error::{ContainerError, ContainerResult};
use crate::traits::{validate_container_uri, BlobContainer, ContainerConnector};
use crate::types::{BlobItem, BlobProperties, ListPage, WriteCondition};

/// Container operations that can be made to fail on purpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlobOp {
    Properties,
    Read,
    Upload,
    Delete,
    List,
}

/// An injected failure: calls of an operation fail with `status` once
/// `after_calls` calls have succeeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fault {
    pub status: u16,
    pub after_calls: usize,
}

impl Fault {
    /// Fail every call from now on.
    pub fn now(status: u16) -> Self {
        Self {
            status,
            after_calls: 0,
        }
    }

    /// Let `calls` more calls succeed, then fail.
    pub fn after(calls: usize, status: u16) -> Self {
        Self {
            status,
            after_calls: calls,
        }
    }
}

#[derive(Clone, Debug)]
struct StoredBlob {
    data: Bytes,
    last_modified: Option<DateTime<Utc>>,
    created_on: Option<DateTime<Utc>>,
}

impl StoredBlob {
    fn properties(&self) -> BlobProperties {
        BlobProperties {
            content_length: self.data.len() as u64,
            last_modified: self.last_modified,
            created_on: self.created_on,
        }
    }
}

/// In-memory, `BTreeMap`-based container.
///
/// Intended for tests and embedding. Objects are kept in name order, so
/// listings come back in the same byte-lexicographic order a remote
/// container uses. Supports fault injection and counts listing requests.
pub struct InMemoryContainer {
    uri: Url,
    blobs: RwLock<BTreeMap<String, StoredBlob>>,
    faults: Mutex<HashMap<BlobOp, Fault>>,
    list_calls: AtomicUsize,
    properties_calls: AtomicUsize,
}

impl InMemoryContainer {
    /// Create a new empty container at `uri`.
    pub fn new(uri: Url) -> Self {
        Self {
            uri,
            blobs: RwLock::new(BTreeMap::new()),
            faults: Mutex::new(HashMap::new()),
            list_calls: AtomicUsize::new(0),
            properties_calls: AtomicUsize::new(0),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the container is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|blob| blob.data.len() as u64)
            .sum()
    }

    /// All object names, in listing order.
    pub fn names(&self) -> Vec<String> {
        self.blobs.read().expect("lock poisoned").keys().cloned().collect()
    }

    /// Raw content of `name`, bypassing the async API.
    pub fn data(&self, name: &str) -> Option<Bytes> {
        self.blobs
            .read()
            .expect("lock poisoned")
            .get(name)
            .map(|blob| blob.data.clone())
    }

    /// Place an object directly, stamped with the current time.
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Bytes>) {
        let now = Utc::now();
        self.insert_with_times(name, data, Some(now), Some(now));
    }

    /// Place an object directly with explicit timestamps.
    pub fn insert_with_times(
        &self,
        name: impl Into<String>,
        data: impl Into<Bytes>,
        last_modified: Option<DateTime<Utc>>,
        created_on: Option<DateTime<Utc>>,
    ) {
        let blob = StoredBlob {
            data: data.into(),
            last_modified,
            created_on,
        };
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(name.into(), blob);
    }

    /// Remove all objects.
    pub fn clear(&self) {
        self.blobs.write().expect("lock poisoned").clear();
    }

    /// Make calls of `op` fail according to `fault`.
    pub fn inject_fault(&self, op: BlobOp, fault: Fault) {
        self.faults.lock().expect("lock poisoned").insert(op, fault);
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.faults.lock().expect("lock poisoned").clear();
    }

    /// Number of `list_page` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `properties` calls served so far.
    pub fn properties_calls(&self) -> usize {
        self.properties_calls.load(Ordering::SeqCst)
    }

    fn check_fault(&self, op: BlobOp) -> ContainerResult<()> {
        let mut faults = self.faults.lock().expect("lock poisoned");
        if let Some(fault) = faults.get_mut(&op) {
            if fault.after_calls == 0 {
                return Err(ContainerError::from_status(
                    fault.status,
                    format!("injected {op:?} failure"),
                ));
            }
            fault.after_calls -= 1;
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> ContainerResult<StoredBlob> {
        self.blobs
            .read()
            .expect("lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::NotFound {
                name: name.to_string(),
            })
    }
}

#[async_trait]
impl BlobContainer for InMemoryContainer {
    fn uri(&self) -> &Url {
        &self.uri
    }

    async fn properties(&self, name: &str) -> ContainerResult<BlobProperties> {
        self.check_fault(BlobOp::Properties)?;
        self.properties_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lookup(name)?.properties())
    }

    async fn open_read(&self, name: &str, range: ByteRange) -> ContainerResult<ByteStream> {
        self.check_fault(BlobOp::Read)?;
        let blob = self.lookup(name)?;
        let size = blob.data.len() as u64;
        let (start, end) = range
            .resolve(size)
            .ok_or_else(|| ContainerError::RangeNotSatisfiable {
                name: name.to_string(),
                offset: range.offset,
                size,
            })?;
        let chunk = blob.data.slice(start as usize..end as usize);
        Ok(stream::once(async move { Ok::<_, std::io::Error>(chunk) }).boxed())
    }

    async fn upload(
        &self,
        name: &str,
        body: ByteStream,
        condition: WriteCondition,
    ) -> ContainerResult<u64> {
        self.check_fault(BlobOp::Upload)?;
        let data = collect(body).await.map_err(|e| match e {
            StoreError::Io(io) => ContainerError::Io(io),
            other => ContainerError::from_status(400, other.to_string()),
        })?;
        let size = data.len() as u64;

        let mut blobs = self.blobs.write().expect("lock poisoned");
        if condition == WriteCondition::IfNotExists && blobs.contains_key(name) {
            return Err(ContainerError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let now = Utc::now();
        blobs.insert(
            name.to_string(),
            StoredBlob {
                data,
                last_modified: Some(now),
                created_on: Some(now),
            },
        );
        debug!(name, size, "blob uploaded");
        Ok(size)
    }

    async fn delete(&self, name: &str) -> ContainerResult<()> {
        self.check_fault(BlobOp::Delete)?;
        match self.blobs.write().expect("lock poisoned").remove(name) {
            Some(_) => Ok(()),
            None => Err(ContainerError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    async fn list_page(
        &self,
        prefix: &str,
        marker: Option<&str>,
        max_results: usize,
    ) -> ContainerResult<ListPage> {
        self.check_fault(BlobOp::List)?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if max_results == 0 {
            return Err(ContainerError::from_status(400, "max_results must be positive"));
        }

        let lower = match marker {
            Some(m) if m >= prefix => Bound::Excluded(m),
            _ => Bound::Included(prefix),
        };
        let blobs = self.blobs.read().expect("lock poisoned");
        let mut items: Vec<BlobItem> = blobs
            .range::<str, _>((lower, Bound::Unbounded))
            .take_while(|(name, _)| name.starts_with(prefix))
            .take(max_results + 1)
            .map(|(name, blob)| BlobItem {
                name: name.clone(),
                properties: blob.properties(),
            })
            .collect();

        let next_marker = if items.len() > max_results {
            items.truncate(max_results);
            items.last().map(|item| item.name.clone())
        } else {
            None
        };
        Ok(ListPage { items, next_marker })
    }
}

impl std::fmt::Debug for InMemoryContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContainer")
            .field("uri", &self.uri.as_str())
            .field("object_count", &self.len())
            .finish()
    }
}

/// Connector over a fixed set of in-memory containers.
///
/// Containers must be created up front with [`create_container`]; connecting
/// to an unknown URI fails with 404, as it would against a real account.
/// A shared-access signature without a `sig` parameter is refused with 403.
///
/// [`create_container`]: InMemoryConnector::create_container
#[derive(Debug, Default)]
pub struct InMemoryConnector {
    containers: RwLock<HashMap<String, Arc<InMemoryContainer>>>,
    connections: AtomicUsize,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or return the existing) container at `uri`.
    pub fn create_container(&self, uri: &Url) -> Arc<InMemoryContainer> {
        let key = container_key(uri);
        let mut containers = self.containers.write().expect("lock poisoned");
        Arc::clone(
            containers
                .entry(key)
                .or_insert_with(|| Arc::new(InMemoryContainer::new(uri.clone()))),
        )
    }

    /// Number of successful `connect` calls.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerConnector for InMemoryConnector {
    async fn connect(
        &self,
        uri: &Url,
        credentials: &Credentials,
    ) -> ContainerResult<Arc<dyn BlobContainer>> {
        validate_container_uri(uri)?;
        if let Credentials::Sas(token) = credentials {
            if !token.is_signed() {
                return Err(ContainerError::from_status(
                    403,
                    format!("shared access signature for {uri} is not signed"),
                ));
            }
        }
        let container = self
            .containers
            .read()
            .expect("lock poisoned")
            .get(&container_key(uri))
            .cloned()
            .ok_or_else(|| {
                ContainerError::from_status(404, format!("container not found: {uri}"))
            })?;
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(container)
    }
}

fn container_key(uri: &Url) -> String {
    uri.as_str().trim_end_matches('/').to_string()
}
