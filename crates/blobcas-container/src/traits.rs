use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use blobcas_store::{ByteRange, ByteStream};

use crate::credentials::Credentials;
use crate::error::{ContainerError, ContainerResult};
use crate::types::{BlobProperties, ListPage, WriteCondition};

/// Handle to one object-storage container.
///
/// This is the surface a block store needs from an object-storage client.
/// Implementations own connection management, authentication, and retry
/// policy; a call that returns `Err` has already exhausted whatever retries
/// the client performs.
///
/// Object names are flat strings. `/` has no meaning to the container
/// beyond ordering; "directories" are just shared name prefixes.
#[async_trait]
pub trait BlobContainer: Send + Sync {
    /// URI of the container itself.
    fn uri(&self) -> &Url;

    /// URI of the object `name` within this container.
    fn blob_uri(&self, name: &str) -> String {
        format!("{}/{}", self.uri().as_str().trim_end_matches('/'), name)
    }

    /// Properties of `name`. Fails with [`ContainerError::NotFound`] if
    /// the object does not exist.
    async fn properties(&self, name: &str) -> ContainerResult<BlobProperties>;

    /// Returns `true` if an object named `name` exists.
    async fn exists(&self, name: &str) -> ContainerResult<bool> {
        match self.properties(name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Open a read stream over `range` of `name`.
    async fn open_read(&self, name: &str, range: ByteRange) -> ContainerResult<ByteStream>;

    /// Write `body` to `name`, subject to `condition`. Returns the number of
    /// bytes written.
    ///
    /// With [`WriteCondition::IfNotExists`] the create is atomic: at most
    /// one concurrent writer succeeds and the others get
    /// [`ContainerError::AlreadyExists`].
    async fn upload(
        &self,
        name: &str,
        body: ByteStream,
        condition: WriteCondition,
    ) -> ContainerResult<u64>;

    /// Delete `name`. Fails with [`ContainerError::NotFound`] if absent.
    async fn delete(&self, name: &str) -> ContainerResult<()>;

    /// One page of a recursive listing of objects whose names start with
    /// `prefix`, in ascending byte order of name, resuming after `marker`.
    async fn list_page(
        &self,
        prefix: &str,
        marker: Option<&str>,
        max_results: usize,
    ) -> ContainerResult<ListPage>;
}

/// Opens container handles.
#[async_trait]
pub trait ContainerConnector: Send + Sync {
    /// Open the container at `uri`, authenticating with `credentials`.
    async fn connect(
        &self,
        uri: &Url,
        credentials: &Credentials,
    ) -> ContainerResult<Arc<dyn BlobContainer>>;
}

/// Reject container URIs a connector cannot use.
pub fn validate_container_uri(uri: &Url) -> ContainerResult<()> {
    if uri.cannot_be_a_base() || uri.host_str().is_none() {
        return Err(ContainerError::InvalidUri(format!(
            "container URI has no host: {uri}"
        )));
    }
    if uri.query().is_some() {
        return Err(ContainerError::InvalidUri(
            "container URI must not carry a query; pass credentials separately".into(),
        ));
    }
    Ok(())
}
