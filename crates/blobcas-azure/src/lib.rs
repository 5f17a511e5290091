//! Blob-container block store for blobcas.
//!
//! [`AzureBlockStore`] persists each block as one object in a remote blob
//! container, named by the lowercase hex of its identifier under a
//! configurable root:
//!
//! ```text
//! https://acct.blob.example.net/container/<root>/1e9f86d0...
//! ```
//!
//! The store talks to the container only through the
//! [`BlobContainer`](blobcas_container::BlobContainer) contract, so any
//! [`ContainerConnector`] can back it.
//!
//! # Layout
//!
//! - [`path`] -- identifier <-> object name codec
//! - [`config`] -- adapter options (root, listing buffer and page size)
//! - [`location`] -- `azblob://host/container?<sas>` location strings
//!
//! # Registration
//!
//! Call [`register`] once at startup to make `azblob://` locations
//! openable through a [`StoreRegistry`].

pub mod config;
pub mod location;
pub mod path;
mod stat;
mod store;

use std::sync::Arc;

use tracing::debug;
use url::Url;

use blobcas_container::ContainerConnector;
use blobcas_store::{BlockStore, StoreFactory, StoreOptions, StoreRegistry, StoreResult};

pub use config::AdapterConfig;
pub use location::Location;
pub use store::AzureBlockStore;

/// Location scheme served by this crate.
pub const SCHEME: &str = "azblob";

/// [`StoreFactory`] building [`AzureBlockStore`] values.
pub struct AzureStoreFactory {
    connector: Arc<dyn ContainerConnector>,
}

impl AzureStoreFactory {
    pub fn new(connector: Arc<dyn ContainerConnector>) -> Self {
        Self { connector }
    }
}

impl StoreFactory for AzureStoreFactory {
    fn create(&self, location: &Url, options: &StoreOptions) -> StoreResult<Arc<dyn BlockStore>> {
        let config = AdapterConfig::from_options(options)?;
        let Location {
            container_uri,
            credentials,
        } = Location::from_url(location)?;
        debug!(container = %container_uri, root = %config.root, "creating block store");
        let store = AzureBlockStore::new(container_uri, credentials, config, self.connector.clone())?;
        Ok(Arc::new(store))
    }
}

/// Register the `azblob` scheme in `registry`, backed by `connector`.
pub fn register(registry: &mut StoreRegistry, connector: Arc<dyn ContainerConnector>) {
    registry.register(SCHEME, Arc::new(AzureStoreFactory::new(connector)));
}

#[cfg(test)]
mod tests {
    use blobcas_container::InMemoryConnector;
    use blobcas_store::{Block, StoreError};

    use super::*;

    const LOCATION: &str = "azblob://acct.blob.example.net/blocks?sv=2021-08-06&sp=rwdl&sig=abc";

    fn registry() -> (StoreRegistry, Arc<InMemoryConnector>) {
        let connector = Arc::new(InMemoryConnector::new());
        let mut registry = StoreRegistry::new();
        register(&mut registry, connector.clone());
        (registry, connector)
    }

    #[test]
    fn registers_azblob_scheme() {
        let (registry, _) = registry();
        assert!(registry.contains(SCHEME));
        assert!(registry.contains("AZBLOB"));
        assert_eq!(registry.schemes(), vec![SCHEME.to_string()]);
    }

    #[tokio::test]
    async fn opens_and_round_trips_through_registry() {
        let (registry, connector) = registry();
        let container = connector
            .create_container(&Url::parse("https://acct.blob.example.net/blocks").unwrap());

        let mut options = StoreOptions::new();
        options.insert("root".into(), "/cas".into());
        let store = registry.open(LOCATION, &options).unwrap();
        store.start().await.unwrap();

        let block = Block::from_bytes(&b"through the registry"[..]);
        store.put(block.clone()).await.unwrap();

        let name = format!("cas/{}", block.id.to_hex());
        assert_eq!(container.names(), vec![name]);
        let fetched = store.get(&block.id).await.unwrap().unwrap();
        assert_eq!(&fetched.read_all().await.unwrap()[..], b"through the registry");
    }

    #[test]
    fn missing_sas_is_a_config_error() {
        let (registry, _) = registry();
        let err = registry
            .open("azblob://acct.blob.example.net/blocks", &StoreOptions::new())
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let (registry, _) = registry();
        let mut options = StoreOptions::new();
        options.insert("list_buffer".into(), "0".into());
        let err = registry.open(LOCATION, &options).err().unwrap();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[tokio::test]
    async fn start_fails_for_unknown_container() {
        let (registry, _) = registry();
        let store = registry.open(LOCATION, &StoreOptions::new()).unwrap();
        let err = store.start().await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }
}
