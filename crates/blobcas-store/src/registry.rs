//! Scheme-keyed registry of block store factories.
//!
//! Generic bootstrapping code opens a store from a location string such as
//! `azblob://account.example.net/container?sv=...`. The registry maps the
//! location's scheme to the factory that knows how to build that kind of
//! store. It is populated explicitly at startup; no store registers itself.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

/// Free-form store options, e.g. `root = "/blocks"`.
pub type StoreOptions = BTreeMap<String, String>;

/// Builds a store for one location scheme.
pub trait StoreFactory: Send + Sync {
    /// Construct a (stopped) store for `location`.
    ///
    /// Construction failures, such as a malformed location or missing
    /// credentials, are reported here, before any lifecycle state exists.
    fn create(&self, location: &Url, options: &StoreOptions) -> StoreResult<Arc<dyn BlockStore>>;
}

/// Registry of [`StoreFactory`] values keyed by URI scheme.
#[derive(Default)]
pub struct StoreRegistry {
    factories: HashMap<String, Arc<dyn StoreFactory>>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `scheme`, returning any factory it replaces.
    ///
    /// Schemes are case-insensitive.
    pub fn register(
        &mut self,
        scheme: &str,
        factory: Arc<dyn StoreFactory>,
    ) -> Option<Arc<dyn StoreFactory>> {
        let scheme = scheme.to_ascii_lowercase();
        debug!(scheme = %scheme, "registered store factory");
        self.factories.insert(scheme, factory)
    }

    /// Returns `true` if a factory is registered for `scheme`.
    pub fn contains(&self, scheme: &str) -> bool {
        self.factories.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.factories.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Construct a store for `location` using the factory for its scheme.
    pub fn open(&self, location: &str, options: &StoreOptions) -> StoreResult<Arc<dyn BlockStore>> {
        let url = Url::parse(location)
            .map_err(|e| StoreError::Config(format!("invalid store location: {e}")))?;
        let factory = self
            .factories
            .get(url.scheme())
            .ok_or_else(|| StoreError::UnsupportedScheme(url.scheme().to_string()))?;
        factory.create(&url, options)
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream::{self, StreamExt};

    use blobcas_types::ContentId;

    use super::*;
    use crate::block::{Block, BlockStats};
    use crate::query::ListQuery;
    use crate::traits::BlockStream;

    struct EmptyStore;

    #[async_trait]
    impl BlockStore for EmptyStore {
        async fn start(&self) -> StoreResult<()> {
            Ok(())
        }
        async fn stop(&self) -> StoreResult<()> {
            Ok(())
        }
        async fn stat(&self, _id: &ContentId) -> StoreResult<Option<BlockStats>> {
            Ok(None)
        }
        async fn get(&self, _id: &ContentId) -> StoreResult<Option<Block>> {
            Ok(None)
        }
        async fn put(&self, block: Block) -> StoreResult<Block> {
            Ok(block)
        }
        async fn delete(&self, _id: &ContentId) -> StoreResult<bool> {
            Ok(false)
        }
        fn list(&self, _query: ListQuery) -> BlockStream {
            stream::empty().boxed()
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        seen: Mutex<Vec<(String, StoreOptions)>>,
    }

    impl StoreFactory for RecordingFactory {
        fn create(&self, location: &Url, options: &StoreOptions) -> StoreResult<Arc<dyn BlockStore>> {
            self.seen
                .lock()
                .expect("lock poisoned")
                .push((location.to_string(), options.clone()));
            Ok(Arc::new(EmptyStore))
        }
    }

    #[test]
    fn open_dispatches_on_scheme() {
        let factory = Arc::new(RecordingFactory::default());
        let mut registry = StoreRegistry::new();
        registry.register("mem", factory.clone());

        let mut options = StoreOptions::new();
        options.insert("root".into(), "/blocks".into());
        registry.open("mem://host/container", &options).unwrap();

        let seen = factory.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "mem://host/container");
        assert_eq!(seen[0].1.get("root").map(String::as_str), Some("/blocks"));
    }

    #[test]
    fn schemes_are_case_insensitive() {
        let mut registry = StoreRegistry::new();
        registry.register("MEM", Arc::new(RecordingFactory::default()));
        assert!(registry.contains("mem"));
        assert!(registry.open("Mem://host/c", &StoreOptions::new()).is_ok());
    }

    #[test]
    fn register_replaces_previous_factory() {
        let mut registry = StoreRegistry::new();
        assert!(registry.register("mem", Arc::new(RecordingFactory::default())).is_none());
        assert!(registry.register("mem", Arc::new(RecordingFactory::default())).is_some());
        assert_eq!(registry.schemes(), vec!["mem".to_string()]);
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let registry = StoreRegistry::new();
        let err = registry.open("s3://bucket/path", &StoreOptions::new()).err().unwrap();
        assert!(matches!(err, StoreError::UnsupportedScheme(ref s) if s == "s3"));
    }

    #[test]
    fn malformed_location_is_a_config_error() {
        let registry = StoreRegistry::new();
        let err = registry.open("not a url", &StoreOptions::new()).err().unwrap();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[tokio::test]
    async fn contains_defaults_to_stat() {
        let store = EmptyStore;
        assert!(!store.contains(&ContentId::blake3(b"x")).await.unwrap());
    }

    #[test]
    fn debug_lists_schemes() {
        let mut registry = StoreRegistry::new();
        registry.register("mem", Arc::new(RecordingFactory::default()));
        assert!(format!("{registry:?}").contains("mem"));
    }
}
