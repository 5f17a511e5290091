//! Object-storage container contract for blobcas.
//!
//! A block store persists blocks as named objects in a single container of
//! a remote object store. This crate defines what the store needs from the
//! object-storage client, and nothing more:
//!
//! - [`BlobContainer`] -- properties, ranged reads, conditional uploads,
//!   deletes, and paginated flat listings
//! - [`ContainerConnector`] -- opens a container from its URI and
//!   [`Credentials`]
//!
//! Connection handling, authentication, TLS, and retries belong to the
//! client behind these traits.
//!
//! [`InMemoryContainer`] and [`InMemoryConnector`] implement the contract
//! in memory, with fault injection, for tests and embedding.

pub mod credentials;
pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use credentials::{Credentials, SasToken};
pub use error::{ContainerError, ContainerResult};
pub use memory::{BlobOp, Fault, InMemoryConnector, InMemoryContainer};
pub use traits::{validate_container_uri, BlobContainer, ContainerConnector};
pub use types::{BlobItem, BlobProperties, ListPage, WriteCondition};
