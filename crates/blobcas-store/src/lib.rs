//! Block store protocol for blobcas.
//!
//! A block store keeps immutable, content-addressed blocks. This crate
//! defines the backend-independent contract every store implements, and
//! the value types that cross it.
//!
//! # Types
//!
//! - [`Block`] -- identifier, size, storage time, and a lazy [`ContentSource`]
//! - [`BlockStats`] -- the metadata part of a block
//! - [`ListQuery`] -- cursor window and limit for enumeration
//! - [`ByteRange`] -- zero-based, optionally open-ended content window
//!
//! # Stores
//!
//! All stores implement the [`BlockStore`] trait. A [`StoreRegistry`]
//! opens stores from location strings by scheme.
//!
//! # Design Rules
//!
//! 1. Blocks are immutable; re-storing an identifier is a no-op.
//! 2. Absence is a normal result, never an error.
//! 3. Content is read lazily, never materialized by the store itself.
//! 4. The store never verifies that content matches its identifier.
//! 5. Backend errors are propagated, never retried by the store.

pub mod block;
pub mod error;
pub mod query;
pub mod registry;
pub mod traits;

pub use block::{collect, Block, BlockStats, ByteRange, ByteStream, BytesContent, ContentSource};
pub use error::{StoreError, StoreResult};
pub use query::{ListQuery, WindowPosition};
pub use registry::{StoreFactory, StoreOptions, StoreRegistry};
pub use traits::{BlockStore, BlockStream};
