//! Foundation types for blobcas.
//!
//! Every block in a blobcas store is named by a [`ContentId`]: a
//! self-describing hash made of a one-byte algorithm tag and a fixed-size
//! digest. The hex encoding of a `ContentId` is what ends up in backend
//! object names, so this crate also pins down that encoding and its
//! ordering.
//!
//! # Key Types
//!
//! - [`ContentId`] -- algorithm tag + digest, hex-serialized
//! - [`HashAlgorithm`] -- supported digest functions (BLAKE3, SHA2-256)

pub mod content_id;
pub mod error;
pub mod hash;

pub use content_id::{ContentId, DIGEST_LEN, ENCODED_LEN};
pub use error::TypeError;
pub use hash::HashAlgorithm;
