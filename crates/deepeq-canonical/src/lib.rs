//! Structural normalization and canonical digests for deep-equality collections.
//!
//! Values are lifted through `serde` into a [`Structure`] tree, passed through
//! the configured [`Transform`] chain, and either kept as primitives or hashed
//! from a deterministic canonical encoding. Collections key their entries by
//! the resulting [`Normalized`] identity.
//!
#![deny(missing_docs)]

/// Deterministic, type-tagged text encoding of structures.
pub mod canonicalizer;
/// Digest algorithms, encodings and standalone hashing helpers.
pub mod digest;
/// Primitive-or-digest identities for keys and values.
pub mod normalizer;
/// Caller options and the defaults resolver.
pub mod options;
/// `serde` serializer that lifts values into structures.
pub mod serializer;
/// Structural value model.
pub mod structure;
/// Composable pre-hash transforms.
pub mod transform;

pub use canonicalizer::Canonicalizer;
pub use digest::{digest_bytes, hash_structure, hash_value, DigestAlg, DigestEncoding, HashOptions};
pub use normalizer::{Normalized, Normalizer};
pub use options::{resolve, ConfigChecksum, Options, ResolvedOptions};
pub use serializer::{StructureError, StructureSerializer};
pub use structure::Structure;
pub use transform::{to_plain_json, Transform, TransformFn};
