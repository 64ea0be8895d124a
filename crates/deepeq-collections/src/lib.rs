//! Maps and sets keyed by structural equality.
//!
//! [`DeepMap`], [`DeepSet`] and [`BiDirectionalDeepMap`] accept any
//! `serde::Serialize` key and compare keys by their normalized structure
//! rather than by identity. Collections built from equal [`Options`] can be
//! combined through the [`Comparable`] algebra.
//!
#![deny(missing_docs)]

/// One-to-one map with lookups in both directions.
pub mod bidirectional;
/// Cross-collection algebra.
pub mod comparable;
/// One-shot equality checks.
pub mod equality;
/// Error type shared by every collection.
pub mod errors;
/// Structurally keyed map.
pub mod map;
/// Structurally keyed set.
pub mod set;

pub use bidirectional::BiDirectionalDeepMap;
pub use comparable::Comparable;
pub use equality::{are_equal, is_equal};
pub use errors::DeepEqualityError;
pub use map::DeepMap;
pub use set::DeepSet;

pub use deepeq_canonical::{
    DigestAlg, DigestEncoding, Normalized, Normalizer, Options, ResolvedOptions, Structure,
    Transform,
};
