use deepeq_canonical::{ConfigChecksum, StructureError};
use thiserror::Error;

/// Errors raised by deep-equality collections.
#[derive(Debug, Error)]
pub enum DeepEqualityError {
    /// An argument has no meaningful answer, such as comparing zero values.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Two collections with different configurations were combined.
    #[error("configuration mismatch: {left} vs {right}")]
    ConfigurationMismatch {
        /// Checksum of the receiving collection.
        left: ConfigChecksum,
        /// Checksum of the other collection.
        right: ConfigChecksum,
    },
    /// A bidirectional map would bind one value to two keys.
    #[error("Could not set key='{key}': The value='{value}' is already associated with key='{existing_key}'")]
    UniquenessConflict {
        /// Rendered key that was being written.
        key: String,
        /// Rendered value that was being written.
        value: String,
        /// Rendered key already bound to the value.
        existing_key: String,
    },
    /// A key or value could not be lifted into a structure.
    #[error(transparent)]
    Structure(#[from] StructureError),
}
