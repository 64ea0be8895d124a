use deepeq_canonical::Normalizer;
use tracing::debug;

use crate::errors::DeepEqualityError;

/// Cross-collection algebra for collections sharing one configuration.
///
/// Every operation first checks that both sides were built from equal
/// configurations and fails with [`DeepEqualityError::ConfigurationMismatch`]
/// otherwise. Derived collections inherit the configuration of `self`.
pub trait Comparable: Sized {
    /// True iff both sides hold the same entries.
    fn equals(&self, other: &Self) -> Result<bool, DeepEqualityError>;

    /// True iff every entry of `other` has an equal counterpart in `self`.
    fn contains(&self, other: &Self) -> Result<bool, DeepEqualityError>;

    /// Entries of `other` overlaid with the entries of `self`; `self` wins on
    /// key collisions.
    fn union(&self, other: &Self) -> Result<Self, DeepEqualityError>;

    /// Entries of `self` that are also present in `other`.
    fn intersection(&self, other: &Self) -> Result<Self, DeepEqualityError>;

    /// Entries of `self` that are absent from `other`.
    fn difference(&self, other: &Self) -> Result<Self, DeepEqualityError>;
}

pub(crate) fn ensure_same_options(
    left: &Normalizer,
    right: &Normalizer,
) -> Result<(), DeepEqualityError> {
    if left.config_checksum() == right.config_checksum() {
        return Ok(());
    }
    debug!(
        left = %left.config_checksum(),
        right = %right.config_checksum(),
        "rejecting comparison across configurations"
    );
    Err(DeepEqualityError::ConfigurationMismatch {
        left: left.config_checksum().clone(),
        right: right.config_checksum().clone(),
    })
}
