use serde::Deserialize;
use std::fmt;

use crate::digest::{digest_bytes, DigestAlg, DigestEncoding};
use crate::transform::Transform;

/// Caller-facing configuration. Every field is optional; see [`resolve`].
///
/// The data-only fields deserialize from camelCase JSON, so a configuration
/// such as `{"algorithm": "sha-256", "caseInsensitive": true}` can be loaded
/// with [`Options::from_json_str`]. Function-valued fields are set in code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    /// Digest algorithm for composite values.
    pub algorithm: Option<DigestAlg>,
    /// Encoding of digest bytes.
    pub encoding: Option<DigestEncoding>,
    /// Applied to map keys and set elements before normalization.
    #[serde(skip)]
    pub transformer: Option<Transform>,
    /// Applied to map values before normalization.
    #[serde(skip)]
    pub map_value_transformer: Option<Transform>,
    /// Reduce keys and values to plain JSON data before the transformers run.
    pub use_to_json_transform: Option<bool>,
    /// Fold strings to lower case, including strings nested in composites.
    pub case_insensitive: Option<bool>,
    /// Runs on every node of a composite while it is hashed, after case folding.
    #[serde(skip)]
    pub replacer: Option<Transform>,
}

impl Options {
    /// Empty options; every field falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the data-only fields from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the digest algorithm.
    pub fn with_algorithm(mut self, algorithm: DigestAlg) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Sets the digest encoding.
    pub fn with_encoding(mut self, encoding: DigestEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Sets the key (and set element) transformer.
    pub fn with_transformer(mut self, transformer: Transform) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Sets the map value transformer.
    pub fn with_map_value_transformer(mut self, transformer: Transform) -> Self {
        self.map_value_transformer = Some(transformer);
        self
    }

    /// Enables or disables the plain JSON reduction.
    pub fn with_to_json_transform(mut self, enabled: bool) -> Self {
        self.use_to_json_transform = Some(enabled);
        self
    }

    /// Enables or disables case-insensitive strings.
    pub fn with_case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = Some(enabled);
        self
    }

    /// Sets the hash-time replacer.
    pub fn with_replacer(mut self, replacer: Transform) -> Self {
        self.replacer = Some(replacer);
        self
    }
}

/// Fully populated configuration, produced by [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    /// Digest algorithm for composite values.
    pub algorithm: DigestAlg,
    /// Encoding of digest bytes.
    pub encoding: DigestEncoding,
    /// Key (and set element) transformer.
    pub transformer: Transform,
    /// Map value transformer.
    pub map_value_transformer: Transform,
    /// Plain JSON reduction before the transformers.
    pub use_to_json_transform: bool,
    /// Case-insensitive strings.
    pub case_insensitive: bool,
    /// Hash-time replacer; [`Transform::Identity`] when unset.
    pub replacer: Transform,
}

impl ResolvedOptions {
    /// Opaque token that is equal for two configurations iff every resolved
    /// field is equal, transform identities included.
    pub fn checksum(&self) -> ConfigChecksum {
        let descriptor = format!(
            "algorithm={};encoding={};transformer={};mapValueTransformer={};\
             useToJsonTransform={};caseInsensitive={};replacer={}",
            self.algorithm.as_str(),
            self.encoding.as_str(),
            self.transformer.fingerprint(),
            self.map_value_transformer.fingerprint(),
            self.use_to_json_transform,
            self.case_insensitive,
            self.replacer.fingerprint(),
        );
        ConfigChecksum(digest_bytes(
            DigestAlg::Sha256,
            DigestEncoding::Base64Url,
            descriptor.as_bytes(),
        ))
    }
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        resolve(&Options::default())
    }
}

impl From<ResolvedOptions> for Options {
    fn from(resolved: ResolvedOptions) -> Self {
        Self {
            algorithm: Some(resolved.algorithm),
            encoding: Some(resolved.encoding),
            transformer: Some(resolved.transformer),
            map_value_transformer: Some(resolved.map_value_transformer),
            use_to_json_transform: Some(resolved.use_to_json_transform),
            case_insensitive: Some(resolved.case_insensitive),
            replacer: Some(resolved.replacer),
        }
    }
}

/// Overlays the supplied fields onto the defaults.
///
/// Defaults: [`DigestAlg::Sip128`], [`DigestEncoding::Hex`], identity
/// transformers, no JSON reduction, case-sensitive, no replacer. Resolving
/// is pure and idempotent.
pub fn resolve(options: &Options) -> ResolvedOptions {
    ResolvedOptions {
        algorithm: options.algorithm.unwrap_or_default(),
        encoding: options.encoding.unwrap_or_default(),
        transformer: options.transformer.clone().unwrap_or_default(),
        map_value_transformer: options.map_value_transformer.clone().unwrap_or_default(),
        use_to_json_transform: options.use_to_json_transform.unwrap_or(false),
        case_insensitive: options.case_insensitive.unwrap_or(false),
        replacer: options.replacer.clone().unwrap_or_default(),
    }
}

/// Configuration equality token; see [`ResolvedOptions::checksum`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigChecksum(String);

impl AsRef<str> for ConfigChecksum {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::Structure;

    #[test]
    fn defaults() {
        let resolved = resolve(&Options::default());
        assert_eq!(resolved.algorithm, DigestAlg::Sip128);
        assert_eq!(resolved.encoding, DigestEncoding::Hex);
        assert_eq!(resolved.transformer, Transform::Identity);
        assert_eq!(resolved.map_value_transformer, Transform::Identity);
        assert!(!resolved.use_to_json_transform);
        assert!(!resolved.case_insensitive);
        assert_eq!(resolved.replacer, Transform::Identity);
    }

    #[test]
    fn supplied_values_override_defaults() {
        let resolved = resolve(
            &Options::new()
                .with_algorithm(DigestAlg::Sha256)
                .with_to_json_transform(true)
                .with_case_insensitive(true),
        );
        assert_eq!(resolved.algorithm, DigestAlg::Sha256);
        assert_eq!(resolved.encoding, DigestEncoding::Hex);
        assert_eq!(resolved.transformer, Transform::Identity);
        assert!(resolved.use_to_json_transform);
        assert!(resolved.case_insensitive);
    }

    #[test]
    fn resolve_is_idempotent() {
        let options = Options::new()
            .with_case_insensitive(true)
            .with_transformer(Transform::custom(|s| s));
        let once = resolve(&options);
        let twice = resolve(&Options::from(once.clone()));
        assert_eq!(once, twice);
        assert_eq!(once.checksum(), twice.checksum());
    }

    #[test]
    fn checksum_tracks_every_field() {
        let base = resolve(&Options::default()).checksum();
        assert_eq!(base, resolve(&Options::default()).checksum());
        assert_ne!(
            base,
            resolve(&Options::new().with_encoding(DigestEncoding::Base64Url)).checksum()
        );
        assert_ne!(
            base,
            resolve(&Options::new().with_case_insensitive(true)).checksum()
        );
        assert_ne!(
            base,
            resolve(&Options::new().with_replacer(Transform::custom(|s: Structure| s))).checksum()
        );
    }

    #[test]
    fn separately_built_closures_are_different_configurations() {
        let left = Options::new().with_transformer(Transform::custom(|s| s));
        let right = Options::new().with_transformer(Transform::custom(|s| s));
        assert_ne!(resolve(&left).checksum(), resolve(&right).checksum());
        assert_eq!(resolve(&left).checksum(), resolve(&left.clone()).checksum());
    }

    #[test]
    fn loads_from_json() {
        let options =
            Options::from_json_str(r#"{"algorithm": "sha-256", "caseInsensitive": true}"#).unwrap();
        assert_eq!(options.algorithm, Some(DigestAlg::Sha256));
        assert_eq!(options.case_insensitive, Some(true));
        assert_eq!(options.use_to_json_transform, None);
        assert!(Options::from_json_str(r#"{"unknown": 1}"#).is_err());
    }
}
