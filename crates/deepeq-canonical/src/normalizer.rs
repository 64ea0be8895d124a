use ordered_float::OrderedFloat;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::canonicalizer::Canonicalizer;
use crate::digest::digest_bytes;
use crate::options::{resolve, ConfigChecksum, Options, ResolvedOptions};
use crate::serializer::StructureError;
use crate::structure::Structure;
use crate::transform::Transform;

/// Normalized identity of a key or value.
///
/// Primitives are kept as they are; composites are replaced by the digest of
/// their canonical encoding. A digest never equals a string because they are
/// separate variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Normalized {
    /// Null, unit or `None`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer, including integral floats.
    Int(i128),
    /// Non-integral float. NaN equals NaN.
    Float(OrderedFloat<f64>),
    /// String, lower-cased when case-insensitive.
    Str(String),
    /// Digest of a composite value.
    Digest(String),
}

impl Normalized {
    /// True when this identity came from hashing a composite.
    pub fn is_digest(&self) -> bool {
        matches!(self, Normalized::Digest(_))
    }
}

impl fmt::Display for Normalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalized::Null => f.write_str("null"),
            Normalized::Bool(b) => write!(f, "{}", b),
            Normalized::Int(i) => write!(f, "{}", i),
            Normalized::Float(x) => write!(f, "{}", x.0),
            Normalized::Str(s) => write!(f, "{:?}", s),
            Normalized::Digest(d) => write!(f, "#{}", d),
        }
    }
}

/// Maps keys and values to their [`Normalized`] identity under one
/// resolved configuration.
///
/// The transformer chains and the hashing replacer are composed once at
/// construction.
#[derive(Debug, Clone)]
pub struct Normalizer {
    options: ResolvedOptions,
    key_transform: Transform,
    value_transform: Transform,
    canonicalizer: Canonicalizer,
    checksum: ConfigChecksum,
}

impl Normalizer {
    /// Resolves `options` and prepares the transform chains.
    pub fn new(options: &Options) -> Self {
        let options = resolve(options);
        let json_step = if options.use_to_json_transform {
            Transform::PlainJson
        } else {
            Transform::Identity
        };
        let key_transform = Transform::chain([json_step.clone(), options.transformer.clone()]);
        let value_transform =
            Transform::chain([json_step, options.map_value_transformer.clone()]);

        let fold = if options.case_insensitive {
            Transform::custom(fold_case)
        } else {
            Transform::Identity
        };
        let canonicalizer =
            Canonicalizer::with_replacer(Transform::chain([fold, options.replacer.clone()]));
        let checksum = options.checksum();

        debug!(
            algorithm = options.algorithm.as_str(),
            encoding = options.encoding.as_str(),
            case_insensitive = options.case_insensitive,
            use_to_json_transform = options.use_to_json_transform,
            checksum = %checksum,
            "normalizer built"
        );

        Self {
            options,
            key_transform,
            value_transform,
            canonicalizer,
            checksum,
        }
    }

    /// Normalizes a map key or set element.
    pub fn normalize_key<Q: Serialize + ?Sized>(&self, key: &Q) -> Result<Normalized, StructureError> {
        Ok(self.normalize_key_structure(Structure::from_serialize(key)?))
    }

    /// Normalizes a map value.
    pub fn normalize_value<Q: Serialize + ?Sized>(
        &self,
        value: &Q,
    ) -> Result<Normalized, StructureError> {
        Ok(self.normalize_value_structure(Structure::from_serialize(value)?))
    }

    /// Normalizes an already lifted key.
    pub fn normalize_key_structure(&self, key: Structure) -> Normalized {
        self.finish(self.key_transform.apply(key))
    }

    /// Normalizes an already lifted value.
    pub fn normalize_value_structure(&self, value: Structure) -> Normalized {
        self.finish(self.value_transform.apply(value))
    }

    /// The resolved configuration.
    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// Equality token of the resolved configuration.
    pub fn config_checksum(&self) -> &ConfigChecksum {
        &self.checksum
    }

    fn finish(&self, transformed: Structure) -> Normalized {
        match transformed {
            Structure::Null => Normalized::Null,
            Structure::Bool(b) => Normalized::Bool(b),
            Structure::Int(i) => Normalized::Int(i),
            Structure::Float(f) => match Structure::from_f64(f) {
                Structure::Int(i) => Normalized::Int(i),
                _ => Normalized::Float(OrderedFloat(f)),
            },
            Structure::Str(s) if self.options.case_insensitive => {
                Normalized::Str(s.to_lowercase())
            }
            Structure::Str(s) => Normalized::Str(s),
            composite => {
                let bytes = self.canonicalizer.canonicalize_bytes(composite);
                Normalized::Digest(digest_bytes(
                    self.options.algorithm,
                    self.options.encoding,
                    &bytes,
                ))
            }
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

fn fold_case(node: Structure) -> Structure {
    match node {
        Structure::Str(s) => Structure::Str(s.to_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_pass_through() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.normalize_key(&5).unwrap(), Normalized::Int(5));
        assert_eq!(normalizer.normalize_key("Hi").unwrap(), Normalized::Str("Hi".into()));
        assert_eq!(normalizer.normalize_key(&true).unwrap(), Normalized::Bool(true));
        assert_eq!(normalizer.normalize_key(&()).unwrap(), Normalized::Null);
        assert_eq!(normalizer.normalize_key(&2.0_f64).unwrap(), Normalized::Int(2));
        assert_eq!(normalizer.normalize_key(&-0.0_f64).unwrap(), Normalized::Int(0));
        assert_eq!(
            normalizer.normalize_key(&f64::NAN).unwrap(),
            normalizer.normalize_key(&f64::NAN).unwrap()
        );
    }

    #[test]
    fn composites_hash_regardless_of_field_order() {
        let normalizer = Normalizer::default();
        let a = normalizer.normalize_key(&json!({"a": 1, "b": [1, 2]})).unwrap();
        let b = normalizer.normalize_key(&json!({"b": [1, 2], "a": 1})).unwrap();
        assert!(a.is_digest());
        assert_eq!(a, b);
        let c = normalizer.normalize_key(&json!({"a": 1, "b": [2, 1]})).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn empty_values_stay_distinct() {
        let normalizer = Normalizer::default();
        let ids = [
            normalizer.normalize_key(&json!({})).unwrap(),
            normalizer.normalize_key(&json!([])).unwrap(),
            normalizer.normalize_key(&0).unwrap(),
            normalizer.normalize_key("").unwrap(),
            normalizer.normalize_key(&false).unwrap(),
            normalizer.normalize_key(&()).unwrap(),
        ];
        for (i, left) in ids.iter().enumerate() {
            for right in ids.iter().skip(i + 1) {
                assert_ne!(left, right);
            }
        }
    }

    #[test]
    fn case_insensitive_folds_nested_strings() {
        let normalizer = Normalizer::new(&Options::new().with_case_insensitive(true));
        assert_eq!(normalizer.normalize_key("HI").unwrap(), Normalized::Str("hi".into()));
        assert_eq!(
            normalizer.normalize_key(&json!({"Prop": "HI"})).unwrap(),
            normalizer.normalize_key(&json!({"prop": "hi"})).unwrap()
        );
    }

    #[test]
    fn case_folding_runs_before_the_replacer() {
        let rename = Transform::custom(|node| match node {
            Structure::Str(s) if s == "hi" => Structure::Str("greeting".into()),
            other => other,
        });
        let normalizer = Normalizer::new(
            &Options::new()
                .with_case_insensitive(true)
                .with_replacer(rename),
        );
        assert_eq!(
            normalizer.normalize_key(&json!({"w": "HI"})).unwrap(),
            normalizer.normalize_key(&json!({"w": "greeting"})).unwrap()
        );
    }

    #[test]
    fn replacer_never_sees_top_level_primitives() {
        let shout = Transform::custom(|_| Structure::Str("replaced".into()));
        let normalizer = Normalizer::new(&Options::new().with_replacer(shout));
        assert_eq!(normalizer.normalize_key("x").unwrap(), Normalized::Str("x".into()));
    }

    #[test]
    fn value_chain_uses_its_own_transformer() {
        let parity = Transform::custom(|node| match node.as_int() {
            Some(i) => Structure::Int(i % 2),
            None => node,
        });
        let normalizer = Normalizer::new(&Options::new().with_map_value_transformer(parity));
        assert_eq!(normalizer.normalize_value(&3).unwrap(), Normalized::Int(1));
        assert_eq!(normalizer.normalize_key(&3).unwrap(), Normalized::Int(3));
    }

    #[test]
    fn checksum_matches_for_equal_options() {
        let a = Normalizer::new(&Options::new().with_case_insensitive(true));
        let b = Normalizer::new(&Options::new().with_case_insensitive(true));
        assert_eq!(a.config_checksum(), b.config_checksum());
        assert_ne!(a.config_checksum(), Normalizer::default().config_checksum());
    }
}
