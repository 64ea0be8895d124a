use std::fmt;
use std::sync::Arc;

use crate::structure::Structure;

/// Signature of a custom transform step.
pub type TransformFn = dyn Fn(Structure) -> Structure + Send + Sync;

/// Pure mapping from a lifted value to its pre-hash representation.
///
/// Transforms are also used as hash-time replacers, where they run on every
/// node of the tree instead of once on the root.
///
/// The pipeline assumes purity: the same input must always produce the same
/// output, and callers supplying [`Transform::Custom`] are responsible for
/// that.
#[derive(Clone, Default)]
pub enum Transform {
    /// Returns the input unchanged.
    #[default]
    Identity,
    /// Round-trips through plain JSON data, dropping type identity.
    PlainJson,
    /// Caller-supplied function.
    Custom(Arc<TransformFn>),
    /// Steps applied left to right, each consuming the previous output.
    Chain(Vec<Transform>),
}

impl Transform {
    /// Wraps a closure as a transform step.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Structure) -> Structure + Send + Sync + 'static,
    {
        Transform::Custom(Arc::new(f))
    }

    /// Composes steps left to right.
    ///
    /// Identity steps are dropped and nested chains are flattened, so an
    /// empty composition is [`Transform::Identity`].
    pub fn chain<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = Transform>,
    {
        let mut flat = Vec::new();
        for step in steps {
            match step {
                Transform::Identity => {}
                Transform::Chain(inner) => match Transform::chain(inner) {
                    Transform::Chain(nested) => flat.extend(nested),
                    Transform::Identity => {}
                    single => flat.push(single),
                },
                other => flat.push(other),
            }
        }
        if flat.len() > 1 {
            return Transform::Chain(flat);
        }
        flat.pop().unwrap_or(Transform::Identity)
    }

    /// Appends `next` after this transform.
    pub fn then(self, next: Transform) -> Self {
        Transform::chain([self, next])
    }

    /// Applies the transform.
    pub fn apply(&self, input: Structure) -> Structure {
        match self {
            Transform::Identity => input,
            Transform::PlainJson => to_plain_json(input),
            Transform::Custom(f) => f(input),
            Transform::Chain(steps) => steps.iter().fold(input, |acc, step| step.apply(acc)),
        }
    }

    /// True when applying the transform can never change its input.
    pub fn is_identity(&self) -> bool {
        match self {
            Transform::Identity => true,
            Transform::Chain(steps) => steps.iter().all(Transform::is_identity),
            _ => false,
        }
    }

    /// Stable identity token. Custom steps are identified by the address of
    /// their shared closure, so clones of one transform compare equal while
    /// two separately built closures do not.
    pub fn fingerprint(&self) -> String {
        match self {
            Transform::Identity => "identity".to_string(),
            Transform::PlainJson => "plain-json".to_string(),
            Transform::Custom(f) => format!("fn@{:p}", Arc::as_ptr(f) as *const ()),
            Transform::Chain(steps) => {
                let inner: Vec<String> = steps.iter().map(Transform::fingerprint).collect();
                format!("chain[{}]", inner.join(","))
            }
        }
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint() == other.fingerprint()
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({})", self.fingerprint())
    }
}

/// Reduces a structure to plain JSON data and lifts it back.
///
/// Struct and enum names disappear, so differently typed but structurally
/// identical values become indistinguishable.
pub fn to_plain_json(input: Structure) -> Structure {
    Structure::from(input.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Celsius {
        degrees: i32,
    }

    #[derive(Serialize)]
    struct Fahrenheit {
        degrees: i32,
    }

    fn add(n: i128) -> Transform {
        Transform::custom(move |s| Structure::Int(s.as_int().unwrap_or(0) + n))
    }

    #[test]
    fn chain_applies_left_to_right() {
        let negate = Transform::custom(|s| Structure::Int(-s.as_int().unwrap_or(0)));
        let describe = Transform::custom(|s| Structure::Str(format!("Hello, {}!", s)));
        let chained = Transform::chain([add(100), negate, describe]);
        assert_eq!(chained.apply(Structure::Int(4)), Structure::Str("Hello, -104!".into()));
    }

    #[test]
    fn single_step_chain_is_the_step() {
        let step = add(100);
        let chained = Transform::chain([Transform::Identity, step.clone()]);
        assert_eq!(chained, step);
        assert_eq!(chained.apply(Structure::Int(4)), Structure::Int(104));
    }

    #[test]
    fn empty_and_nested_chains_flatten() {
        assert_eq!(Transform::chain(Vec::new()), Transform::Identity);
        let a = add(1);
        let b = add(2);
        let nested = Transform::chain([
            Transform::chain([a.clone(), Transform::Identity]),
            Transform::chain([b.clone()]),
        ]);
        assert_eq!(nested, Transform::Chain(vec![a, b]));
    }

    #[test]
    fn plain_json_forgets_type_names() {
        let c = Structure::from_serialize(&Celsius { degrees: 3 }).unwrap();
        let f = Structure::from_serialize(&Fahrenheit { degrees: 3 }).unwrap();
        assert_ne!(c, f);
        assert_eq!(Transform::PlainJson.apply(c), Transform::PlainJson.apply(f));
    }

    #[test]
    fn custom_identity_follows_the_shared_closure() {
        let first = add(1);
        let second = add(1);
        assert_eq!(first, first.clone());
        assert_ne!(first, second);
        assert!(!first.is_identity());
        assert!(Transform::Chain(vec![]).is_identity());
    }
}
