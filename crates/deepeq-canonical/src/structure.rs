use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map as JsonMap, Number, Value};
use std::fmt;

use crate::serializer::{StructureError, StructureSerializer};

/// Largest integer an `f64` represents exactly. Integral floats inside this
/// range lift to [`Structure::Int`].
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Structural representation of an arbitrary serializable value.
///
/// Every value handed to a collection is lifted into this tree before any
/// transform or hashing takes place. `Named` and `Variant` keep the nominal
/// type information that a plain JSON round trip discards.
#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    /// Unit, `None`, or JSON `null`.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Any integer, or a float with an exact integral value.
    Int(i128),
    /// Non-integral or non-finite float.
    Float(f64),
    /// UTF-8 string (chars lift to one-character strings).
    Str(String),
    /// Raw byte buffer.
    Bytes(Vec<u8>),
    /// Ordered sequence (vectors, slices, tuples).
    Seq(Vec<Structure>),
    /// Map entries in visitation order. Struct fields use string keys.
    Map(Vec<(Structure, Structure)>),
    /// Nominal wrapper around structs, tuple structs, unit structs and newtypes.
    Named(&'static str, Box<Structure>),
    /// Enum variant, with the enum name, the variant name, and an optional payload.
    Variant {
        /// Name of the enum type.
        name: &'static str,
        /// Name of the variant.
        variant: &'static str,
        /// Payload; `None` for unit variants.
        content: Option<Box<Structure>>,
    },
}

impl Structure {
    /// Lifts any serializable value into a structure.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, StructureError> {
        value.serialize(StructureSerializer)
    }

    /// Lifts a float, collapsing integral values and negative zero to [`Structure::Int`].
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
            Structure::Int(value as i128)
        } else {
            Structure::Float(value)
        }
    }

    /// Returns true for scalars that are never hashed (null, bool, numbers, strings).
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Structure::Null
                | Structure::Bool(_)
                | Structure::Int(_)
                | Structure::Float(_)
                | Structure::Str(_)
        )
    }

    /// Looks up a string-keyed field, seeing through `Named` and `Variant` wrappers.
    pub fn get(&self, field: &str) -> Option<&Structure> {
        match self {
            Structure::Map(entries) => entries
                .iter()
                .find(|(key, _)| key.as_str() == Some(field))
                .map(|(_, value)| value),
            Structure::Named(_, inner) => inner.get(field),
            Structure::Variant {
                content: Some(content),
                ..
            } => content.get(field),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Structure::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Structure::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Converts to plain JSON data.
    ///
    /// Type names are dropped, non-finite floats become `null`, bytes become
    /// arrays of numbers and map keys are stringified. Later duplicate keys
    /// overwrite earlier ones.
    pub fn to_json(&self) -> Value {
        match self {
            Structure::Null => Value::Null,
            Structure::Bool(b) => Value::Bool(*b),
            Structure::Int(i) => int_to_json(*i),
            Structure::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Structure::Str(s) => Value::String(s.clone()),
            Structure::Bytes(bytes) => {
                Value::Array(bytes.iter().map(|byte| Value::from(*byte)).collect())
            }
            Structure::Seq(items) => Value::Array(items.iter().map(Structure::to_json).collect()),
            Structure::Map(entries) => {
                let mut object = JsonMap::new();
                for (key, value) in entries {
                    object.insert(key.json_key(), value.to_json());
                }
                Value::Object(object)
            }
            Structure::Named(_, inner) => inner.to_json(),
            Structure::Variant {
                variant,
                content: None,
                ..
            } => Value::String((*variant).to_string()),
            Structure::Variant {
                variant,
                content: Some(content),
                ..
            } => {
                let mut object = JsonMap::new();
                object.insert((*variant).to_string(), content.to_json());
                Value::Object(object)
            }
        }
    }

    /// Renders the plain JSON form as canonical (sorted-key) JSON text.
    pub fn render(&self) -> String {
        let json = self.to_json();
        canonical_json::to_string(&json).unwrap_or_else(|_| json.to_string())
    }

    fn json_key(&self) -> String {
        match self {
            Structure::Str(s) => s.clone(),
            Structure::Int(i) => i.to_string(),
            Structure::Bool(b) => b.to_string(),
            Structure::Null => "null".to_string(),
            other => other.render(),
        }
    }
}

fn int_to_json(value: i128) -> Value {
    if let Ok(n) = i64::try_from(value) {
        Value::from(n)
    } else if let Ok(n) = u64::try_from(value) {
        Value::from(n)
    } else {
        Number::from_f64(value as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<Value> for Structure {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Structure::Null,
            Value::Bool(b) => Structure::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Structure::Int(i.into())
                } else if let Some(u) = n.as_u64() {
                    Structure::Int(u.into())
                } else {
                    Structure::from_f64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Structure::Str(s),
            Value::Array(items) => Structure::Seq(items.into_iter().map(Structure::from).collect()),
            Value::Object(map) => Structure::Map(
                map.into_iter()
                    .map(|(key, value)| (Structure::Str(key), Structure::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Structure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Structure::Null => serializer.serialize_unit(),
            Structure::Bool(b) => serializer.serialize_bool(*b),
            Structure::Int(i) => {
                if let Ok(n) = i64::try_from(*i) {
                    serializer.serialize_i64(n)
                } else if let Ok(n) = u64::try_from(*i) {
                    serializer.serialize_u64(n)
                } else {
                    serializer.serialize_i128(*i)
                }
            }
            Structure::Float(f) => serializer.serialize_f64(*f),
            Structure::Str(s) => serializer.serialize_str(s),
            Structure::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Structure::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Structure::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Structure::Named(name, inner) => serializer.serialize_newtype_struct(*name, inner.as_ref()),
            Structure::Variant {
                name,
                variant,
                content: None,
            } => serializer.serialize_unit_variant(*name, 0, *variant),
            Structure::Variant {
                name,
                variant,
                content: Some(content),
            } => serializer.serialize_newtype_variant(*name, 0, *variant, content.as_ref()),
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
