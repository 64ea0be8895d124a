use crate::structure::Structure;
use crate::transform::Transform;

/// Canonicalizer that emits deterministic, type-tagged text.
///
/// Scalars carry a type tag (and a length prefix for strings, bytes and
/// names), sequences keep their order, and map entries are sorted by the
/// canonical text of their keys. Two structures produce the same text iff
/// they are equal up to map entry order.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    replacer: Option<Transform>,
}

impl Canonicalizer {
    /// Creates a canonicalizer without a replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a canonicalizer that runs `replacer` on every node, top-down,
    /// before the node is encoded. Map keys are nodes too.
    pub fn with_replacer(replacer: Transform) -> Self {
        let replacer = if replacer.is_identity() {
            None
        } else {
            Some(replacer)
        };
        Self { replacer }
    }

    /// Produces the canonical text for `value`.
    pub fn canonicalize(&self, value: Structure) -> String {
        let mut out = String::new();
        self.encode(value, &mut out);
        out
    }

    /// Produces the canonical text for `value` as UTF-8 bytes.
    pub fn canonicalize_bytes(&self, value: Structure) -> Vec<u8> {
        self.canonicalize(value).into_bytes()
    }

    fn encode(&self, node: Structure, out: &mut String) {
        let node = match &self.replacer {
            Some(replacer) => replacer.apply(node),
            None => node,
        };
        match node {
            Structure::Null => out.push_str("null"),
            Structure::Bool(b) => out.push_str(&format!("bool:{}", b)),
            Structure::Int(i) => out.push_str(&format!("int:{}", i)),
            Structure::Float(f) => out.push_str(&format!("float:{}", float_text(f))),
            Structure::Str(s) => out.push_str(&format!("string:{}:{}", s.len(), s)),
            Structure::Bytes(bytes) => {
                out.push_str(&format!("bytes:{}:{}", bytes.len(), hex::encode(bytes)))
            }
            Structure::Seq(items) => {
                out.push_str(&format!("array:{}:[", items.len()));
                for (idx, item) in items.into_iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    self.encode(item, out);
                }
                out.push(']');
            }
            Structure::Map(entries) => {
                let mut encoded: Vec<(String, String)> = entries
                    .into_iter()
                    .map(|(key, value)| (self.canonicalize(key), self.canonicalize(value)))
                    .collect();
                encoded.sort();
                out.push_str(&format!("object:{}:{{", encoded.len()));
                for (idx, (key, value)) in encoded.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    out.push_str(key);
                    out.push_str("=>");
                    out.push_str(value);
                }
                out.push('}');
            }
            Structure::Named(name, inner) => {
                out.push_str(&format!("named:{}:{}:", name.len(), name));
                self.encode(*inner, out);
            }
            Structure::Variant {
                name,
                variant,
                content,
            } => {
                out.push_str(&format!(
                    "variant:{}:{}:{}:{}:",
                    name.len(),
                    name,
                    variant.len(),
                    variant
                ));
                match content {
                    Some(content) => self.encode(*content, out),
                    None => out.push_str("unit"),
                }
            }
        }
    }
}

fn float_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        format!("{:?}", value)
    }
}
