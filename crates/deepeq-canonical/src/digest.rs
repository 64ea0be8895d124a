use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use siphasher::sip128::{Hasher128, SipHasher13};
use std::hash::Hasher;

use crate::canonicalizer::Canonicalizer;
use crate::serializer::StructureError;
use crate::structure::Structure;
use crate::transform::{to_plain_json, Transform};

/// Supported digest algorithms for composite values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlg {
    /// 128-bit SipHash-1-3. Fast and non-cryptographic (the default).
    #[default]
    Sip128,
    /// SHA-256.
    #[serde(rename = "sha-256")]
    Sha256,
    /// No hashing: the canonical text itself is returned.
    Passthrough,
}

impl DigestAlg {
    /// Stable name of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlg::Sip128 => "sip128",
            DigestAlg::Sha256 => "sha-256",
            DigestAlg::Passthrough => "passthrough",
        }
    }
}

/// Text encoding applied to raw digest bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestEncoding {
    /// Lower-case hexadecimal (the default).
    #[default]
    Hex,
    /// Base64URL without padding.
    #[serde(rename = "base64url")]
    Base64Url,
}

impl DigestEncoding {
    /// Stable name of the encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestEncoding::Hex => "hex",
            DigestEncoding::Base64Url => "base64url",
        }
    }

    /// Encodes raw digest bytes.
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            DigestEncoding::Hex => hex::encode(bytes),
            DigestEncoding::Base64Url => base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes),
        }
    }
}

/// Hashes `bytes` with `alg` and encodes the result.
///
/// [`DigestAlg::Passthrough`] ignores `encoding` and returns the input as text.
pub fn digest_bytes(alg: DigestAlg, encoding: DigestEncoding, bytes: &[u8]) -> String {
    let raw = match alg {
        DigestAlg::Sip128 => {
            let mut hasher = SipHasher13::new();
            hasher.write(bytes);
            hasher.finish128().as_bytes().to_vec()
        }
        DigestAlg::Sha256 => Sha256::digest(bytes).to_vec(),
        DigestAlg::Passthrough => return String::from_utf8_lossy(bytes).into_owned(),
    };
    encoding.encode(&raw)
}

/// Options for the standalone hashing helpers.
#[derive(Debug, Clone, Default)]
pub struct HashOptions {
    /// Digest algorithm.
    pub algorithm: DigestAlg,
    /// Output encoding.
    pub encoding: DigestEncoding,
    /// Replacer run on every node before encoding.
    pub replacer: Option<Transform>,
    /// Reduce the value to plain JSON data before hashing.
    pub plain_json: bool,
}

/// Hashes an already lifted structure.
pub fn hash_structure(value: Structure, options: &HashOptions) -> String {
    let value = if options.plain_json {
        to_plain_json(value)
    } else {
        value
    };
    let canonicalizer = match &options.replacer {
        Some(replacer) => Canonicalizer::with_replacer(replacer.clone()),
        None => Canonicalizer::new(),
    };
    let bytes = canonicalizer.canonicalize_bytes(value);
    digest_bytes(options.algorithm, options.encoding, &bytes)
}

/// Lifts and hashes any serializable value.
///
/// Structurally equal values (map entry order aside) always produce the same
/// digest for a given set of options.
pub fn hash_value<T: Serialize + ?Sized>(
    value: &T,
    options: &HashOptions,
) -> Result<String, StructureError> {
    Ok(hash_structure(Structure::from_serialize(value)?, options))
}
