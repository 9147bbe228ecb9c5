use std::fmt;
use std::str::FromStr;

use sha2::Digest as _;

use crate::error::TypeError;

/// Hash algorithm half of a [`Digest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    /// The canonical algorithm name as it appears before the `:`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of the hex-encoded hash for this algorithm.
    pub const fn encoded_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha384 => 96,
            Self::Sha512 => 128,
        }
    }

    /// Start an incremental hash computation.
    pub fn hasher(&self) -> DigestHasher {
        match self {
            Self::Sha256 => DigestHasher::Sha256(sha2::Sha256::new()),
            Self::Sha384 => DigestHasher::Sha384(sha2::Sha384::new()),
            Self::Sha512 => DigestHasher::Sha512(sha2::Sha512::new()),
        }
    }

    /// Digest a complete buffer with this algorithm.
    pub fn digest(&self, data: &[u8]) -> Digest {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

impl FromStr for Algorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(TypeError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Streaming hasher producing a [`Digest`].
///
/// Used by storage backends to verify large blobs without loading them
/// into memory.
pub enum DigestHasher {
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
}

impl DigestHasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    pub fn finalize(self) -> Digest {
        let (algorithm, encoded) = match self {
            Self::Sha256(h) => (Algorithm::Sha256, hex::encode(h.finalize())),
            Self::Sha384(h) => (Algorithm::Sha384, hex::encode(h.finalize())),
            Self::Sha512(h) => (Algorithm::Sha512, hex::encode(h.finalize())),
        };
        Digest { algorithm, encoded }
    }
}

/// Content-addressed identifier for a blob.
///
/// A `Digest` is `<algorithm>:<encoded>`, where `encoded` is the lowercase
/// hex hash of the blob's bytes. Identical content always produces the same
/// digest, so two references to one digest always verify identically.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    algorithm: Algorithm,
    encoded: String,
}

impl Digest {
    /// Compute the SHA-256 digest of raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        Algorithm::Sha256.digest(data)
    }

    /// Build a digest from an algorithm and an already-encoded hash.
    pub fn new(algorithm: Algorithm, encoded: impl Into<String>) -> Result<Self, TypeError> {
        let encoded = encoded.into();
        if encoded.len() != algorithm.encoded_len() {
            return Err(TypeError::InvalidLength {
                expected: algorithm.encoded_len(),
                actual: encoded.len(),
            });
        }
        if !encoded
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(TypeError::InvalidDigest(format!(
                "{algorithm}:{encoded}"
            )));
        }
        Ok(Self { algorithm, encoded })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The hex-encoded hash, without the algorithm prefix.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Short form (first 12 hex characters), for logs.
    pub fn short(&self) -> &str {
        &self.encoded[..12]
    }
}

impl FromStr for Digest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, encoded) = s
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidDigest(s.to_string()))?;
        Self::new(algorithm.parse()?, encoded)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self {
        d.to_string()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self.short())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}
