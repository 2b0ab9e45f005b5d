//! Content digests
//!
//! A digest identifies content by its cryptographic hash and is written as
//! `<algorithm>:<hex>`, for example
//! `sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855`.
//! Digests double as integrity checks: recomputing the hash over received
//! bytes must yield the same value.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

use crate::error::{ArtifactError, ArtifactResult};

/// Registered digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256 (canonical for OCI content)
    Sha256,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// Get the expected length of the hash in bytes
    pub fn hash_length(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Get the expected length of the hash in hexadecimal characters
    pub fn hex_length(&self) -> usize {
        self.hash_length() * 2
    }

    /// Algorithm identifier as it appears in a digest string
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    /// Validate that an encoded hash has the correct form for this algorithm
    pub fn validate_hex(&self, hex: &str) -> ArtifactResult<()> {
        let expected_len = self.hex_length();
        let actual_len = hex.len();

        if actual_len != expected_len {
            return Err(ArtifactError::InvalidDigest(format!(
                "{} hash must be {} hex characters, got {}",
                self, expected_len, actual_len
            )));
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ArtifactError::InvalidDigest(
                "encoded hash must be hexadecimal".to_string(),
            ));
        }

        Ok(())
    }

    /// Hash `data` and return the lowercase hex encoding
    pub fn hash_hex(&self, data: &[u8]) -> String {
        match self {
            DigestAlgorithm::Sha256 => format!("{:x}", Sha256::digest(data)),
            DigestAlgorithm::Sha512 => format!("{:x}", Sha512::digest(data)),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        DigestAlgorithm::Sha256
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ArtifactError;

    fn from_str(s: &str) -> ArtifactResult<Self> {
        match s {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(ArtifactError::InvalidDigest(format!(
                "unsupported digest algorithm: {}",
                s
            ))),
        }
    }
}

/// Content digest (`<algorithm>:<hex>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl Digest {
    /// Create a digest from an algorithm and an encoded hash
    ///
    /// The hash is normalized to lowercase.
    ///
    /// # Errors
    /// Returns an error if the encoded hash has the wrong length or is not hex
    pub fn new(algorithm: DigestAlgorithm, hex: impl Into<String>) -> ArtifactResult<Self> {
        let hex = hex.into().to_lowercase();
        algorithm.validate_hex(&hex)?;
        Ok(Self { algorithm, hex })
    }

    /// Compute the canonical (sha256) digest of `data`
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::compute(DigestAlgorithm::Sha256, data)
    }

    /// Compute the digest of `data` with the given algorithm
    pub fn compute(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        Self {
            algorithm,
            hex: algorithm.hash_hex(data),
        }
    }

    /// Check whether `data` hashes to this digest
    pub fn verify(&self, data: &[u8]) -> bool {
        self.algorithm.hash_hex(data) == self.hex
    }

    /// Get the algorithm used
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Get the lowercase hex encoding of the hash
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Check whether a string looks like a digest rather than a tag
    pub fn is_digest_like(s: &str) -> bool {
        s.contains(':')
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = ArtifactError;

    fn from_str(s: &str) -> ArtifactResult<Self> {
        let (algorithm, hex) = s
            .split_once(':')
            .ok_or_else(|| ArtifactError::InvalidDigest(format!("missing algorithm: {}", s)))?;
        Digest::new(algorithm.parse()?, hex)
    }
}

impl TryFrom<String> for Digest {
    type Error = ArtifactError;

    fn try_from(value: String) -> ArtifactResult<Self> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_string()
    }
}
