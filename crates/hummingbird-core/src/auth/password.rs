use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha512};

use crate::error::{CoreError, CoreResult};

/// A stored password digest.
///
/// Two encodings are accepted: the hex SHA-512 of the password (the format
/// of a plain `password.txt`), and an Argon2 PHC string as printed by the
/// `hash-password` binary.
#[derive(Clone, PartialEq, Eq)]
pub enum PasswordDigest {
    Sha512([u8; 64]),
    Argon2(String),
}

impl PasswordDigest {
    /// Parses a digest as stored in configuration. Surrounding whitespace is ignored.
    pub fn parse(encoded: &str) -> CoreResult<Self> {
        let encoded = encoded.trim();

        if encoded.starts_with("$argon2") {
            let parsed = PasswordHash::new(encoded)
                .map_err(|e| CoreError::InvalidDigest(format!("malformed Argon2 hash: {e}")))?;
            if !matches!(parsed.algorithm.as_str(), "argon2id" | "argon2i" | "argon2d") {
                return Err(CoreError::InvalidDigest(format!(
                    "unsupported hash algorithm: {}",
                    parsed.algorithm
                )));
            }
            if parsed.salt.is_none() || parsed.hash.is_none() {
                return Err(CoreError::InvalidDigest(
                    "Argon2 hash is missing its salt or output".to_string(),
                ));
            }
            return Ok(Self::Argon2(encoded.to_string()));
        }

        let bytes = hex::decode(encoded).map_err(|e| {
            CoreError::InvalidDigest(format!(
                "expected 128 hex characters or an Argon2 PHC string ({e})"
            ))
        })?;
        let digest: [u8; 64] = bytes.try_into().map_err(|b: Vec<u8>| {
            CoreError::InvalidDigest(format!("SHA-512 digest must be 64 bytes, got {}", b.len()))
        })?;

        Ok(Self::Sha512(digest))
    }

    pub fn sha512_of(password: &str) -> Self {
        Self::Sha512(sha512(password))
    }

    pub fn argon2_of(password: &str) -> CoreResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CoreError::InvalidDigest(format!("failed to hash password: {e}")))?;

        Ok(Self::Argon2(hash.to_string()))
    }

    /// The configuration form of this digest, accepted back by [`PasswordDigest::parse`].
    pub fn encoded(&self) -> String {
        match self {
            Self::Sha512(digest) => hex::encode(digest),
            Self::Argon2(phc) => phc.clone(),
        }
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha512(_) => f.write_str("PasswordDigest::Sha512(..)"),
            Self::Argon2(_) => f.write_str("PasswordDigest::Argon2(..)"),
        }
    }
}

/// Checks submitted passwords against the one configured digest.
///
/// Immutable after construction and shared by every request. Argon2
/// verification is CPU-heavy; async callers should run [`verify`] on the
/// blocking pool.
///
/// [`verify`]: CredentialVerifier::verify
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    digest: PasswordDigest,
}

impl CredentialVerifier {
    pub fn new(digest: PasswordDigest) -> Self {
        Self { digest }
    }

    /// Returns `true` only when `candidate` is exactly the configured password.
    pub fn verify(&self, candidate: &str) -> bool {
        match &self.digest {
            PasswordDigest::Sha512(expected) => constant_time_eq(&sha512(candidate), expected),
            PasswordDigest::Argon2(phc) => match PasswordHash::new(phc) {
                Ok(parsed) => Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok(),
                Err(e) => {
                    tracing::error!("Stored Argon2 hash became unparsable: {e}");
                    false
                }
            },
        }
    }
}

fn sha512(input: &str) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(input.as_bytes()));
    out
}

/// Constant-time byte comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
