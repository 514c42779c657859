use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuance time, seconds since the Unix epoch.
    pub iat: u64,
    pub exp: u64,
}

/// An opaque, signed proof of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints and checks stateless session tokens (HS256 JWTs).
///
/// Nothing is stored server-side: a token is valid iff its signature
/// verifies against this issuer's key and it has not expired.
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn issue(&self) -> CoreResult<SessionToken> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CoreError::Token(format!("system clock before epoch: {e}")))?
            .as_secs();

        self.sign(&Claims {
            iat: now,
            exp: now.saturating_add(self.ttl.as_secs()),
        })
    }

    /// Returns `false` for anything that is not a live token signed with this key.
    pub fn validate(&self, token: &str) -> bool {
        self.claims(token).is_some()
    }

    pub fn claims(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected session token: {e}");
                None
            }
        }
    }

    fn sign(&self, claims: &Claims) -> CoreResult<SessionToken> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map(SessionToken)
            .map_err(|e| CoreError::Token(e.to_string()))
    }
}
