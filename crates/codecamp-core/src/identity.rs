//! Password hashing and signed bearer tokens.
//!
//! Passwords are stored as argon2 PHC strings. Tokens are HS256 JWTs that
//! carry the user's profile and claims; the same token is handed out by the
//! token endpoint and stored in the login cookie.

use std::collections::BTreeMap;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use codecamp_types::{CampUser, TokenModel};

use crate::config::TokenSettings;

/// Errors raised by hashing or token handling.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The password could not be hashed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The token could not be signed.
    #[error("token encoding failed: {source}")]
    Encode {
        /// The underlying JWT error.
        source: jsonwebtoken::errors::Error,
    },

    /// The token is malformed, expired, or fails signature, issuer, or
    /// audience checks.
    #[error("token rejected: {source}")]
    Rejected {
        /// The underlying JWT error.
        source: jsonwebtoken::errors::Error,
    },

    /// The configured lifetime does not produce a valid expiry.
    #[error("token lifetime out of range")]
    Lifetime,
}

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Hash(e.to_string()))
}

/// Check a password against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Registered and profile claims carried in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User name.
    pub sub: String,
    /// Unique token id.
    pub jti: String,
    /// Given name.
    pub given_name: String,
    /// Family name.
    pub family_name: String,
    /// Email address.
    pub email: String,
    /// Application claims, keyed by claim type.
    #[serde(default)]
    pub claims: BTreeMap<String, String>,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued at (seconds since the epoch).
    pub iat: i64,
    /// Expires at (seconds since the epoch).
    pub exp: i64,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// User name; matches a speaker's owner.
    pub user_name: String,
    /// Application claims, keyed by claim type.
    pub claims: BTreeMap<String, String>,
}

/// Issues and validates tokens for one settings snapshot.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    lifetime_minutes: i64,
}

impl TokenService {
    /// Build a service from token settings.
    pub fn new(settings: &TokenSettings) -> Self {
        Self {
            encoding: EncodingKey::from_secret(settings.key.as_bytes()),
            decoding: DecodingKey::from_secret(settings.key.as_bytes()),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            lifetime_minutes: settings.lifetime_minutes,
        }
    }

    /// Sign a token for `user`, valid from `now` for the configured
    /// lifetime.
    pub fn issue(&self, user: &CampUser, now: DateTime<Utc>) -> Result<TokenModel, IdentityError> {
        let expiration = TimeDelta::try_minutes(self.lifetime_minutes)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(IdentityError::Lifetime)?;

        let d = &user.details;
        let claims = TokenClaims {
            sub: d.user_name.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            given_name: d.first_name.clone(),
            family_name: d.last_name.clone(),
            email: d.email.clone(),
            claims: d
                .claims
                .iter()
                .map(|c| (c.claim_type.clone(), c.value.clone()))
                .collect(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|source| IdentityError::Encode { source })?;

        Ok(TokenModel { token, expiration })
    }

    /// Verify signature, issuer, audience, and expiry.
    pub fn validate(&self, token: &str) -> Result<Principal, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|source| IdentityError::Rejected { source })?;

        Ok(Principal {
            user_name: data.claims.sub,
            claims: data.claims.claims,
        })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime_minutes", &self.lifetime_minutes)
            .finish_non_exhaustive()
    }
}
