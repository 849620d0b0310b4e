use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Identity fields carried by every token, independent of kind.
///
/// The signer combines these with issued-at and expiry timestamps to build
/// the full claim set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimParts {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// Signed claim set for all four token families.
///
/// The family is not encoded in the claims; families are separated by
/// signing secret, so a token of one kind never verifies as another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (credential id)
    pub sub: Uuid,

    pub username: String,

    pub email: String,

    /// Role name as assigned at issue time (CASHIER or ADMIN)
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    /// Build claims from identity parts with an explicit clock instant.
    ///
    /// # Arguments
    /// * `parts` - Identity fields to embed
    /// * `issued_at` - Clock instant the token is minted at
    /// * `ttl` - Lifetime added to `issued_at` to produce the expiry
    pub fn new(parts: &ClaimParts, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            sub: parts.user_id,
            username: parts.username.clone(),
            email: parts.email.clone(),
            role: parts.role.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    /// Check expiry against an explicit clock instant.
    ///
    /// Expiry is strict: a token is expired once `exp < now`, never before.
    /// Callers branch on this independently of signature validation.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }
}
