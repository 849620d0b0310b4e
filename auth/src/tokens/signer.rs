use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::ClaimParts;
use super::claims::TokenClaims;
use super::errors::TokenError;

/// The four token families.
///
/// Each family signs with its own secret, so possession of one family's
/// secret (the activation secret travels in low-security email links) is
/// useless for forging any other family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Activation,
    Access,
    Refresh,
    PasswordReset,
}

/// One signing secret per token family.
#[derive(Debug, Clone)]
pub struct TokenSecrets {
    pub activation: String,
    pub access: String,
    pub refresh: String,
    pub password_reset: String,
}

/// One lifetime per token family.
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub activation: Duration,
    pub access: Duration,
    pub refresh: Duration,
    pub password_reset: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            activation: Duration::days(7),
            access: Duration::minutes(15),
            refresh: Duration::hours(24),
            password_reset: Duration::minutes(5),
        }
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Mints and verifies signed tokens for all four families.
///
/// Uses HS256 throughout. Expiry is checked explicitly against the supplied
/// clock instant rather than by the JWT library, so `Expired` and `Invalid`
/// stay distinguishable for callers that branch on them.
pub struct TokenSigner {
    activation: KeyPair,
    access: KeyPair,
    refresh: KeyPair,
    password_reset: KeyPair,
    lifetimes: TokenLifetimes,
    algorithm: Algorithm,
}

impl TokenSigner {
    /// Create a signer from per-family secrets and lifetimes.
    ///
    /// Secrets are taken as given; the service validates presence and
    /// non-emptiness at startup, never mid-request.
    pub fn new(secrets: TokenSecrets, lifetimes: TokenLifetimes) -> Self {
        Self {
            activation: KeyPair::from_secret(&secrets.activation),
            access: KeyPair::from_secret(&secrets.access),
            refresh: KeyPair::from_secret(&secrets.refresh),
            password_reset: KeyPair::from_secret(&secrets.password_reset),
            lifetimes,
            algorithm: Algorithm::HS256,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Activation => &self.activation,
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
            TokenKind::PasswordReset => &self.password_reset,
        }
    }

    /// Lifetime of the given family.
    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Activation => self.lifetimes.activation,
            TokenKind::Access => self.lifetimes.access,
            TokenKind::Refresh => self.lifetimes.refresh,
            TokenKind::PasswordReset => self.lifetimes.password_reset,
        }
    }

    /// Mint a token of the given family, expiring after the family lifetime.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, kind: TokenKind, parts: &ClaimParts) -> Result<String, TokenError> {
        self.issue_at(kind, parts, Utc::now())
    }

    /// Mint a token with an explicit clock instant (testable clock).
    pub fn issue_at(
        &self,
        kind: TokenKind,
        parts: &ClaimParts,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::new(parts, now, self.lifetime(kind));
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.keys(kind).encoding)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify a token against the given family's secret and the wall clock.
    ///
    /// # Errors
    /// * `Invalid` - Signature does not match the family secret, or the
    ///   token is malformed
    /// * `Expired` - Signature is good but the expiry has passed
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(kind, token, Utc::now())
    }

    /// Verify with an explicit clock instant (testable clock).
    ///
    /// Signature is checked first; the expiry comparison `exp < now` is done
    /// here, with library expiry validation disabled, so an expired token
    /// with a good signature is reported as `Expired` rather than folded
    /// into a generic decode failure.
    pub fn verify_at(
        &self,
        kind: TokenKind,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(token, &self.keys(kind).decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        if data.claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}
