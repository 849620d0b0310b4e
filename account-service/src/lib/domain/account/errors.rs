use auth::PasswordError;
use auth::TokenError;
use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for PhoneNumber validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhoneNumberError {
    #[error("Phone number length must be {min}-{max} characters, got {actual}")]
    InvalidLength {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Phone number may contain only digits, a leading +, hyphens, and spaces")]
    InvalidCharacters,
}

/// Error for Pin validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PinError {
    #[error("PIN must be exactly {length} digits")]
    InvalidFormat { length: usize },
}

/// Error for RoleName parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleNameError {
    #[error("Unknown role name: {0}")]
    Unknown(String),
}

/// Error for email delivery operations
#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("Failed to build email message: {0}")]
    InvalidMessage(String),

    #[error("Failed to deliver email: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for all account workflows.
///
/// Variants group into the status classes the transport layer maps to:
/// validation (400), conflict (409), not-found (404), unauthorized (401),
/// and misconfiguration/infrastructure (500). Expired, malformed, and
/// subject-mismatch token failures are distinct variants because they
/// correspond to different remediation paths for the caller.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Validation failures (400)
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Reset token not found in request")]
    MissingResetToken,

    // Uniqueness conflicts (409)
    #[error("User already exists: {0}")]
    UsernameTaken(String),

    #[error("Cashier already exists with phone number: {0}")]
    PhoneNumberTaken(String),

    #[error("Admin already exists with this PIN")]
    PinTaken,

    // Missing identities (404)
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User not found with username: {0}")]
    NotFoundByUsername(String),

    #[error("Reset link does not belong to this user")]
    ResetSubjectMismatch,

    // Authentication failures (401)
    #[error("Account not activated, please check your email")]
    NotActivated,

    #[error("Authentication failed")]
    InvalidCredentials,

    #[error("Authentication failed for role: {0}")]
    RoleNotAssigned(String),

    #[error("Old password does not match")]
    OldPasswordMismatch,

    #[error("Token expired, please request a new link")]
    TokenExpired,

    #[error("Token is invalid: {0}")]
    TokenInvalid(String),

    // Deployment / infrastructure failures (500)
    #[error("Seed role missing from storage: {0}")]
    SeedRoleMissing(String),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Email delivery error: {0}")]
    Mail(#[from] MailError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid(msg) => AuthError::TokenInvalid(msg),
            TokenError::EncodingFailed(msg) => AuthError::TokenInvalid(msg),
        }
    }
}
