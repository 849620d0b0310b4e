use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::errors::EmailError;
use crate::account::errors::PhoneNumberError;
use crate::account::errors::PinError;
use crate::account::errors::RoleNameError;
use crate::account::errors::UserIdError;
use crate::account::errors::UsernameError;

/// Credential aggregate entity.
///
/// Identity anchor for every account. `activated` starts false and flips to
/// true exactly once via the activation token; `refresh_token` holds the
/// single currently-valid rotating token (None when logged out).
#[derive(Debug, Clone)]
pub struct UserCredential {
    pub id: UserId,
    pub username: Username,
    pub email: EmailAddress,
    pub password_digest: String,
    pub activated: bool,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fixed role row, resolved by name and never created by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: Uuid,
    pub name: RoleName,
}

/// The two roles this service knows. Stored as CASHIER / ADMIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleName {
    Cashier,
    Admin,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Cashier => "CASHIER",
            RoleName::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = RoleNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASHIER" => Ok(RoleName::Cashier),
            "ADMIN" => Ok(RoleName::Admin),
            other => Err(RoleNameError::Unknown(other.to_string())),
        }
    }
}

/// Cashier profile, owned one-to-one by a credential.
#[derive(Debug, Clone)]
pub struct CashierProfile {
    pub id: Uuid,
    pub user_id: UserId,
    pub full_name: String,
    pub call_name: String,
    pub phone_number: PhoneNumber,
    pub street: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Admin profile, owned one-to-one by a credential.
#[derive(Debug, Clone)]
pub struct AdminProfile {
    pub id: Uuid,
    pub user_id: UserId,
    pub full_name: String,
    pub call_name: String,
    pub pin: Pin,
    pub phone_number: PhoneNumber,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Credential unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random credential ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a credential ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures username is 3-32 characters and contains only alphanumeric,
/// underscore, and hyphen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    /// * `InvalidCharacters` - Contains non-alphanumeric characters (except _ and -)
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let length = username.len();
        if length < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if length > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(UsernameError::InvalidCharacters);
        }
        Ok(Self(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone number value type
///
/// Accepts 7-20 characters: digits with an optional leading `+` and
/// interior hyphens or spaces. The cashier secondary uniqueness key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MIN_LENGTH: usize = 7;
    const MAX_LENGTH: usize = 20;

    /// Create a new validated phone number.
    ///
    /// # Errors
    /// * `InvalidLength` - Outside the 7-20 character range
    /// * `InvalidCharacters` - Anything other than digits, `+`, `-`, space
    pub fn new(phone: String) -> Result<Self, PhoneNumberError> {
        let length = phone.len();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(PhoneNumberError::InvalidLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        let mut chars = phone.chars();
        let valid_first = matches!(chars.next(), Some(c) if c.is_ascii_digit() || c == '+');
        if !valid_first || !chars.all(|c| c.is_ascii_digit() || c == '-' || c == ' ') {
            return Err(PhoneNumberError::InvalidCharacters);
        }
        Ok(Self(phone))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Admin PIN value type: exactly six ASCII digits.
///
/// The admin secondary uniqueness key, also required as proof at admin
/// login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    const LENGTH: usize = 6;

    /// Create a new validated PIN.
    ///
    /// # Errors
    /// * `InvalidFormat` - Not exactly six ASCII digits
    pub fn new(pin: String) -> Result<Self, PinError> {
        if pin.len() != Self::LENGTH || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(PinError::InvalidFormat { length: Self::LENGTH });
        }
        Ok(Self(pin))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Scheme and host of the inbound request, used to build the activation and
/// reset links embedded in outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn activation_link(&self, token: &str) -> String {
        format!(
            "{}://{}/api/v1/auth/activate-account/{}",
            self.scheme, self.host, token
        )
    }

    pub fn reset_link(&self, id: &UserId, token: &str) -> String {
        format!(
            "{}://{}/api/v1/auth/reset-password/{}/{}",
            self.scheme, self.host, id, token
        )
    }
}

/// Command to register a cashier account, parsed fail-closed at the handler.
#[derive(Debug)]
pub struct RegisterCashierCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub call_name: String,
    pub phone_number: PhoneNumber,
    pub street: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
}

/// Command to register an admin account.
#[derive(Debug)]
pub struct RegisterAdminCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub call_name: String,
    pub pin: Pin,
    pub phone_number: PhoneNumber,
}

/// Credentials presented at the cashier login entry point.
#[derive(Debug)]
pub struct LoginCashierCommand {
    pub username: Username,
    pub password: String,
}

/// Credentials presented at the admin login entry point; the PIN is an
/// additional proof matched against the admin profile.
#[derive(Debug)]
pub struct LoginAdminCommand {
    pub username: Username,
    pub password: String,
    pub pin: Pin,
}

#[derive(Debug)]
pub struct ForgotPasswordCommand {
    pub username: Username,
}

#[derive(Debug)]
pub struct ResetPasswordCommand {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub id: UserId,
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Outcome of a successful cashier registration; the handler projects this
/// into a sanitized response (no digest, no raw activation token).
#[derive(Debug, Clone)]
pub struct CashierRegistration {
    pub profile: CashierProfile,
    pub credential: UserCredential,
    pub role: Role,
}

/// Outcome of a successful admin registration.
#[derive(Debug, Clone)]
pub struct AdminRegistration {
    pub profile: AdminProfile,
    pub credential: UserCredential,
    pub role: Role,
}

/// Outcome of a successful login: the freshly minted token pair plus the
/// role list for the entry point. `pin` is echoed for admin logins only.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub username: Username,
    pub access_token: String,
    pub refresh_token: String,
    pub roles: Vec<String>,
    pub pin: Option<Pin>,
}

/// Display-safe payload for the client-side reset form.
#[derive(Debug, Clone)]
pub struct ResetPreview {
    pub username: Username,
    pub email: EmailAddress,
    pub token: String,
}

/// Outcome of reset-password and change-password.
#[derive(Debug, Clone)]
pub struct PasswordChanged {
    pub username: Username,
    pub email: EmailAddress,
}

/// Outcome of logout; absence cases are idempotent no-ops, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// A stored refresh token was cleared.
    Cleared,
    /// No token supplied, or no credential held the presented token.
    NoSession,
}
