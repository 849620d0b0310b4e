use async_trait::async_trait;
use uuid::Uuid;

use crate::account::errors::AuthError;
use crate::account::errors::MailError;
use crate::account::models::AdminProfile;
use crate::account::models::CashierProfile;
use crate::account::models::PhoneNumber;
use crate::account::models::Pin;
use crate::account::models::Role;
use crate::account::models::RoleName;
use crate::account::models::UserCredential;
use crate::account::models::UserId;
use crate::account::models::Username;

/// Persistence operations for credentials, role links, and profiles.
///
/// The sole owner of row mutation and transaction lifecycle. Every
/// operation takes an explicit transaction handle acquired via [`begin`];
/// the calling workflow commits on success and rolls back on any failure,
/// so all writes of one workflow become visible together or not at all.
///
/// Uniqueness protocol: workflows check-then-insert inside the transaction;
/// the storage layer's unique constraints are the authoritative guard, and
/// implementations must surface constraint violations as the same Conflict
/// errors the pre-checks produce.
///
/// [`begin`]: CredentialStore::begin
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Transaction handle threaded through every call.
    type Tx: Send;

    /// Open a new storage transaction.
    ///
    /// # Errors
    /// * `Database` - Transaction could not be started
    async fn begin(&self) -> Result<Self::Tx, AuthError>;

    /// Commit the transaction, releasing it exactly once.
    async fn commit(&self, tx: Self::Tx) -> Result<(), AuthError>;

    /// Roll back the transaction; all writes made through it revert.
    async fn rollback(&self, tx: Self::Tx) -> Result<(), AuthError>;

    /// Look up a credential by unique username.
    async fn find_by_username(
        &self,
        tx: &mut Self::Tx,
        username: &Username,
    ) -> Result<Option<UserCredential>, AuthError>;

    /// Look up a credential by id.
    async fn find_by_id(
        &self,
        tx: &mut Self::Tx,
        id: &UserId,
    ) -> Result<Option<UserCredential>, AuthError>;

    /// Look up the credential currently holding the presented refresh token.
    ///
    /// The refresh-token column is the sole source of truth for refresh
    /// validity; a miss covers both never-issued and rotated-away tokens.
    async fn find_by_refresh_token(
        &self,
        tx: &mut Self::Tx,
        token: &str,
    ) -> Result<Option<UserCredential>, AuthError>;

    /// Insert a new credential row.
    ///
    /// # Errors
    /// * `UsernameTaken` - Unique constraint violation on username
    /// * `Database` - Any other insert failure
    async fn create_credential(
        &self,
        tx: &mut Self::Tx,
        credential: &UserCredential,
    ) -> Result<(), AuthError>;

    /// Mark the credential activated.
    async fn set_activated(&self, tx: &mut Self::Tx, id: &UserId) -> Result<(), AuthError>;

    /// Replace the stored password digest; touches updated_at.
    async fn set_password(
        &self,
        tx: &mut Self::Tx,
        id: &UserId,
        digest: &str,
    ) -> Result<(), AuthError>;

    /// Set or clear (None) the stored refresh token; touches updated_at.
    async fn set_refresh_token(
        &self,
        tx: &mut Self::Tx,
        id: &UserId,
        token: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Resolve a fixed seed role by name.
    ///
    /// # Errors
    /// * `SeedRoleMissing` - The role row is absent (misconfigured deployment)
    async fn resolve_role(&self, tx: &mut Self::Tx, name: RoleName) -> Result<Role, AuthError>;

    /// Insert a user-to-role link row.
    async fn create_role_link(
        &self,
        tx: &mut Self::Tx,
        user_id: &UserId,
        role_id: &Uuid,
    ) -> Result<(), AuthError>;

    /// All roles assigned to the credential.
    async fn roles_for_user(
        &self,
        tx: &mut Self::Tx,
        user_id: &UserId,
    ) -> Result<Vec<Role>, AuthError>;

    /// Look up a cashier profile by its unique phone number.
    async fn find_cashier_by_phone(
        &self,
        tx: &mut Self::Tx,
        phone: &PhoneNumber,
    ) -> Result<Option<CashierProfile>, AuthError>;

    /// Insert a cashier profile row.
    ///
    /// # Errors
    /// * `PhoneNumberTaken` - Unique constraint violation on phone number
    async fn create_cashier(
        &self,
        tx: &mut Self::Tx,
        profile: &CashierProfile,
    ) -> Result<(), AuthError>;

    /// Look up an admin profile by its unique PIN.
    async fn find_admin_by_pin(
        &self,
        tx: &mut Self::Tx,
        pin: &Pin,
    ) -> Result<Option<AdminProfile>, AuthError>;

    /// Insert an admin profile row.
    ///
    /// # Errors
    /// * `PinTaken` - Unique constraint violation on PIN
    async fn create_admin(
        &self,
        tx: &mut Self::Tx,
        profile: &AdminProfile,
    ) -> Result<(), AuthError>;
}

/// Outbound email delivery.
///
/// Fire-and-forget from the caller's perspective, but failures propagate
/// synchronously: a registration or forgot-password workflow aborts (and
/// rolls back) when the activation or reset link cannot be delivered.
#[async_trait]
pub trait MailSender: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, link: &str) -> Result<(), MailError>;
}
