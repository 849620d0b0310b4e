use std::sync::Arc;

use auth::ClaimParts;
use auth::PasswordHasher;
use auth::TokenKind;
use auth::TokenSigner;
use chrono::Utc;
use uuid::Uuid;

use crate::account::errors::AuthError;
use crate::account::models::AdminProfile;
use crate::account::models::AdminRegistration;
use crate::account::models::CashierProfile;
use crate::account::models::CashierRegistration;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::ForgotPasswordCommand;
use crate::account::models::LoginAdminCommand;
use crate::account::models::LoginCashierCommand;
use crate::account::models::LoginSession;
use crate::account::models::LogoutOutcome;
use crate::account::models::PasswordChanged;
use crate::account::models::Pin;
use crate::account::models::RegisterAdminCommand;
use crate::account::models::RegisterCashierCommand;
use crate::account::models::RequestOrigin;
use crate::account::models::ResetPasswordCommand;
use crate::account::models::ResetPreview;
use crate::account::models::Role;
use crate::account::models::RoleName;
use crate::account::models::UserCredential;
use crate::account::models::UserId;
use crate::account::models::Username;
use crate::account::ports::CredentialStore;
use crate::account::ports::MailSender;

const ACTIVATION_SUBJECT: &str = "Please activate your account";
const RESET_SUBJECT: &str = "Reset your password";

/// Domain service sequencing the account workflows.
///
/// Holds no mutable state; every invocation opens one storage transaction,
/// runs its steps, and commits on success or rolls back on any failure, so
/// no partial write is ever observable. Token crypto is delegated to the
/// four-family signer, row access to the credential store port.
pub struct AuthService<S, M>
where
    S: CredentialStore,
    M: MailSender,
{
    store: Arc<S>,
    mailer: Arc<M>,
    signer: Arc<TokenSigner>,
    hasher: PasswordHasher,
}

fn claim_parts(credential: &UserCredential, role: &str) -> ClaimParts {
    ClaimParts {
        user_id: credential.id.0,
        username: credential.username.as_str().to_string(),
        email: credential.email.as_str().to_string(),
        role: role.to_string(),
    }
}

impl<S, M> AuthService<S, M>
where
    S: CredentialStore,
    M: MailSender,
{
    /// Create a new account service with injected dependencies.
    pub fn new(store: Arc<S>, mailer: Arc<M>, signer: Arc<TokenSigner>) -> Self {
        Self {
            store,
            mailer,
            signer,
            hasher: PasswordHasher::new(),
        }
    }

    async fn abort(&self, tx: S::Tx) {
        if let Err(err) = self.store.rollback(tx).await {
            tracing::error!(error = %err, "transaction rollback failed");
        }
    }

    /// Register a cashier account: credential + role link + profile in one
    /// transaction, activation email on the way out.
    pub async fn register_cashier(
        &self,
        command: RegisterCashierCommand,
        origin: &RequestOrigin,
    ) -> Result<CashierRegistration, AuthError> {
        if command.password != command.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let mut tx = self.store.begin().await?;
        let result = self.register_cashier_in_tx(&mut tx, command, origin).await;
        match result {
            Ok(registration) => {
                self.store.commit(tx).await?;
                tracing::info!(
                    username = %registration.credential.username,
                    "cashier registered, awaiting activation"
                );
                Ok(registration)
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    async fn register_cashier_in_tx(
        &self,
        tx: &mut S::Tx,
        command: RegisterCashierCommand,
        origin: &RequestOrigin,
    ) -> Result<CashierRegistration, AuthError> {
        if self
            .store
            .find_by_username(tx, &command.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken(command.username.to_string()));
        }

        let digest = self.hasher.hash(&command.password)?;
        let now = Utc::now();
        let credential = UserCredential {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            password_digest: digest,
            activated: false,
            refresh_token: None,
            created_at: now,
            updated_at: None,
        };
        self.store.create_credential(tx, &credential).await?;

        let role = self.store.resolve_role(tx, RoleName::Cashier).await?;
        self.store.create_role_link(tx, &credential.id, &role.id).await?;

        // Secondary-key check runs after the credential insert; a collision
        // here must leave nothing behind, which the caller's total rollback
        // guarantees.
        if self
            .store
            .find_cashier_by_phone(tx, &command.phone_number)
            .await?
            .is_some()
        {
            return Err(AuthError::PhoneNumberTaken(command.phone_number.to_string()));
        }

        let profile = CashierProfile {
            id: Uuid::new_v4(),
            user_id: credential.id,
            full_name: command.full_name,
            call_name: command.call_name,
            phone_number: command.phone_number,
            street: command.street,
            city: command.city,
            province: command.province,
            country: command.country,
            postal_code: command.postal_code,
            created_at: now,
            updated_at: None,
        };
        self.store.create_cashier(tx, &profile).await?;

        self.send_activation_email(&credential, role.name, origin).await?;

        Ok(CashierRegistration {
            profile,
            credential,
            role,
        })
    }

    /// Register an admin account; structurally the cashier flow with PIN as
    /// the secondary uniqueness key.
    pub async fn register_admin(
        &self,
        command: RegisterAdminCommand,
        origin: &RequestOrigin,
    ) -> Result<AdminRegistration, AuthError> {
        if command.password != command.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let mut tx = self.store.begin().await?;
        let result = self.register_admin_in_tx(&mut tx, command, origin).await;
        match result {
            Ok(registration) => {
                self.store.commit(tx).await?;
                tracing::info!(
                    username = %registration.credential.username,
                    "admin registered, awaiting activation"
                );
                Ok(registration)
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    async fn register_admin_in_tx(
        &self,
        tx: &mut S::Tx,
        command: RegisterAdminCommand,
        origin: &RequestOrigin,
    ) -> Result<AdminRegistration, AuthError> {
        if self
            .store
            .find_by_username(tx, &command.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken(command.username.to_string()));
        }

        let digest = self.hasher.hash(&command.password)?;
        let now = Utc::now();
        let credential = UserCredential {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            password_digest: digest,
            activated: false,
            refresh_token: None,
            created_at: now,
            updated_at: None,
        };
        self.store.create_credential(tx, &credential).await?;

        let role = self.store.resolve_role(tx, RoleName::Admin).await?;
        self.store.create_role_link(tx, &credential.id, &role.id).await?;

        if self
            .store
            .find_admin_by_pin(tx, &command.pin)
            .await?
            .is_some()
        {
            return Err(AuthError::PinTaken);
        }

        let profile = AdminProfile {
            id: Uuid::new_v4(),
            user_id: credential.id,
            full_name: command.full_name,
            call_name: command.call_name,
            pin: command.pin,
            phone_number: command.phone_number,
            created_at: now,
            updated_at: None,
        };
        self.store.create_admin(tx, &profile).await?;

        self.send_activation_email(&credential, role.name, origin).await?;

        Ok(AdminRegistration {
            profile,
            credential,
            role,
        })
    }

    async fn send_activation_email(
        &self,
        credential: &UserCredential,
        role: RoleName,
        origin: &RequestOrigin,
    ) -> Result<(), AuthError> {
        let token = self
            .signer
            .issue(TokenKind::Activation, &claim_parts(credential, role.as_str()))?;
        let link = origin.activation_link(&token);

        // A failed delivery aborts the registration: better to fail here
        // than to strand an account with no activation path.
        self.mailer
            .send(credential.email.as_str(), ACTIVATION_SUBJECT, &link)
            .await?;
        Ok(())
    }

    /// Cashier login: verify credentials, require activation and the
    /// CASHIER role, mint the token pair, persist the new refresh token.
    pub async fn login_cashier(
        &self,
        command: LoginCashierCommand,
    ) -> Result<LoginSession, AuthError> {
        let mut tx = self.store.begin().await?;

        let result = async {
            let (credential, role) = self
                .verify_credential_in_tx(&mut tx, &command.username, &command.password, RoleName::Cashier)
                .await?;
            self.mint_session_in_tx(&mut tx, credential, &role, None).await
        }
        .await;

        match result {
            Ok(session) => {
                self.store.commit(tx).await?;
                tracing::info!(username = %session.username, "cashier logged in");
                Ok(session)
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    /// Admin login: the cashier flow plus the PIN-matched admin profile as
    /// an additional proof, checked after the role and before any token is
    /// minted.
    pub async fn login_admin(&self, command: LoginAdminCommand) -> Result<LoginSession, AuthError> {
        let mut tx = self.store.begin().await?;

        let result = async {
            let (credential, role) = self
                .verify_credential_in_tx(&mut tx, &command.username, &command.password, RoleName::Admin)
                .await?;

            let admin = self
                .store
                .find_admin_by_pin(&mut tx, &command.pin)
                .await?
                .ok_or(AuthError::InvalidCredentials)?;

            self.mint_session_in_tx(&mut tx, credential, &role, Some(admin.pin))
                .await
        }
        .await;

        match result {
            Ok(session) => {
                self.store.commit(tx).await?;
                tracing::info!(username = %session.username, "admin logged in");
                Ok(session)
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    async fn verify_credential_in_tx(
        &self,
        tx: &mut S::Tx,
        username: &Username,
        password: &str,
        expected_role: RoleName,
    ) -> Result<(UserCredential, Role), AuthError> {
        let credential = self
            .store
            .find_by_username(tx, username)
            .await?
            .ok_or_else(|| AuthError::NotFoundByUsername(username.to_string()))?;

        if !credential.activated {
            return Err(AuthError::NotActivated);
        }

        if !self.hasher.verify(password, &credential.password_digest)? {
            return Err(AuthError::InvalidCredentials);
        }

        let roles = self.store.roles_for_user(tx, &credential.id).await?;
        let role = roles
            .into_iter()
            .find(|r| r.name == expected_role)
            .ok_or_else(|| AuthError::RoleNotAssigned(expected_role.to_string()))?;

        Ok((credential, role))
    }

    async fn mint_session_in_tx(
        &self,
        tx: &mut S::Tx,
        credential: UserCredential,
        role: &Role,
        pin: Option<Pin>,
    ) -> Result<LoginSession, AuthError> {
        let parts = claim_parts(&credential, role.name.as_str());
        let access_token = self.signer.issue(TokenKind::Access, &parts)?;
        let refresh_token = self.signer.issue(TokenKind::Refresh, &parts)?;

        // Rotation point: overwriting invalidates any previously stored
        // refresh token.
        self.store
            .set_refresh_token(tx, &credential.id, Some(&refresh_token))
            .await?;

        Ok(LoginSession {
            username: credential.username,
            access_token,
            refresh_token,
            roles: vec![role.name.to_string()],
            pin,
        })
    }

    /// Flip the credential to activated from an emailed activation token.
    pub async fn activate_account(&self, token: &str) -> Result<(), AuthError> {
        let mut tx = self.store.begin().await?;

        let result = async {
            let claims = self.signer.verify(TokenKind::Activation, token)?;
            let id = UserId(claims.sub);
            let credential = self
                .store
                .find_by_id(&mut tx, &id)
                .await?
                .ok_or_else(|| AuthError::NotFound(id.to_string()))?;

            self.store.set_activated(&mut tx, &credential.id).await?;
            Ok(credential)
        }
        .await;

        match result {
            Ok(credential) => {
                self.store.commit(tx).await?;
                tracing::info!(username = %credential.username, "account activated");
                Ok(())
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    /// Mint a fresh access token for a still-valid refresh token.
    ///
    /// The stored refresh-token column is the source of truth: a presented
    /// token that no longer matches any row (logged out or rotated away)
    /// fails before any signature check. The stored token is never rotated
    /// here; reuse is allowed until expiry or logout.
    pub async fn refresh_token(&self, presented: &str) -> Result<String, AuthError> {
        let mut tx = self.store.begin().await?;

        let result = async {
            self.store
                .find_by_refresh_token(&mut tx, presented)
                .await?
                .ok_or(AuthError::InvalidCredentials)?;

            let claims = self.signer.verify(TokenKind::Refresh, presented)?;
            let parts = ClaimParts {
                user_id: claims.sub,
                username: claims.username,
                email: claims.email,
                role: claims.role,
            };
            let access = self.signer.issue(TokenKind::Access, &parts)?;
            Ok(access)
        }
        .await;

        match result {
            Ok(access) => {
                self.store.commit(tx).await?;
                Ok(access)
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    /// Clear the stored refresh token. Absence at any step is an idempotent
    /// no-op, never an error.
    pub async fn logout(&self, presented: Option<&str>) -> Result<LogoutOutcome, AuthError> {
        let Some(token) = presented.filter(|t| !t.is_empty()) else {
            return Ok(LogoutOutcome::NoSession);
        };

        let mut tx = self.store.begin().await?;

        let result = async {
            let Some(credential) = self.store.find_by_refresh_token(&mut tx, token).await? else {
                return Ok(LogoutOutcome::NoSession);
            };

            self.store
                .set_refresh_token(&mut tx, &credential.id, None)
                .await?;
            tracing::info!(username = %credential.username, "logged out");
            Ok(LogoutOutcome::Cleared)
        }
        .await;

        match result {
            Ok(outcome) => {
                self.store.commit(tx).await?;
                Ok(outcome)
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    /// Email a five-minute reset link to an activated account. Nothing is
    /// persisted; possession of the link is the sole proof.
    pub async fn forgot_password(
        &self,
        command: ForgotPasswordCommand,
        origin: &RequestOrigin,
    ) -> Result<(), AuthError> {
        let mut tx = self.store.begin().await?;

        let result = async {
            let credential = self
                .store
                .find_by_username(&mut tx, &command.username)
                .await?
                .ok_or_else(|| AuthError::NotFoundByUsername(command.username.to_string()))?;

            if !credential.activated {
                return Err(AuthError::NotActivated);
            }

            let roles = self.store.roles_for_user(&mut tx, &credential.id).await?;
            let role = roles
                .first()
                .map(|r| r.name.as_str())
                .unwrap_or_default();

            let token = self
                .signer
                .issue(TokenKind::PasswordReset, &claim_parts(&credential, role))?;
            let link = origin.reset_link(&credential.id, &token);

            self.mailer
                .send(credential.email.as_str(), RESET_SUBJECT, &link)
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                self.store.commit(tx).await?;
                Ok(())
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    /// Link-landing step of the reset flow: validates the token and returns
    /// a display-safe payload for the reset form.
    ///
    /// Subject binding: the token subject is authoritative, and the
    /// path-supplied id must additionally equal it, defending against a
    /// reset link spliced together from another account's id.
    pub async fn get_reset_password(
        &self,
        id: &UserId,
        token: &str,
    ) -> Result<ResetPreview, AuthError> {
        let mut tx = self.store.begin().await?;

        let result = async {
            let claims = self.signer.verify(TokenKind::PasswordReset, token)?;

            if claims.sub != id.0 {
                return Err(AuthError::ResetSubjectMismatch);
            }

            let subject = UserId(claims.sub);
            let credential = self
                .store
                .find_by_id(&mut tx, &subject)
                .await?
                .ok_or_else(|| AuthError::NotFound(subject.to_string()))?;

            if !credential.activated {
                return Err(AuthError::NotActivated);
            }

            Ok(ResetPreview {
                username: credential.username,
                email: credential.email,
                token: token.to_string(),
            })
        }
        .await;

        match result {
            Ok(preview) => {
                self.store.commit(tx).await?;
                Ok(preview)
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    /// Consume a reset token and overwrite the stored digest.
    ///
    /// Binds to the decoded token subject (same rule as the landing step)
    /// and clears the stored refresh token so every outstanding session has
    /// to re-authenticate with the new password.
    pub async fn reset_password(
        &self,
        token: Option<&str>,
        command: ResetPasswordCommand,
    ) -> Result<PasswordChanged, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingResetToken)?;

        if command.password != command.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let mut tx = self.store.begin().await?;

        let result = async {
            let claims = self.signer.verify(TokenKind::PasswordReset, token)?;
            let subject = UserId(claims.sub);

            let credential = self
                .store
                .find_by_id(&mut tx, &subject)
                .await?
                .ok_or_else(|| AuthError::NotFound(subject.to_string()))?;

            if !credential.activated {
                return Err(AuthError::NotActivated);
            }

            let digest = self.hasher.hash(&command.password)?;
            self.store.set_password(&mut tx, &credential.id, &digest).await?;
            self.store
                .set_refresh_token(&mut tx, &credential.id, None)
                .await?;

            Ok(PasswordChanged {
                username: credential.username,
                email: credential.email,
            })
        }
        .await;

        match result {
            Ok(changed) => {
                self.store.commit(tx).await?;
                tracing::info!(username = %changed.username, "password reset");
                Ok(changed)
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }

    /// Authenticated self-service password change, gated on old-password
    /// proof. Also clears the stored refresh token.
    pub async fn change_password(
        &self,
        command: ChangePasswordCommand,
    ) -> Result<PasswordChanged, AuthError> {
        let mut tx = self.store.begin().await?;

        let result = async {
            let credential = self
                .store
                .find_by_id(&mut tx, &command.id)
                .await?
                .ok_or_else(|| AuthError::NotFound(command.id.to_string()))?;

            if !credential.activated {
                return Err(AuthError::NotActivated);
            }

            if !self
                .hasher
                .verify(&command.old_password, &credential.password_digest)?
            {
                return Err(AuthError::OldPasswordMismatch);
            }

            if command.new_password != command.confirm_password {
                return Err(AuthError::PasswordMismatch);
            }

            let digest = self.hasher.hash(&command.new_password)?;
            self.store.set_password(&mut tx, &credential.id, &digest).await?;
            self.store
                .set_refresh_token(&mut tx, &credential.id, None)
                .await?;

            Ok(PasswordChanged {
                username: credential.username,
                email: credential.email,
            })
        }
        .await;

        match result {
            Ok(changed) => {
                self.store.commit(tx).await?;
                tracing::info!(username = %changed.username, "password changed");
                Ok(changed)
            }
            Err(err) => {
                self.abort(tx).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use auth::TokenLifetimes;
    use auth::TokenSecrets;
    use chrono::Duration;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::account::errors::MailError;
    use crate::account::models::EmailAddress;
    use crate::account::models::PhoneNumber;
    use crate::account::models::Pin;
    use crate::account::models::Role;
    use crate::account::models::Username;

    mock! {
        pub Store {}

        #[async_trait]
        impl CredentialStore for Store {
            type Tx = ();

            async fn begin(&self) -> Result<(), AuthError>;
            async fn commit(&self, tx: ()) -> Result<(), AuthError>;
            async fn rollback(&self, tx: ()) -> Result<(), AuthError>;
            async fn find_by_username(&self, tx: &mut (), username: &Username) -> Result<Option<UserCredential>, AuthError>;
            async fn find_by_id(&self, tx: &mut (), id: &UserId) -> Result<Option<UserCredential>, AuthError>;
            async fn find_by_refresh_token(&self, tx: &mut (), token: &str) -> Result<Option<UserCredential>, AuthError>;
            async fn create_credential(&self, tx: &mut (), credential: &UserCredential) -> Result<(), AuthError>;
            async fn set_activated(&self, tx: &mut (), id: &UserId) -> Result<(), AuthError>;
            async fn set_password(&self, tx: &mut (), id: &UserId, digest: &str) -> Result<(), AuthError>;
            async fn set_refresh_token<'life0, 'life1, 'life2, 'life3>(&'life0 self, tx: &'life1 mut (), id: &'life2 UserId, token: Option<&'life3 str>) -> Result<(), AuthError>;
            async fn resolve_role(&self, tx: &mut (), name: RoleName) -> Result<Role, AuthError>;
            async fn create_role_link(&self, tx: &mut (), user_id: &UserId, role_id: &Uuid) -> Result<(), AuthError>;
            async fn roles_for_user(&self, tx: &mut (), user_id: &UserId) -> Result<Vec<Role>, AuthError>;
            async fn find_cashier_by_phone(&self, tx: &mut (), phone: &PhoneNumber) -> Result<Option<CashierProfile>, AuthError>;
            async fn create_cashier(&self, tx: &mut (), profile: &CashierProfile) -> Result<(), AuthError>;
            async fn find_admin_by_pin(&self, tx: &mut (), pin: &Pin) -> Result<Option<AdminProfile>, AuthError>;
            async fn create_admin(&self, tx: &mut (), profile: &AdminProfile) -> Result<(), AuthError>;
        }
    }

    mock! {
        pub Mailer {}

        #[async_trait]
        impl MailSender for Mailer {
            async fn send(&self, to: &str, subject: &str, link: &str) -> Result<(), MailError>;
        }
    }

    fn signer() -> Arc<TokenSigner> {
        Arc::new(TokenSigner::new(
            TokenSecrets {
                activation: "test_activation_secret_32_bytes_ok!!".to_string(),
                access: "test_access_secret_32_bytes_long_ok!".to_string(),
                refresh: "test_refresh_secret_32_bytes_long_!!".to_string(),
                password_reset: "test_reset_secret_32_bytes_long_ok!!".to_string(),
            },
            TokenLifetimes::default(),
        ))
    }

    fn service(store: MockStore, mailer: MockMailer) -> AuthService<MockStore, MockMailer> {
        AuthService::new(Arc::new(store), Arc::new(mailer), signer())
    }

    fn credential(activated: bool, password: &str) -> UserCredential {
        let hasher = PasswordHasher::new();
        UserCredential {
            id: UserId::new(),
            username: Username::new("alice".to_string()).unwrap(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            password_digest: hasher.hash(password).unwrap(),
            activated,
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn cashier_role() -> Role {
        Role {
            id: Uuid::new_v4(),
            name: RoleName::Cashier,
        }
    }

    fn admin_role() -> Role {
        Role {
            id: Uuid::new_v4(),
            name: RoleName::Admin,
        }
    }

    fn register_cashier_command() -> RegisterCashierCommand {
        RegisterCashierCommand {
            username: Username::new("alice".to_string()).unwrap(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            password: "Secret123!".to_string(),
            confirm_password: "Secret123!".to_string(),
            full_name: "Alice Martin".to_string(),
            call_name: "Alice".to_string(),
            phone_number: PhoneNumber::new("555-0100".to_string()).unwrap(),
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            province: "IL".to_string(),
            country: "US".to_string(),
            postal_code: "62701".to_string(),
        }
    }

    fn origin() -> RequestOrigin {
        RequestOrigin::new("http", "localhost:3000")
    }

    #[tokio::test]
    async fn register_cashier_creates_one_of_each_row_unactivated() {
        let mut store = MockStore::new();
        let mut mailer = MockMailer::new();

        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_, _| Ok(None));
        store
            .expect_create_credential()
            .withf(|_, c| {
                c.username.as_str() == "alice"
                    && !c.activated
                    && c.refresh_token.is_none()
                    && c.password_digest.starts_with("$argon2")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_resolve_role()
            .with(always(), eq(RoleName::Cashier))
            .times(1)
            .returning(|_, _| Ok(cashier_role()));
        store
            .expect_create_role_link()
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_find_cashier_by_phone()
            .times(1)
            .returning(|_, _| Ok(None));
        store
            .expect_create_cashier()
            .withf(|_, p| p.phone_number.as_str() == "555-0100")
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_commit().times(1).returning(|_| Ok(()));
        store.expect_rollback().times(0);

        mailer
            .expect_send()
            .withf(|to, subject, link| {
                to == "alice@example.com"
                    && subject == ACTIVATION_SUBJECT
                    && link.contains("/api/v1/auth/activate-account/")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(store, mailer);
        let registration = service
            .register_cashier(register_cashier_command(), &origin())
            .await
            .expect("registration should succeed");

        assert!(!registration.credential.activated);
        assert_eq!(registration.role.name, RoleName::Cashier);
        assert_eq!(registration.profile.user_id, registration.credential.id);
    }

    #[tokio::test]
    async fn register_password_mismatch_never_touches_storage() {
        let mut store = MockStore::new();
        store.expect_begin().times(0);

        let mut command = register_cashier_command();
        command.confirm_password = "Different!".to_string();

        let service = service(store, MockMailer::new());
        let err = service.register_cashier(command, &origin()).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
    }

    #[tokio::test]
    async fn register_duplicate_username_conflicts_and_rolls_back() {
        let mut store = MockStore::new();

        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_, _| Ok(Some(credential(true, "Secret123!"))));
        store.expect_create_credential().times(0);
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let err = service
            .register_cashier(register_cashier_command(), &origin())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken(_)));
    }

    #[tokio::test]
    async fn phone_collision_after_credential_insert_rolls_back_everything() {
        let mut store = MockStore::new();

        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_, _| Ok(None));
        store
            .expect_create_credential()
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_resolve_role()
            .times(1)
            .returning(|_, _| Ok(cashier_role()));
        store
            .expect_create_role_link()
            .times(1)
            .returning(|_, _, _| Ok(()));
        store.expect_find_cashier_by_phone().times(1).returning(|_, _| {
            let existing = CashierProfile {
                id: Uuid::new_v4(),
                user_id: UserId::new(),
                full_name: "Someone Else".to_string(),
                call_name: "Else".to_string(),
                phone_number: PhoneNumber::new("555-0100".to_string()).unwrap(),
                street: String::new(),
                city: String::new(),
                province: String::new(),
                country: String::new(),
                postal_code: String::new(),
                created_at: Utc::now(),
                updated_at: None,
            };
            Ok(Some(existing))
        });
        store.expect_create_cashier().times(0);
        // The credential insert above must revert with the transaction
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let service = service(store, mailer);
        let err = service
            .register_cashier(register_cashier_command(), &origin())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PhoneNumberTaken(_)));
    }

    #[tokio::test]
    async fn delivery_failure_aborts_registration() {
        let mut store = MockStore::new();

        store.expect_begin().times(1).returning(|| Ok(()));
        store.expect_find_by_username().returning(|_, _| Ok(None));
        store.expect_create_credential().returning(|_, _| Ok(()));
        store.expect_resolve_role().returning(|_, _| Ok(cashier_role()));
        store.expect_create_role_link().returning(|_, _, _| Ok(()));
        store.expect_find_cashier_by_phone().returning(|_, _| Ok(None));
        store.expect_create_cashier().returning(|_, _| Ok(()));
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_, _, _| Err(MailError::DeliveryFailed("relay unreachable".to_string())));

        let service = service(store, mailer);
        let err = service
            .register_cashier(register_cashier_command(), &origin())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Mail(_)));
    }

    #[tokio::test]
    async fn register_admin_pin_collision_conflicts() {
        let mut store = MockStore::new();

        store.expect_begin().times(1).returning(|| Ok(()));
        store.expect_find_by_username().returning(|_, _| Ok(None));
        store.expect_create_credential().returning(|_, _| Ok(()));
        store.expect_resolve_role().returning(|_, _| Ok(admin_role()));
        store.expect_create_role_link().returning(|_, _, _| Ok(()));
        store.expect_find_admin_by_pin().times(1).returning(|_, _| {
            let existing = AdminProfile {
                id: Uuid::new_v4(),
                user_id: UserId::new(),
                full_name: "Someone Else".to_string(),
                call_name: "Else".to_string(),
                pin: Pin::new("123456".to_string()).unwrap(),
                phone_number: PhoneNumber::new("555-0199".to_string()).unwrap(),
                created_at: Utc::now(),
                updated_at: None,
            };
            Ok(Some(existing))
        });
        store.expect_create_admin().times(0);
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let command = RegisterAdminCommand {
            username: Username::new("boss".to_string()).unwrap(),
            email: EmailAddress::new("boss@example.com".to_string()).unwrap(),
            password: "Secret123!".to_string(),
            confirm_password: "Secret123!".to_string(),
            full_name: "Boss Person".to_string(),
            call_name: "Boss".to_string(),
            pin: Pin::new("123456".to_string()).unwrap(),
            phone_number: PhoneNumber::new("555-0101".to_string()).unwrap(),
        };

        let service = service(store, MockMailer::new());
        let err = service.register_admin(command, &origin()).await.unwrap_err();
        assert!(matches!(err, AuthError::PinTaken));
    }

    #[tokio::test]
    async fn login_unactivated_fails_even_with_correct_password() {
        let mut store = MockStore::new();

        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_, _| Ok(Some(credential(false, "Secret123!"))));
        store.expect_set_refresh_token().times(0);
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let err = service
            .login_cashier(LoginCashierCommand {
                username: Username::new("alice".to_string()).unwrap(),
                password: "Secret123!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotActivated));
    }

    #[tokio::test]
    async fn login_wrong_password_is_unauthorized() {
        let mut store = MockStore::new();

        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_, _| Ok(Some(credential(true, "Secret123!"))));
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let err = service
            .login_cashier(LoginCashierCommand {
                username: Username::new("alice".to_string()).unwrap(),
                password: "WrongPassword".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_success_persists_rotated_refresh_token() {
        let mut store = MockStore::new();
        let cred = credential(true, "Secret123!");
        let cred_id = cred.id;

        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_, _| Ok(Some(cred.clone())));
        store
            .expect_roles_for_user()
            .times(1)
            .returning(|_, _| Ok(vec![cashier_role()]));
        store
            .expect_set_refresh_token()
            .withf(move |_, id, token| *id == cred_id && matches!(token, Some(t) if !t.is_empty()))
            .times(1)
            .returning(|_, _, _| Ok(()));
        store.expect_commit().times(1).returning(|_| Ok(()));
        store.expect_rollback().times(0);

        let service = service(store, MockMailer::new());
        let session = service
            .login_cashier(LoginCashierCommand {
                username: Username::new("alice".to_string()).unwrap(),
                password: "Secret123!".to_string(),
            })
            .await
            .expect("login should succeed");

        assert_eq!(session.roles, vec!["CASHIER".to_string()]);
        assert!(session.pin.is_none());

        // Both tokens verify against their own family and carry the subject
        let access = signer()
            .verify(TokenKind::Access, &session.access_token)
            .expect("access token verifies");
        let refresh = signer()
            .verify(TokenKind::Refresh, &session.refresh_token)
            .expect("refresh token verifies");
        assert_eq!(access.sub, cred_id.0);
        assert_eq!(refresh.sub, cred_id.0);
        assert_eq!(access.role, "CASHIER");
    }

    #[tokio::test]
    async fn login_without_expected_role_is_unauthorized() {
        let mut store = MockStore::new();

        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_, _| Ok(Some(credential(true, "Secret123!"))));
        store
            .expect_roles_for_user()
            .times(1)
            .returning(|_, _| Ok(vec![admin_role()]));
        store.expect_set_refresh_token().times(0);
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let err = service
            .login_cashier(LoginCashierCommand {
                username: Username::new("alice".to_string()).unwrap(),
                password: "Secret123!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RoleNotAssigned(r) if r == "CASHIER"));
    }

    #[tokio::test]
    async fn admin_login_requires_matching_pin_profile() {
        let mut store = MockStore::new();

        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(|_, _| Ok(Some(credential(true, "Secret123!"))));
        store
            .expect_roles_for_user()
            .times(1)
            .returning(|_, _| Ok(vec![admin_role()]));
        store
            .expect_find_admin_by_pin()
            .times(1)
            .returning(|_, _| Ok(None));
        // No token is minted or persisted for an unmatched PIN
        store.expect_set_refresh_token().times(0);
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let err = service
            .login_admin(LoginAdminCommand {
                username: Username::new("boss".to_string()).unwrap(),
                password: "Secret123!".to_string(),
                pin: Pin::new("999999".to_string()).unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn admin_login_echoes_the_profile_pin() {
        let cred = credential(true, "Secret123!");

        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_, _| Ok(Some(cred.clone())));
        store
            .expect_roles_for_user()
            .times(1)
            .returning(|_, _| Ok(vec![admin_role()]));
        store.expect_find_admin_by_pin().times(1).returning(|_, _| {
            let profile = AdminProfile {
                id: Uuid::new_v4(),
                user_id: UserId::new(),
                full_name: "Alice Martin".to_string(),
                call_name: "Alice".to_string(),
                pin: Pin::new("123456".to_string()).unwrap(),
                phone_number: PhoneNumber::new("555-0101".to_string()).unwrap(),
                created_at: Utc::now(),
                updated_at: None,
            };
            Ok(Some(profile))
        });
        store
            .expect_set_refresh_token()
            .times(1)
            .returning(|_, _, _| Ok(()));
        store.expect_commit().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let session = service
            .login_admin(LoginAdminCommand {
                username: Username::new("alice".to_string()).unwrap(),
                password: "Secret123!".to_string(),
                pin: Pin::new("123456".to_string()).unwrap(),
            })
            .await
            .expect("admin login");

        assert_eq!(session.roles, vec!["ADMIN".to_string()]);
        assert_eq!(session.pin.as_ref().map(|p| p.as_str()), Some("123456"));
    }

    #[tokio::test]
    async fn activation_token_flips_the_flag_once() {
        let cred = credential(false, "Secret123!");
        let cred_id = cred.id;
        let token = signer()
            .issue(TokenKind::Activation, &claim_parts(&cred, "CASHIER"))
            .unwrap();

        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_id()
            .withf(move |_, id| *id == cred_id)
            .times(1)
            .returning(move |_, _| Ok(Some(cred.clone())));
        store
            .expect_set_activated()
            .withf(move |_, id| *id == cred_id)
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_commit().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        service.activate_account(&token).await.expect("activation");
    }

    #[tokio::test]
    async fn expired_activation_token_is_rejected_before_any_lookup() {
        let cred = credential(false, "Secret123!");
        let stale = Utc::now() - Duration::days(8);
        let token = signer()
            .issue_at(TokenKind::Activation, &claim_parts(&cred, "CASHIER"), stale)
            .unwrap();

        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store.expect_find_by_id().times(0);
        store.expect_set_activated().times(0);
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let err = service.activate_account(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn refresh_never_rotates_and_reissues_for_the_same_subject() {
        let cred = credential(true, "Secret123!");
        let cred_id = cred.id;
        let refresh = signer()
            .issue(TokenKind::Refresh, &claim_parts(&cred, "CASHIER"))
            .unwrap();

        let mut store = MockStore::new();
        store.expect_begin().times(2).returning(|| Ok(()));
        store
            .expect_find_by_refresh_token()
            .times(2)
            .returning(move |_, _| Ok(Some(cred.clone())));
        store.expect_set_refresh_token().times(0);
        store.expect_commit().times(2).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let first = service.refresh_token(&refresh).await.expect("first refresh");
        // Distinct issued-at, hence a distinct token
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let second = service.refresh_token(&refresh).await.expect("second refresh");

        assert_ne!(first, second);
        let a = signer().verify(TokenKind::Access, &first).unwrap();
        let b = signer().verify(TokenKind::Access, &second).unwrap();
        assert_eq!(a.sub, cred_id.0);
        assert_eq!(b.sub, cred_id.0);
    }

    #[tokio::test]
    async fn refresh_after_logout_is_unauthorized() {
        let cred = credential(true, "Secret123!");
        let refresh = signer()
            .issue(TokenKind::Refresh, &claim_parts(&cred, "CASHIER"))
            .unwrap();

        // Column already cleared: the lookup misses even though the JWT
        // itself is still cryptographically valid
        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_refresh_token()
            .times(1)
            .returning(|_, _| Ok(None));
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let err = service.refresh_token(&refresh).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn logout_without_token_is_an_idempotent_noop() {
        let mut store = MockStore::new();
        store.expect_begin().times(0);

        let service = service(store, MockMailer::new());
        let outcome = service.logout(None).await.expect("logout");
        assert_eq!(outcome, LogoutOutcome::NoSession);
    }

    #[tokio::test]
    async fn logout_clears_the_stored_token() {
        let cred = credential(true, "Secret123!");
        let cred_id = cred.id;

        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_refresh_token()
            .times(1)
            .returning(move |_, _| Ok(Some(cred.clone())));
        store
            .expect_set_refresh_token()
            .withf(move |_, id, token| *id == cred_id && token.is_none())
            .times(1)
            .returning(|_, _, _| Ok(()));
        store.expect_commit().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let outcome = service.logout(Some("stored-token")).await.expect("logout");
        assert_eq!(outcome, LogoutOutcome::Cleared);
    }

    #[tokio::test]
    async fn logout_with_unknown_token_reports_no_session() {
        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_refresh_token()
            .times(1)
            .returning(|_, _| Ok(None));
        store.expect_set_refresh_token().times(0);
        store.expect_commit().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let outcome = service.logout(Some("never-issued")).await.expect("logout");
        assert_eq!(outcome, LogoutOutcome::NoSession);
    }

    #[tokio::test]
    async fn forgot_then_reset_roundtrip_rehashes_and_revokes_sessions() {
        let cred = credential(true, "Secret123!");
        let cred_id = cred.id;
        let find_cred = cred.clone();

        let sent_link = Arc::new(Mutex::new(None::<String>));
        let captured = Arc::clone(&sent_link);

        let mut store = MockStore::new();
        store.expect_begin().times(2).returning(|| Ok(()));
        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_, _| Ok(Some(cred.clone())));
        store
            .expect_roles_for_user()
            .times(1)
            .returning(|_, _| Ok(vec![cashier_role()]));
        store
            .expect_find_by_id()
            .withf(move |_, id| *id == cred_id)
            .times(1)
            .returning(move |_, _| Ok(Some(find_cred.clone())));
        store
            .expect_set_password()
            .withf(|_, _, digest| {
                let hasher = PasswordHasher::new();
                hasher.verify("NewSecret456!", digest).unwrap_or(false)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_set_refresh_token()
            .withf(|_, _, token| token.is_none())
            .times(1)
            .returning(|_, _, _| Ok(()));
        store.expect_commit().times(2).returning(|_| Ok(()));
        store.expect_rollback().times(0);

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|_, subject, _| subject == RESET_SUBJECT)
            .times(1)
            .returning(move |_, _, link| {
                *captured.lock().unwrap() = Some(link.to_string());
                Ok(())
            });

        let service = service(store, mailer);
        service
            .forgot_password(
                ForgotPasswordCommand {
                    username: Username::new("alice".to_string()).unwrap(),
                },
                &origin(),
            )
            .await
            .expect("forgot password");

        let link = sent_link.lock().unwrap().clone().expect("link captured");
        let token = link.rsplit('/').next().expect("token segment").to_string();

        let changed = service
            .reset_password(
                Some(&token),
                ResetPasswordCommand {
                    password: "NewSecret456!".to_string(),
                    confirm_password: "NewSecret456!".to_string(),
                },
            )
            .await
            .expect("reset password");
        assert_eq!(changed.username.as_str(), "alice");
    }

    #[tokio::test]
    async fn reset_with_mismatched_confirmation_never_touches_storage() {
        let mut store = MockStore::new();
        store.expect_begin().times(0);

        let service = service(store, MockMailer::new());
        let err = service
            .reset_password(
                Some("some-token"),
                ResetPasswordCommand {
                    password: "one".to_string(),
                    confirm_password: "two".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
    }

    #[tokio::test]
    async fn reset_without_token_is_a_validation_failure() {
        let mut store = MockStore::new();
        store.expect_begin().times(0);

        let service = service(store, MockMailer::new());
        let err = service
            .reset_password(
                None,
                ResetPasswordCommand {
                    password: "NewSecret456!".to_string(),
                    confirm_password: "NewSecret456!".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingResetToken));
    }

    #[tokio::test]
    async fn reset_landing_rejects_a_substituted_path_id() {
        let cred = credential(true, "Secret123!");
        let token = signer()
            .issue(TokenKind::PasswordReset, &claim_parts(&cred, "CASHIER"))
            .unwrap();

        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store.expect_find_by_id().times(0);
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let other_id = UserId::new();
        let err = service.get_reset_password(&other_id, &token).await.unwrap_err();
        assert!(matches!(err, AuthError::ResetSubjectMismatch));
    }

    #[tokio::test]
    async fn reset_landing_returns_display_safe_payload() {
        let cred = credential(true, "Secret123!");
        let cred_id = cred.id;
        let token = signer()
            .issue(TokenKind::PasswordReset, &claim_parts(&cred, "CASHIER"))
            .unwrap();

        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_id()
            .times(1)
            .returning(move |_, _| Ok(Some(cred.clone())));
        store.expect_commit().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let preview = service
            .get_reset_password(&cred_id, &token)
            .await
            .expect("reset landing");
        assert_eq!(preview.username.as_str(), "alice");
        assert_eq!(preview.email.as_str(), "alice@example.com");
        assert_eq!(preview.token, token);
    }

    #[tokio::test]
    async fn change_password_requires_old_password_proof() {
        let cred = credential(true, "Secret123!");
        let cred_id = cred.id;

        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_id()
            .times(1)
            .returning(move |_, _| Ok(Some(cred.clone())));
        store.expect_set_password().times(0);
        store.expect_commit().times(0);
        store.expect_rollback().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let err = service
            .change_password(ChangePasswordCommand {
                id: cred_id,
                old_password: "NotTheOldPassword".to_string(),
                new_password: "NewSecret456!".to_string(),
                confirm_password: "NewSecret456!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OldPasswordMismatch));
    }

    #[tokio::test]
    async fn change_password_rehashes_and_revokes_sessions() {
        let cred = credential(true, "Secret123!");
        let cred_id = cred.id;

        let mut store = MockStore::new();
        store.expect_begin().times(1).returning(|| Ok(()));
        store
            .expect_find_by_id()
            .times(1)
            .returning(move |_, _| Ok(Some(cred.clone())));
        store
            .expect_set_password()
            .withf(|_, _, digest| {
                let hasher = PasswordHasher::new();
                hasher.verify("NewSecret456!", digest).unwrap_or(false)
                    && !hasher.verify("Secret123!", digest).unwrap_or(true)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_set_refresh_token()
            .withf(|_, _, token| token.is_none())
            .times(1)
            .returning(|_, _, _| Ok(()));
        store.expect_commit().times(1).returning(|_| Ok(()));

        let service = service(store, MockMailer::new());
        let changed = service
            .change_password(ChangePasswordCommand {
                id: cred_id,
                old_password: "Secret123!".to_string(),
                new_password: "NewSecret456!".to_string(),
                confirm_password: "NewSecret456!".to_string(),
            })
            .await
            .expect("change password");
        assert_eq!(changed.username.as_str(), "alice");
    }
}
