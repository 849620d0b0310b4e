use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::Row;
use sqlx::Transaction;
use uuid::Uuid;

use crate::account::errors::AuthError;
use crate::account::models::AdminProfile;
use crate::account::models::CashierProfile;
use crate::account::models::EmailAddress;
use crate::account::models::PhoneNumber;
use crate::account::models::Pin;
use crate::account::models::Role;
use crate::account::models::RoleName;
use crate::account::models::UserCredential;
use crate::account::models::UserId;
use crate::account::models::Username;
use crate::account::ports::CredentialStore;

const CREDENTIAL_COLUMNS: &str =
    "id, username, email, password_digest, activated, refresh_token, created_at, updated_at";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> AuthError {
    AuthError::Database(e.to_string())
}

fn credential_from_row(row: PgRow) -> Result<UserCredential, AuthError> {
    let username: String = row.try_get("username").map_err(db_err)?;
    let email: String = row.try_get("email").map_err(db_err)?;
    Ok(UserCredential {
        id: UserId(row.try_get::<Uuid, _>("id").map_err(db_err)?),
        username: Username::new(username)
            .map_err(|e| AuthError::Database(format!("corrupt username column: {e}")))?,
        email: EmailAddress::new(email)
            .map_err(|e| AuthError::Database(format!("corrupt email column: {e}")))?,
        password_digest: row.try_get("password_digest").map_err(db_err)?,
        activated: row.try_get("activated").map_err(db_err)?,
        refresh_token: row.try_get("refresh_token").map_err(db_err)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
        updated_at: row.try_get::<Option<DateTime<Utc>>, _>("updated_at").map_err(db_err)?,
    })
}

fn cashier_from_row(row: PgRow) -> Result<CashierProfile, AuthError> {
    let phone: String = row.try_get("phone_number").map_err(db_err)?;
    Ok(CashierProfile {
        id: row.try_get("id").map_err(db_err)?,
        user_id: UserId(row.try_get::<Uuid, _>("user_id").map_err(db_err)?),
        full_name: row.try_get("full_name").map_err(db_err)?,
        call_name: row.try_get("call_name").map_err(db_err)?,
        phone_number: PhoneNumber::new(phone)
            .map_err(|e| AuthError::Database(format!("corrupt phone_number column: {e}")))?,
        street: row.try_get("street").map_err(db_err)?,
        city: row.try_get("city").map_err(db_err)?,
        province: row.try_get("province").map_err(db_err)?,
        country: row.try_get("country").map_err(db_err)?,
        postal_code: row.try_get("postal_code").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn admin_from_row(row: PgRow) -> Result<AdminProfile, AuthError> {
    let pin: String = row.try_get("pin").map_err(db_err)?;
    let phone: String = row.try_get("phone_number").map_err(db_err)?;
    Ok(AdminProfile {
        id: row.try_get("id").map_err(db_err)?,
        user_id: UserId(row.try_get::<Uuid, _>("user_id").map_err(db_err)?),
        full_name: row.try_get("full_name").map_err(db_err)?,
        call_name: row.try_get("call_name").map_err(db_err)?,
        pin: Pin::new(pin)
            .map_err(|e| AuthError::Database(format!("corrupt pin column: {e}")))?,
        phone_number: PhoneNumber::new(phone)
            .map_err(|e| AuthError::Database(format!("corrupt phone_number column: {e}")))?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

/// Map a unique-constraint violation onto the matching Conflict error,
/// keyed by constraint name. Anything else is a plain database error.
fn conflict_or_db(e: sqlx::Error) -> AuthError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            match db.constraint() {
                Some("user_credentials_username_key") => {
                    return AuthError::UsernameTaken("username".to_string())
                }
                Some("cashier_profiles_phone_number_key") => {
                    return AuthError::PhoneNumberTaken("phone number".to_string())
                }
                Some("admin_profiles_pin_key") => return AuthError::PinTaken,
                _ => {}
            }
        }
    }
    AuthError::Database(e.to_string())
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, AuthError> {
        self.pool.begin().await.map_err(db_err)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), AuthError> {
        tx.commit().await.map_err(db_err)
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), AuthError> {
        tx.rollback().await.map_err(db_err)
    }

    async fn find_by_username(
        &self,
        tx: &mut Self::Tx,
        username: &Username,
    ) -> Result<Option<UserCredential>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM user_credentials WHERE username = $1"
        ))
        .bind(username.as_str())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;

        row.map(credential_from_row).transpose()
    }

    async fn find_by_id(
        &self,
        tx: &mut Self::Tx,
        id: &UserId,
    ) -> Result<Option<UserCredential>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM user_credentials WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;

        row.map(credential_from_row).transpose()
    }

    async fn find_by_refresh_token(
        &self,
        tx: &mut Self::Tx,
        token: &str,
    ) -> Result<Option<UserCredential>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM user_credentials WHERE refresh_token = $1"
        ))
        .bind(token)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;

        row.map(credential_from_row).transpose()
    }

    async fn create_credential(
        &self,
        tx: &mut Self::Tx,
        credential: &UserCredential,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO user_credentials
                (id, username, email, password_digest, activated, refresh_token, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(credential.id.0)
        .bind(credential.username.as_str())
        .bind(credential.email.as_str())
        .bind(&credential.password_digest)
        .bind(credential.activated)
        .bind(&credential.refresh_token)
        .bind(credential.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| match conflict_or_db(e) {
            AuthError::UsernameTaken(_) => {
                AuthError::UsernameTaken(credential.username.to_string())
            }
            other => other,
        })?;

        Ok(())
    }

    async fn set_activated(&self, tx: &mut Self::Tx, id: &UserId) -> Result<(), AuthError> {
        let result =
            sqlx::query("UPDATE user_credentials SET activated = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(id.0)
                .execute(&mut **tx)
                .await
                .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn set_password(
        &self,
        tx: &mut Self::Tx,
        id: &UserId,
        digest: &str,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE user_credentials SET password_digest = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.0)
        .bind(digest)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn set_refresh_token(
        &self,
        tx: &mut Self::Tx,
        id: &UserId,
        token: Option<&str>,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE user_credentials SET refresh_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.0)
        .bind(token)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn resolve_role(&self, tx: &mut Self::Tx, name: RoleName) -> Result<Role, AuthError> {
        let row = sqlx::query("SELECT id FROM roles WHERE name = $1")
            .bind(name.as_str())
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_err)?;

        match row {
            Some(r) => Ok(Role {
                id: r.try_get("id").map_err(db_err)?,
                name,
            }),
            None => Err(AuthError::SeedRoleMissing(name.to_string())),
        }
    }

    async fn create_role_link(
        &self,
        tx: &mut Self::Tx,
        user_id: &UserId,
        role_id: &Uuid,
    ) -> Result<(), AuthError> {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user_id.0)
            .bind(role_id)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn roles_for_user(
        &self,
        tx: &mut Self::Tx,
        user_id: &UserId,
    ) -> Result<Vec<Role>, AuthError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&mut **tx)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| {
                let name: String = r.try_get("name").map_err(db_err)?;
                Ok(Role {
                    id: r.try_get("id").map_err(db_err)?,
                    name: name
                        .parse()
                        .map_err(|e| AuthError::Database(format!("corrupt role name: {e}")))?,
                })
            })
            .collect()
    }

    async fn find_cashier_by_phone(
        &self,
        tx: &mut Self::Tx,
        phone: &PhoneNumber,
    ) -> Result<Option<CashierProfile>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, full_name, call_name, phone_number,
                   street, city, province, country, postal_code, created_at, updated_at
            FROM cashier_profiles
            WHERE phone_number = $1
            "#,
        )
        .bind(phone.as_str())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;

        row.map(cashier_from_row).transpose()
    }

    async fn create_cashier(
        &self,
        tx: &mut Self::Tx,
        profile: &CashierProfile,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO cashier_profiles
                (id, user_id, full_name, call_name, phone_number,
                 street, city, province, country, postal_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(profile.id)
        .bind(profile.user_id.0)
        .bind(&profile.full_name)
        .bind(&profile.call_name)
        .bind(profile.phone_number.as_str())
        .bind(&profile.street)
        .bind(&profile.city)
        .bind(&profile.province)
        .bind(&profile.country)
        .bind(&profile.postal_code)
        .bind(profile.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| match conflict_or_db(e) {
            AuthError::PhoneNumberTaken(_) => {
                AuthError::PhoneNumberTaken(profile.phone_number.to_string())
            }
            other => other,
        })?;

        Ok(())
    }

    async fn find_admin_by_pin(
        &self,
        tx: &mut Self::Tx,
        pin: &Pin,
    ) -> Result<Option<AdminProfile>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, full_name, call_name, pin, phone_number, created_at, updated_at
            FROM admin_profiles
            WHERE pin = $1
            "#,
        )
        .bind(pin.as_str())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;

        row.map(admin_from_row).transpose()
    }

    async fn create_admin(
        &self,
        tx: &mut Self::Tx,
        profile: &AdminProfile,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO admin_profiles
                (id, user_id, full_name, call_name, pin, phone_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(profile.id)
        .bind(profile.user_id.0)
        .bind(&profile.full_name)
        .bind(&profile.call_name)
        .bind(profile.pin.as_str())
        .bind(profile.phone_number.as_str())
        .bind(profile.created_at)
        .execute(&mut **tx)
        .await
        .map_err(conflict_or_db)?;

        Ok(())
    }
}
