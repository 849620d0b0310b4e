use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::register_cashier::CredentialData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::EmailError;
use crate::account::errors::PhoneNumberError;
use crate::account::errors::PinError;
use crate::account::errors::UsernameError;
use crate::account::models::AdminRegistration;
use crate::account::models::EmailAddress;
use crate::account::models::PhoneNumber;
use crate::account::models::Pin;
use crate::account::models::RegisterAdminCommand;
use crate::account::models::Username;
use crate::inbound::http::router::AppState;

pub async fn register_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterAdminRequest>,
) -> Result<ApiSuccess<RegisterAdminResponseData>, ApiError> {
    let origin = state.request_origin(&headers);

    state
        .auth_service
        .register_admin(body.try_into_command()?, &origin)
        .await
        .map_err(ApiError::from)
        .map(|ref registration| ApiSuccess::new(StatusCode::CREATED, registration.into()))
}

/// HTTP request body for registering an admin (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminRequest {
    username: String,
    email: String,
    password: String,
    password_confirm: String,
    full_name: String,
    call_name: String,
    pin: String,
    phone_number: String,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterAdminError {
    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid PIN: {0}")]
    Pin(#[from] PinError),

    #[error("Invalid phone number: {0}")]
    PhoneNumber(#[from] PhoneNumberError),
}

impl RegisterAdminRequest {
    fn try_into_command(self) -> Result<RegisterAdminCommand, ParseRegisterAdminError> {
        Ok(RegisterAdminCommand {
            username: Username::new(self.username)?,
            email: EmailAddress::new(self.email)?,
            password: self.password,
            confirm_password: self.password_confirm,
            full_name: self.full_name,
            call_name: self.call_name,
            pin: Pin::new(self.pin)?,
            phone_number: PhoneNumber::new(self.phone_number)?,
        })
    }
}

impl From<ParseRegisterAdminError> for ApiError {
    fn from(err: ParseRegisterAdminError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminResponseData {
    pub admin_id: String,
    pub full_name: String,
    pub call_name: String,
    pub pin: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user_credential: CredentialData,
    pub roles: Vec<String>,
}

impl From<&AdminRegistration> for RegisterAdminResponseData {
    fn from(registration: &AdminRegistration) -> Self {
        Self {
            admin_id: registration.profile.id.to_string(),
            full_name: registration.profile.full_name.clone(),
            call_name: registration.profile.call_name.clone(),
            pin: registration.profile.pin.as_str().to_string(),
            phone_number: registration.profile.phone_number.as_str().to_string(),
            created_at: registration.profile.created_at,
            updated_at: registration.profile.updated_at,
            user_credential: CredentialData {
                username: registration.credential.username.as_str().to_string(),
                email: registration.credential.email.as_str().to_string(),
                activated: registration.credential.activated,
            },
            roles: vec![registration.role.name.to_string()],
        }
    }
}
