use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::EmailError;
use crate::account::errors::PhoneNumberError;
use crate::account::errors::UsernameError;
use crate::account::models::CashierRegistration;
use crate::account::models::EmailAddress;
use crate::account::models::PhoneNumber;
use crate::account::models::RegisterCashierCommand;
use crate::account::models::Username;
use crate::inbound::http::router::AppState;

pub async fn register_cashier(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterCashierRequest>,
) -> Result<ApiSuccess<RegisterCashierResponseData>, ApiError> {
    let origin = state.request_origin(&headers);

    state
        .auth_service
        .register_cashier(body.try_into_command()?, &origin)
        .await
        .map_err(ApiError::from)
        .map(|ref registration| ApiSuccess::new(StatusCode::CREATED, registration.into()))
}

/// HTTP request body for registering a cashier (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCashierRequest {
    username: String,
    email: String,
    password: String,
    password_confirm: String,
    full_name: String,
    call_name: String,
    phone_number: String,
    street: String,
    city: String,
    province: String,
    country: String,
    postal_code: String,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterCashierError {
    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid phone number: {0}")]
    PhoneNumber(#[from] PhoneNumberError),
}

impl RegisterCashierRequest {
    fn try_into_command(self) -> Result<RegisterCashierCommand, ParseRegisterCashierError> {
        Ok(RegisterCashierCommand {
            username: Username::new(self.username)?,
            email: EmailAddress::new(self.email)?,
            password: self.password,
            confirm_password: self.password_confirm,
            full_name: self.full_name,
            call_name: self.call_name,
            phone_number: PhoneNumber::new(self.phone_number)?,
            street: self.street,
            city: self.city,
            province: self.province,
            country: self.country,
            postal_code: self.postal_code,
        })
    }
}

impl From<ParseRegisterCashierError> for ApiError {
    fn from(err: ParseRegisterCashierError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCashierResponseData {
    pub cashier_id: String,
    pub full_name: String,
    pub call_name: String,
    pub phone_number: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user_credential: CredentialData,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialData {
    pub username: String,
    pub email: String,
    pub activated: bool,
}

impl From<&CashierRegistration> for RegisterCashierResponseData {
    fn from(registration: &CashierRegistration) -> Self {
        Self {
            cashier_id: registration.profile.id.to_string(),
            full_name: registration.profile.full_name.clone(),
            call_name: registration.profile.call_name.clone(),
            phone_number: registration.profile.phone_number.as_str().to_string(),
            street: registration.profile.street.clone(),
            city: registration.profile.city.clone(),
            province: registration.profile.province.clone(),
            country: registration.profile.country.clone(),
            postal_code: registration.profile.postal_code.clone(),
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
