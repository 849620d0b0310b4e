use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use super::login_cashier::login_response;
use super::ApiError;
use crate::account::models::LoginAdminCommand;
use crate::account::models::Pin;
use crate::account::models::Username;
use crate::inbound::http::router::AppState;

pub async fn login_admin(
    State(state): State<AppState>,
    Json(body): Json<LoginAdminRequest>,
) -> Result<Response, ApiError> {
    // Malformed username or PIN is indistinguishable from a failed match
    let username = Username::new(body.username)
        .map_err(|_| ApiError::Unauthorized("Authentication failed".to_string()))?;
    let pin = Pin::new(body.pin)
        .map_err(|_| ApiError::Unauthorized("Authentication failed".to_string()))?;

    let session = state
        .auth_service
        .login_admin(LoginAdminCommand {
            username,
            password: body.password,
            pin,
        })
        .await
        .map_err(ApiError::from)?;

    login_response(&state, &session)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginAdminRequest {
    username: String,
    password: String,
    pin: String,
}
