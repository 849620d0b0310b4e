use auth::TokenKind;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::set_refresh_cookie;
use super::ApiError;
use super::ApiSuccess;
use crate::account::models::LoginCashierCommand;
use crate::account::models::LoginSession;
use crate::account::models::Username;
use crate::inbound::http::router::AppState;

pub async fn login_cashier(
    State(state): State<AppState>,
    Json(body): Json<LoginCashierRequest>,
) -> Result<Response, ApiError> {
    // A malformed username can never match a stored credential, so it is
    // reported the same way as a failed authentication
    let username = Username::new(body.username)
        .map_err(|_| ApiError::Unauthorized("Authentication failed".to_string()))?;

    let session = state
        .auth_service
        .login_cashier(LoginCashierCommand {
            username,
            password: body.password,
        })
        .await
        .map_err(ApiError::from)?;

    login_response(&state, &session)
}

/// Build the OK envelope with the refresh token installed as an HttpOnly
/// cookie alongside the body.
pub(super) fn login_response(state: &AppState, session: &LoginSession) -> Result<Response, ApiError> {
    let max_age = state.signer.lifetime(TokenKind::Refresh).num_seconds();
    let cookie = set_refresh_cookie(&session.refresh_token, max_age);

    let mut response =
        ApiSuccess::new(StatusCode::OK, LoginResponseData::from(session)).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?,
    );

    Ok(response)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginCashierRequest {
    username: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseData {
    pub username: String,
    pub roles: Vec<String>,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

impl From<&LoginSession> for LoginResponseData {
    fn from(session: &LoginSession) -> Self {
        Self {
            username: session.username.as_str().to_string(),
            roles: session.roles.clone(),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            pin: session.pin.as_ref().map(|p| p.as_str().to_string()),
        }
    }
}
