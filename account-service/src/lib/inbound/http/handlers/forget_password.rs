use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::ForgotPasswordCommand;
use crate::account::models::Username;
use crate::inbound::http::router::AppState;

pub async fn forget_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ForgetPasswordRequest>,
) -> Result<ApiSuccess<ForgetPasswordResponseData>, ApiError> {
    let username = Username::new(body.username)
        .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid username: {e}")))?;
    let origin = state.request_origin(&headers);

    state
        .auth_service
        .forgot_password(ForgotPasswordCommand { username }, &origin)
        .await
        .map_err(ApiError::from)
        .map(|()| {
            ApiSuccess::new(
                StatusCode::OK,
                ForgetPasswordResponseData {
                    message: "Password reset link sent to your email".to_string(),
                },
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgetPasswordRequest {
    username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForgetPasswordResponseData {
    pub message: String,
}
