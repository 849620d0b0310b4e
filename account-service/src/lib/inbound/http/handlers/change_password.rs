use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::reset_password::PasswordChangedData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::UserId;
use crate::inbound::http::router::AppState;

pub async fn change_password(
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<ApiSuccess<PasswordChangedData>, ApiError> {
    let id = UserId::from_string(&body.id)
        .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid user id: {e}")))?;

    state
        .auth_service
        .change_password(ChangePasswordCommand {
            id,
            old_password: body.old_password,
            new_password: body.new_password,
            confirm_password: body.password_confirm,
        })
        .await
        .map_err(ApiError::from)
        .map(|ref changed| ApiSuccess::new(StatusCode::OK, changed.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    id: String,
    old_password: String,
    new_password: String,
    password_confirm: String,
}
