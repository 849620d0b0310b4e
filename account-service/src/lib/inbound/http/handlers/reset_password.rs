use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::PasswordChanged;
use crate::account::models::ResetPasswordCommand;
use crate::account::models::ResetPreview;
use crate::account::models::UserId;
use crate::inbound::http::router::AppState;

/// Link-landing step: the emailed reset link points here.
pub async fn get_reset_password(
    State(state): State<AppState>,
    Path((id, token)): Path<(String, String)>,
) -> Result<ApiSuccess<ResetPreviewData>, ApiError> {
    let id = UserId::from_string(&id)
        .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid user id: {e}")))?;

    state
        .auth_service
        .get_reset_password(&id, &token)
        .await
        .map_err(ApiError::from)
        .map(|ref preview| ApiSuccess::new(StatusCode::OK, preview.into()))
}

/// Form-submission step: consumes the token from the query string.
pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<ResetPasswordQuery>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiSuccess<PasswordChangedData>, ApiError> {
    state
        .auth_service
        .reset_password(
            query.token.as_deref(),
            ResetPasswordCommand {
                password: body.password,
                confirm_password: body.password_confirm,
            },
        )
        .await
        .map_err(ApiError::from)
        .map(|ref changed| ApiSuccess::new(StatusCode::OK, changed.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordQuery {
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    password: String,
    password_confirm: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPreviewData {
    pub username: String,
    pub email: String,
    pub token: String,
}

impl From<&ResetPreview> for ResetPreviewData {
    fn from(preview: &ResetPreview) -> Self {
        Self {
            username: preview.username.as_str().to_string(),
            email: preview.email.as_str().to_string(),
            token: preview.token.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChangedData {
    pub username: String,
    pub email: String,
}

impl From<&PasswordChanged> for PasswordChangedData {
    fn from(changed: &PasswordChanged) -> Self {
        Self {
            username: changed.username.as_str().to_string(),
            email: changed.email.as_str().to_string(),
        }
    }
}
