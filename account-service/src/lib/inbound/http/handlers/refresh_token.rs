use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use serde::Serialize;

use super::refresh_token_cookie;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiSuccess<RefreshTokenResponseData>, ApiError> {
    let presented = refresh_token_cookie(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Authentication failed".to_string()))?;

    state
        .auth_service
        .refresh_token(&presented)
        .await
        .map_err(ApiError::from)
        .map(|access_token| {
            ApiSuccess::new(StatusCode::OK, RefreshTokenResponseData { access_token })
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponseData {
    pub access_token: String,
}
