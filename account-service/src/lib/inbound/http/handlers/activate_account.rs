use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn activate_account(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<ApiSuccess<ActivateAccountResponseData>, ApiError> {
    state
        .auth_service
        .activate_account(&token)
        .await
        .map_err(ApiError::from)
        .map(|()| {
            ApiSuccess::new(
                StatusCode::OK,
                ActivateAccountResponseData {
                    message: "Account activated successfully".to_string(),
                },
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateAccountResponseData {
    pub message: String,
}
