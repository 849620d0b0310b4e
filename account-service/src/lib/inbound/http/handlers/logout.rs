use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;

use super::clear_refresh_cookie;
use super::refresh_token_cookie;
use super::ApiError;
use crate::inbound::http::router::AppState;

/// Clears the stored refresh token and expires the cookie. Responds 204 in
/// every absence case, so repeated logouts are harmless.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let presented = refresh_token_cookie(&headers);

    state
        .auth_service
        .logout(presented.as_deref())
        .await
        .map_err(ApiError::from)?;

    let mut response = StatusCode::NO_CONTENT.into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&clear_refresh_cookie())
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?,
    );

    Ok(response)
}
