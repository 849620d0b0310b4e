use axum::http::header;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::account::errors::AuthError;

pub mod activate_account;
pub mod change_password;
pub mod forget_password;
pub mod login_admin;
pub mod login_cashier;
pub mod logout;
pub mod refresh_token;
pub mod register_admin;
pub mod register_cashier;
pub mod reset_password;

/// Name of the HttpOnly cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::PasswordMismatch | AuthError::MissingResetToken => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::UsernameTaken(_) | AuthError::PhoneNumberTaken(_) | AuthError::PinTaken => {
                ApiError::Conflict(err.to_string())
            }
            AuthError::NotFound(_)
            | AuthError::NotFoundByUsername(_)
            | AuthError::ResetSubjectMismatch => ApiError::NotFound(err.to_string()),
            AuthError::NotActivated
            | AuthError::InvalidCredentials
            | AuthError::RoleNotAssigned(_)
            | AuthError::OldPasswordMismatch
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => ApiError::Unauthorized(err.to_string()),
            AuthError::SeedRoleMissing(_)
            | AuthError::Password(_)
            | AuthError::Mail(_)
            | AuthError::Database(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Pull the refresh token out of the Cookie header, if any.
pub fn refresh_token_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == REFRESH_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// Set-Cookie value installing the refresh token as an HttpOnly cookie.
pub fn set_refresh_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{REFRESH_COOKIE}={token}; HttpOnly; Secure; SameSite=None; Path=/; Max-Age={max_age_secs}")
}

/// Set-Cookie value clearing the refresh cookie.
pub fn clear_refresh_cookie() -> String {
    format!("{REFRESH_COOKIE}=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0")
}
