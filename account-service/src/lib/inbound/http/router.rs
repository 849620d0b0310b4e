use std::sync::Arc;
use std::time::Duration;

use auth::TokenSigner;
use axum::body::Body;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::activate_account::activate_account;
use super::handlers::change_password::change_password;
use super::handlers::forget_password::forget_password;
use super::handlers::login_admin::login_admin;
use super::handlers::login_cashier::login_cashier;
use super::handlers::logout::logout;
use super::handlers::refresh_token::refresh_token;
use super::handlers::register_admin::register_admin;
use super::handlers::register_cashier::register_cashier;
use super::handlers::reset_password::get_reset_password;
use super::handlers::reset_password::reset_password;
use super::middleware::authenticate as auth_middleware;
use crate::account::models::RequestOrigin;
use crate::account::service::AuthService;
use crate::outbound::mailer::SmtpMailer;
use crate::outbound::repositories::credentials::PostgresCredentialStore;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService<PostgresCredentialStore, SmtpMailer>>,
    pub signer: Arc<TokenSigner>,
    pub public_scheme: String,
}

impl AppState {
    /// Origin for the links embedded in outbound email: configured scheme
    /// plus the Host header of the request that triggered the send.
    pub fn request_origin(&self, headers: &HeaderMap) -> RequestOrigin {
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");

        RequestOrigin::new(self.public_scheme.clone(), host)
    }
}

pub fn create_router(
    auth_service: Arc<AuthService<PostgresCredentialStore, SmtpMailer>>,
    signer: Arc<TokenSigner>,
    public_scheme: String,
) -> Router {
    let state = AppState {
        auth_service,
        signer,
        public_scheme,
    };

    let public_routes = Router::new()
        .route("/api/v1/auth/register/cashier", post(register_cashier))
        .route("/api/v1/auth/login/cashier", post(login_cashier))
        .route("/api/v1/auth/register/admin", post(register_admin))
        .route("/api/v1/auth/login/admin", post(login_admin))
        .route("/api/v1/auth/activate-account/:token", get(activate_account))
        .route("/api/v1/auth/forget-password", post(forget_password))
        .route(
            "/api/v1/auth/reset-password/:id/:token",
            get(get_reset_password),
        )
        .route("/api/v1/auth/reset-password", post(reset_password))
        .route("/api/v1/auth/refresh-token", post(refresh_token))
        .route("/api/v1/auth/logout", delete(logout));

    let protected_routes = Router::new()
        .route("/api/v1/auth/change-password", patch(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
