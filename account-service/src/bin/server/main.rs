use std::sync::Arc;

use account_service::account::service::AuthService;
use account_service::config::Config;
use account_service::inbound::http::router::create_router;
use account_service::outbound::mailer::SmtpMailer;
use account_service::outbound::repositories::credentials::PostgresCredentialStore;
use auth::TokenSigner;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;
    config.validate().map_err(anyhow::Error::from)?;

    tracing::info!(
        http_port = config.server.http_port,
        public_scheme = %config.server.public_scheme,
        smtp_host = %config.smtp.host,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let signer = Arc::new(TokenSigner::new(
        config.tokens.secrets(),
        config.tokens.lifetimes(),
    ));
    let credential_store = Arc::new(PostgresCredentialStore::new(pg_pool));
    let mailer = Arc::new(SmtpMailer::new(&config.smtp).map_err(|e| anyhow::anyhow!(e))?);

    let auth_service = Arc::new(AuthService::new(
        credential_store,
        mailer,
        Arc::clone(&signer),
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, signer, config.server.public_scheme);
    axum::serve(http_listener, http_application).await?;

    Ok(())
}
