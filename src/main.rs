use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use accounts_service::{
    ApiConfig, Config, CredentialVerifier, Environment, MemorySessionStore, MemoryUserDirectory,
    PgUserDirectory, RedisSessionStore, UserDirectory, api_routes, telemetry,
};

const MAX_DB_CONNECTIONS: u32 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Logging before Config::from_env, which may warn.
    let environment = Environment::from_env().context("invalid APP_ENV")?;
    telemetry::init(environment);

    let config = Config::from_env().context("invalid configuration")?;

    tracing::info!(
        environment = %config.environment,
        listen = %config.listen_addr,
        session_ttl_secs = config.api.session_ttl().as_secs(),
        "starting accounts service"
    );

    let credentials = config.credentials()?;
    let redis_url = config.redis_url.clone();

    let router = match config.database_url.as_deref() {
        Some(url) => {
            let directory = PgUserDirectory::connect(url, MAX_DB_CONNECTIONS)
                .await
                .context("connecting to Postgres")?;
            directory.migrate().await.context("running migrations")?;
            tracing::info!("Postgres connected, migrations applied");
            with_session_store(redis_url.as_deref(), config.api, directory, credentials).await?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory user directory");
            with_session_store(
                redis_url.as_deref(),
                config.api,
                MemoryUserDirectory::new(),
                credentials,
            )
            .await?
        }
    };

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

async fn with_session_store<U: UserDirectory>(
    redis_url: Option<&str>,
    api: ApiConfig,
    directory: U,
    credentials: CredentialVerifier,
) -> anyhow::Result<Router> {
    let ttl = api.session_ttl();
    match redis_url {
        Some(url) => {
            let store = RedisSessionStore::connect(url, ttl)
                .await
                .context("connecting to Redis")?;
            tracing::info!("Redis connected");
            Ok(api_routes(api, directory, store, credentials))
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory session store");
            Ok(api_routes(
                api,
                directory,
                MemorySessionStore::new(ttl),
                credentials,
            ))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
