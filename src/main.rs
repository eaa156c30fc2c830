use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use plan_sync::adapters::http::{billing_router, BillingAppState};
use plan_sync::adapters::postgres::PostgresUserDirectory;
use plan_sync::adapters::stripe::StripePaymentAdapter;
use plan_sync::config::{AppConfig, LogFormat, ServerConfig};
use plan_sync::domain::billing::StripeWebhookVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let webhook_verifier = config.payment.webhook_secret().map(StripeWebhookVerifier::new);
    if webhook_verifier.is_none() {
        tracing::warn!("No webhook signing secret configured; accepting unsigned deliveries");
    }

    let state = BillingAppState {
        user_directory: Arc::new(PostgresUserDirectory::new(pool)),
        payment_provider: Arc::new(StripePaymentAdapter::new(config.payment.stripe_config())),
        webhook_verifier,
        public_url: config.server.public_base_url().to_string(),
    };

    let app = billing_router()
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "HTTP server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match server.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {e}");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
