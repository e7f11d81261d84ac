//! Paygate server binary.

use std::sync::Arc;

use sqlx::PgPool;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use paygate::adapters::http::api_router;
use paygate::adapters::postgres::{
    PostgresPayerRepository, PostgresProjectCatalog, PostgresSessionRepository,
    PostgresTransactionRepository, PostgresWebhookEndpointRepository,
};
use paygate::adapters::{HttpPaymentInitiator, HttpWebhookNotifier, MockPaymentInitiator};
use paygate::application::{
    OutboundDispatcher, SessionLifecycleService, WebhookProcessingService,
};
use paygate::config::{AppConfig, InitiatorMode};
use paygate::ports::PaymentInitiator;
use paygate::domain::cipher::CipherService;
use paygate::domain::webhook::ValidatorFactory;

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cipher = Arc::new(CipherService::from_key_setting(config.cipher.key_setting())?);
    if cipher.is_ephemeral() {
        warn!("Running with an ephemeral encryption key; stored secrets will not survive a restart");
    }

    let pool: PgPool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    info!("Connected to database");

    let catalog = Arc::new(PostgresProjectCatalog::new(pool.clone()));
    let sessions = Arc::new(PostgresSessionRepository::new(pool.clone()));
    let transactions = Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let payers = Arc::new(PostgresPayerRepository::new(pool.clone()));
    let endpoints = Arc::new(PostgresWebhookEndpointRepository::new(pool));

    let initiator = build_initiator(&config)?;
    let notifier = Arc::new(HttpWebhookNotifier::with_timeout(
        config.webhook.outbound_timeout(),
    )?);

    let session_service = Arc::new(SessionLifecycleService::new(
        sessions.clone(),
        transactions.clone(),
        payers.clone(),
        catalog.clone(),
        initiator,
        cipher.clone(),
        config.session_settings(),
    ));

    let dispatcher =
        OutboundDispatcher::new(catalog.clone(), payers, endpoints, notifier, cipher.clone());
    let webhook_service = Arc::new(WebhookProcessingService::new(
        catalog,
        transactions,
        sessions,
        ValidatorFactory::new(cipher),
        dispatcher,
    ));

    let app = api_router(session_service, webhook_service)
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Paygate listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_initiator(
    config: &AppConfig,
) -> Result<Arc<dyn PaymentInitiator>, Box<dyn std::error::Error>> {
    match config.initiator.mode {
        InitiatorMode::Http => {
            let mut providers: Vec<&str> =
                config.initiator.endpoints.keys().map(String::as_str).collect();
            providers.sort_unstable();
            if providers.is_empty() {
                warn!("No provider connectors configured; every checkout will fail upstream");
            } else {
                info!(providers = ?providers, "Provider connectors configured");
            }
            Ok(Arc::new(HttpPaymentInitiator::new(
                config.initiator.endpoints.clone(),
                config.webhook.initiation_timeout(),
            )?))
        }
        InitiatorMode::Mock => {
            warn!("Mock payment initiator in use; checkout links are fake");
            Ok(Arc::new(MockPaymentInitiator::new()))
        }
    }
}
