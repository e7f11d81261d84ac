//! Shared wiring for integration tests: the full service stack over the
//! in-memory adapters.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use paygate::adapters::{
    InMemoryPayerRepository, InMemoryProjectCatalog, InMemorySessionRepository,
    InMemoryTransactionRepository, InMemoryWebhookEndpointRepository, MockPaymentInitiator,
    RecordingNotifier,
};
use paygate::application::{
    DispatchMode, OutboundDispatcher, SessionLifecycleService, SessionSettings,
    WebhookProcessingService,
};
use paygate::domain::cipher::CipherService;
use paygate::domain::foundation::{ProjectId, ProviderCode, Timestamp};
use paygate::domain::notification::OutboundWebhookEndpoint;
use paygate::domain::project::{EncryptedSecretSet, Project, Provider};
use paygate::domain::webhook::{
    compute_signature, DigestAlgorithm, DigestEncoding, ProviderWebhookConfig, ValidatorFactory,
};
use paygate::ports::WebhookEndpointRepository;

pub const WAVE_WEBHOOK_SECRET: &str = "whsec_wave_integration";
pub const WAVE_SIGNATURE_HEADER: &str = "X-Wave-Signature";

pub struct Gateway {
    pub sessions: Arc<SessionLifecycleService>,
    pub webhooks: Arc<WebhookProcessingService>,
    pub cipher: Arc<CipherService>,
    pub catalog: Arc<InMemoryProjectCatalog>,
    pub session_store: Arc<InMemorySessionRepository>,
    pub transactions: Arc<InMemoryTransactionRepository>,
    pub endpoints: Arc<InMemoryWebhookEndpointRepository>,
    pub initiator: Arc<MockPaymentInitiator>,
    pub notifier: Arc<RecordingNotifier>,
    pub project: Project,
}

/// Builds a gateway with one project that accepts `wave` payments.
pub async fn gateway() -> Gateway {
    let cipher = Arc::new(CipherService::from_key_setting(Some("integration-test-key")).unwrap());
    let catalog = Arc::new(InMemoryProjectCatalog::new());
    let session_store = Arc::new(InMemorySessionRepository::new());
    let transactions = Arc::new(InMemoryTransactionRepository::new());
    let payers = Arc::new(InMemoryPayerRepository::new());
    let endpoints = Arc::new(InMemoryWebhookEndpointRepository::new());
    let initiator = Arc::new(MockPaymentInitiator::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let project = Project::new(ProjectId::new(), "Boutique Dakar").with_redirects(
        Some("https://shop.test/paid".to_string()),
        Some("https://shop.test/failed".to_string()),
    );
    catalog.add_project(project.clone()).await;

    let mut credentials = BTreeMap::new();
    credentials.insert("api_key".to_string(), "wave-live-key".to_string());
    let secrets = EncryptedSecretSet::new()
        .merge_update(credentials, &cipher)
        .unwrap();
    let webhook = ProviderWebhookConfig::hmac(
        WAVE_SIGNATURE_HEADER,
        cipher.encrypt(WAVE_WEBHOOK_SECRET).unwrap(),
    );
    catalog
        .add_provider(
            Provider::new(project.id, ProviderCode::new("wave").unwrap(), "Wave")
                .with_secrets(vec!["api_key".to_string()], secrets)
                .with_webhook(webhook),
        )
        .await;

    let sessions = Arc::new(SessionLifecycleService::new(
        session_store.clone(),
        transactions.clone(),
        payers.clone(),
        catalog.clone(),
        initiator.clone(),
        cipher.clone(),
        SessionSettings {
            checkout_base_url: "https://pay.test/checkout".to_string(),
            wait_poll_interval: std::time::Duration::from_millis(10),
            wait_timeout: std::time::Duration::from_millis(500),
            ..SessionSettings::default()
        },
    ));

    let dispatcher = OutboundDispatcher::new(
        catalog.clone(),
        payers,
        endpoints.clone(),
        notifier.clone(),
        cipher.clone(),
    );
    let webhooks = Arc::new(
        WebhookProcessingService::new(
            catalog.clone(),
            transactions.clone(),
            session_store.clone(),
            ValidatorFactory::new(cipher.clone()),
            dispatcher,
        )
        .with_dispatch_mode(DispatchMode::Inline),
    );

    Gateway {
        sessions,
        webhooks,
        cipher,
        catalog,
        session_store,
        transactions,
        endpoints,
        initiator,
        notifier,
        project,
    }
}

impl Gateway {
    /// Registers a merchant endpoint with an encrypted signing secret.
    pub async fn add_endpoint(&self, url: &str, secret: &str) -> OutboundWebhookEndpoint {
        let endpoint = OutboundWebhookEndpoint::new(self.project.id, url)
            .with_secret(None, self.cipher.encrypt(secret).unwrap());
        self.endpoints.save(&endpoint).await.unwrap();
        endpoint
    }
}

/// Signature header value for `body` as Wave would send it.
pub fn wave_signature(body: &str, secret: &str) -> String {
    let t = Timestamp::now().as_unix_secs();
    let mut payload = t.to_string().into_bytes();
    payload.extend_from_slice(body.as_bytes());
    let sig = compute_signature(
        DigestAlgorithm::Sha256,
        DigestEncoding::Hex,
        secret.as_bytes(),
        &payload,
    )
    .unwrap();
    format!("t={},v1={}", t, sig)
}

pub fn callback_body(reference: &str, status: &str) -> String {
    format!(r#"{{"reference":"{}","status":"{}"}}"#, reference, status)
}
