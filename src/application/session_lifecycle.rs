//! SessionLifecycleService - Creation, checkout and status polling of payment sessions.
//!
//! Checkout is the operation that must never start two charges for one
//! session. Two guards apply:
//! - a per-session async lock held for the whole checkout
//! - a conditional `opened -> pending` write in the repository, which also
//!   covers several gateway processes sharing one database
//!
//! Every session write is conditional on the status that was read. A callback
//! that settles the session while a checkout or a read is in flight wins, and
//! the slower writer reloads instead of moving the status back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::cipher::CipherService;
use crate::domain::foundation::{
    DomainError, ErrorCode, ProjectId, ProviderCode, SessionId, SessionStatus, Timestamp,
    TransactionStatus,
};
use crate::domain::project::{DecryptedSecrets, Project, Provider, ProviderSummary};
use crate::domain::session::{
    NewSession, PaymentResult, RedirectUrls, ResolvedRedirects, Session, SessionError,
};
use crate::domain::transaction::{NewTransaction, Payer, Transaction};
use crate::ports::{
    InitiationRequest, PayerRepository, PaymentInitiator, ProjectCatalog, SessionRepository,
    TransactionRepository,
};

// ════════════════════════════════════════════════════════════════════════════════
// Settings
// ════════════════════════════════════════════════════════════════════════════════

/// Tunables for the session lifecycle.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Lifetime of a new session.
    pub ttl_minutes: i64,
    /// Base of the hosted checkout page; the session id is appended.
    pub checkout_base_url: String,
    pub default_success_url: String,
    pub default_failure_url: String,
    pub wait_poll_interval: Duration,
    pub wait_timeout: Duration,
    /// Upper bound on a single provider initiation call.
    pub initiation_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: 60,
            checkout_base_url: "http://localhost:8080/checkout".to_string(),
            default_success_url: "http://localhost:8080/payment/success".to_string(),
            default_failure_url: "http://localhost:8080/payment/failure".to_string(),
            wait_poll_interval: Duration::from_millis(1000),
            wait_timeout: Duration::from_secs(30),
            initiation_timeout: Duration::from_secs(15),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Commands, queries and results
// ════════════════════════════════════════════════════════════════════════════════

/// Payer identity supplied when a session is opened.
#[derive(Debug, Clone)]
pub struct PayerDetails {
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Command to open a payment session.
#[derive(Debug, Clone)]
pub struct InitiateSessionCommand {
    pub project_id: ProjectId,
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
    pub client_reference: Option<String>,
    pub payer: PayerDetails,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiateSessionResult {
    pub session_id: SessionId,
    pub checkout_url: String,
    pub status: SessionStatus,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
    pub include_expired: bool,
}

/// Session as shown to the checkout page.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session: Session,
    pub providers: Vec<ProviderSummary>,
}

/// Command to start (or resume) a charge with one provider.
#[derive(Debug, Clone)]
pub struct CheckoutCommand {
    pub session_id: SessionId,
    pub provider: ProviderCode,
    /// Redirect overrides for this checkout only.
    pub redirects: RedirectUrls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutResult {
    pub payment: PaymentResult,
    pub status: SessionStatus,
    /// True when a cached result was returned and no provider was contacted.
    pub reused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitStatusResult {
    pub status: SessionStatus,
    pub redirect_url: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Service
// ════════════════════════════════════════════════════════════════════════════════

/// Orchestrates the payment-session lifecycle.
pub struct SessionLifecycleService {
    sessions: Arc<dyn SessionRepository>,
    transactions: Arc<dyn TransactionRepository>,
    payers: Arc<dyn PayerRepository>,
    catalog: Arc<dyn ProjectCatalog>,
    initiator: Arc<dyn PaymentInitiator>,
    cipher: Arc<CipherService>,
    settings: SessionSettings,
    checkout_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLifecycleService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        transactions: Arc<dyn TransactionRepository>,
        payers: Arc<dyn PayerRepository>,
        catalog: Arc<dyn ProjectCatalog>,
        initiator: Arc<dyn PaymentInitiator>,
        cipher: Arc<CipherService>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            sessions,
            transactions,
            payers,
            catalog,
            initiator,
            cipher,
            settings,
            checkout_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Initiate
    // ─────────────────────────────────────────────────────────────────────────

    /// Opens a session. No provider is contacted.
    ///
    /// # Errors
    ///
    /// - `ProjectNotFound` if the project does not exist
    /// - `NoActiveProvider` if the project has no active provider
    /// - `ValidationFailed` for a bad phone, amount or currency
    pub async fn initiate(
        &self,
        cmd: InitiateSessionCommand,
    ) -> Result<InitiateSessionResult, SessionError> {
        self.load_project(&cmd.project_id).await?;
        if self.catalog.active_providers(&cmd.project_id).await?.is_empty() {
            return Err(SessionError::NoActiveProvider);
        }

        let payer = Payer::new(&cmd.payer.phone, cmd.payer.name, cmd.payer.email)?;
        let payer = self.payers.upsert_by_phone(payer).await?;

        let now = Timestamp::now();
        let session = Session::open(
            NewSession {
                project_id: cmd.project_id,
                payer_id: payer.id,
                amount: cmd.amount,
                currency: cmd.currency,
                description: cmd.description,
                client_reference: cmd.client_reference,
                redirects: RedirectUrls::new(cmd.success_url, cmd.failure_url),
            },
            self.settings.ttl_minutes,
            now,
        )?;
        self.sessions.save(&session).await?;

        info!(
            session_id = %session.id(),
            project_id = %session.project_id(),
            amount = session.amount(),
            currency = session.currency(),
            "Payment session opened"
        );

        Ok(InitiateSessionResult {
            session_id: *session.id(),
            checkout_url: self.checkout_url(session.id()),
            status: session.status(),
            expires_at: *session.expires_at(),
        })
    }

    fn checkout_url(&self, id: &SessionId) -> String {
        format!(
            "{}/{}",
            self.settings.checkout_base_url.trim_end_matches('/'),
            id
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Get
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetches a session, applying lazy expiry and dropping a stale payment cache.
    ///
    /// # Errors
    ///
    /// - `NotFound` if missing, or expired and `include_expired` is false
    pub async fn get_session(&self, query: GetSessionQuery) -> Result<SessionView, SessionError> {
        let now = Timestamp::now();
        let session = self.load_fresh(&query.session_id, now).await?;

        if session.status() == SessionStatus::Expired && !query.include_expired {
            return Err(SessionError::not_found(query.session_id));
        }

        let providers = self
            .catalog
            .active_providers(session.project_id())
            .await?
            .iter()
            .map(Provider::summary)
            .collect();

        Ok(SessionView { session, providers })
    }

    /// Loads a session and persists lazy expiry or cache clearing.
    ///
    /// Statuses only move forward, so the reload loop ends.
    async fn load_fresh(&self, id: &SessionId, now: Timestamp) -> Result<Session, SessionError> {
        loop {
            let mut session = self
                .sessions
                .find_by_id(id)
                .await?
                .ok_or(SessionError::NotFound(*id))?;
            let observed = session.status();

            let expired = session.expire_if_due(now);
            let cleared = session.clear_stale_payment(now);
            if !expired && !cleared {
                return Ok(session);
            }
            if self.sessions.update(&session, observed).await? {
                debug!(session_id = %id, expired, cleared, "Session refreshed on read");
                return Ok(session);
            }
            debug!(session_id = %id, %observed, "Session changed during refresh, reloading");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Checkout
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts a charge with `cmd.provider`, or returns the cached one.
    ///
    /// A cached result for the same provider that has not expired is
    /// returned unchanged and the provider is not contacted.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `Expired` for a missing or lapsed session
    /// - `InvalidState` if the session is terminal
    /// - `ProviderUnavailable` if the provider is not active for the project
    /// - `ValidationFailed` if a required provider secret is missing
    /// - `CheckoutInProgress` if another process won the `opened -> pending` race
    /// - `UpstreamInitiationFailed` if the provider call fails
    pub async fn checkout(&self, cmd: CheckoutCommand) -> Result<CheckoutResult, SessionError> {
        let lock = self.checkout_lock(&cmd.session_id).await;
        let _guard = lock.lock().await;

        let now = Timestamp::now();
        let mut session = self.load_fresh(&cmd.session_id, now).await?;

        if let Some(cached) = session.reusable_payment(&cmd.provider, &now) {
            debug!(
                session_id = %cmd.session_id,
                provider = %cmd.provider,
                reference = %cached.reference,
                "Returning cached payment result"
            );
            return Ok(CheckoutResult {
                payment: cached.clone(),
                status: session.status(),
                reused: true,
            });
        }
        session.ensure_checkout_allowed(&now)?;

        let project = self.load_project(session.project_id()).await?;
        let provider = self
            .catalog
            .find_provider(session.project_id(), &cmd.provider)
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| SessionError::ProviderUnavailable(cmd.provider.clone()))?;
        let secrets = provider
            .secrets
            .decrypt_required(&provider.required_secret_fields, &self.cipher)?;

        if session.status() == SessionStatus::Opened {
            let won = self
                .sessions
                .transition_status(session.id(), SessionStatus::Opened, SessionStatus::Pending)
                .await?;
            if !won {
                return self.lost_checkout_race(&cmd, now).await;
            }
            session.mark_pending(now)?;
        }

        let redirects = cmd
            .redirects
            .or(session.redirects().clone())
            .or(RedirectUrls::new(
                project.default_success_url.clone(),
                project.default_failure_url.clone(),
            ))
            .resolve(
                &self.settings.default_success_url,
                &self.settings.default_failure_url,
            );

        let transaction = Transaction::pending(NewTransaction {
            project_id: *session.project_id(),
            provider: provider.code.clone(),
            session_id: Some(*session.id()),
            payer_id: Some(*session.payer_id()),
            amount: session.amount(),
            currency: session.currency().to_string(),
            client_reference: session.client_reference().map(str::to_string),
        });
        self.transactions.save(&transaction).await?;

        let payer_phone = self
            .payers
            .find_by_id(session.payer_id())
            .await?
            .map(|payer| payer.phone);

        let payment = self
            .initiate_upstream(&session, &transaction, secrets, payer_phone, redirects.clone())
            .await?;

        session.attach_payment(payment.clone(), redirects, now)?;
        if !self.sessions.update(&session, SessionStatus::Pending).await? {
            return self.settled_during_checkout(&session, &payment, now).await;
        }

        info!(
            session_id = %session.id(),
            provider = %provider.code,
            reference = %payment.reference,
            "Checkout initiated"
        );

        Ok(CheckoutResult {
            payment,
            status: session.status(),
            reused: false,
        })
    }

    async fn initiate_upstream(
        &self,
        session: &Session,
        transaction: &Transaction,
        secrets: DecryptedSecrets,
        payer_phone: Option<String>,
        redirects: ResolvedRedirects,
    ) -> Result<PaymentResult, SessionError> {
        let request = InitiationRequest {
            provider: transaction.provider().clone(),
            amount: transaction.amount(),
            currency: transaction.currency().to_string(),
            reference: transaction.reference().to_string(),
            payer_phone,
            secrets,
            redirects,
        };

        let attempt =
            tokio::time::timeout(self.settings.initiation_timeout, self.initiator.initiate(request))
                .await
                .unwrap_or_else(|_| {
                    Err(DomainError::new(
                        ErrorCode::UpstreamInitiationFailed,
                        "provider did not answer in time",
                    ))
                });

        let response = match attempt {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    reference = %transaction.reference(),
                    error = %e,
                    "Provider initiation failed"
                );
                self.transactions
                    .update_status(
                        transaction.reference(),
                        TransactionStatus::Failed,
                        Timestamp::now(),
                    )
                    .await?;
                return Err(SessionError::UpstreamInitiationFailed(e.message));
            }
        };

        self.transactions
            .record_provider_transaction_id(
                transaction.reference(),
                &response.provider_transaction_id,
            )
            .await?;

        Ok(PaymentResult {
            provider: transaction.provider().clone(),
            reference: transaction.reference().to_string(),
            provider_transaction_id: Some(response.provider_transaction_id),
            checkout_links: response.checkout_links,
            qr_code: response.qr_code,
            expires_at: response.expires_at.unwrap_or(*session.expires_at()),
        })
    }

    /// The session left `pending` while the provider was being called.
    ///
    /// The fresh charge no longer governs anything, so its transaction is
    /// failed and the stored status is reported.
    async fn settled_during_checkout(
        &self,
        session: &Session,
        payment: &PaymentResult,
        now: Timestamp,
    ) -> Result<CheckoutResult, SessionError> {
        warn!(
            session_id = %session.id(),
            reference = %payment.reference,
            "Session settled during checkout, abandoning new charge"
        );
        self.transactions
            .update_status(&payment.reference, TransactionStatus::Failed, now)
            .await?;

        let current = self
            .sessions
            .find_by_id(session.id())
            .await?
            .ok_or(SessionError::NotFound(*session.id()))?;
        current.ensure_checkout_allowed(&now)?;
        Err(SessionError::CheckoutInProgress(*session.id()))
    }

    /// Another writer moved the session to `pending` first.
    async fn lost_checkout_race(
        &self,
        cmd: &CheckoutCommand,
        now: Timestamp,
    ) -> Result<CheckoutResult, SessionError> {
        let session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .ok_or(SessionError::NotFound(cmd.session_id))?;

        match session.reusable_payment(&cmd.provider, &now) {
            Some(cached) => Ok(CheckoutResult {
                payment: cached.clone(),
                status: session.status(),
                reused: true,
            }),
            None => {
                warn!(session_id = %cmd.session_id, "Concurrent checkout already in progress");
                Err(SessionError::CheckoutInProgress(cmd.session_id))
            }
        }
    }

    async fn checkout_lock(&self, id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.checkout_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(*id).or_default().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wait
    // ─────────────────────────────────────────────────────────────────────────

    /// Polls until the session leaves `pending` or the wait timeout elapses.
    ///
    /// On timeout the answer is `opened` with no redirect. Dropping the
    /// future cancels the wait.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session does not exist
    pub async fn wait_status(&self, id: SessionId) -> Result<WaitStatusResult, SessionError> {
        let deadline = tokio::time::Instant::now() + self.settings.wait_timeout;

        loop {
            let session = self.load_fresh(&id, Timestamp::now()).await?;
            if session.status() != SessionStatus::Pending {
                return Ok(WaitStatusResult {
                    status: session.status(),
                    redirect_url: session.redirect_url().map(str::to_string),
                });
            }

            if tokio::time::Instant::now() + self.settings.wait_poll_interval > deadline {
                debug!(session_id = %id, "Wait timed out while pending");
                return Ok(WaitStatusResult {
                    status: SessionStatus::Opened,
                    redirect_url: None,
                });
            }
            tokio::time::sleep(self.settings.wait_poll_interval).await;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn load_project(&self, id: &ProjectId) -> Result<Project, SessionError> {
        self.catalog
            .find_project(id)
            .await?
            .ok_or(SessionError::ProjectNotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::initiator::MockPaymentInitiator;
    use crate::adapters::memory::{
        InMemoryPayerRepository, InMemoryProjectCatalog, InMemorySessionRepository,
        InMemoryTransactionRepository,
    };
    use crate::domain::cipher::KeyMaterial;
    use crate::domain::project::EncryptedSecretSet;
    use std::collections::BTreeMap;

    // ════════════════════════════════════════════════════════════════════════════
    // Fixture
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        service: Arc<SessionLifecycleService>,
        sessions: Arc<InMemorySessionRepository>,
        transactions: Arc<InMemoryTransactionRepository>,
        catalog: Arc<InMemoryProjectCatalog>,
        initiator: Arc<MockPaymentInitiator>,
        project: Project,
    }

    async fn fixture_with(settings: SessionSettings) -> Fixture {
        let cipher = Arc::new(CipherService::new(KeyMaterial::ephemeral()));
        let sessions = Arc::new(InMemorySessionRepository::new());
        let transactions = Arc::new(InMemoryTransactionRepository::new());
        let payers = Arc::new(InMemoryPayerRepository::new());
        let catalog = Arc::new(InMemoryProjectCatalog::new());
        let initiator = Arc::new(MockPaymentInitiator::new());

        let project = Project::new(ProjectId::new(), "Boutique").with_redirects(
            Some("https://shop.test/ok".to_string()),
            None,
        );
        catalog.add_project(project.clone()).await;

        let mut plain = BTreeMap::new();
        plain.insert("api_key".to_string(), "wave-api-key".to_string());
        let secrets = EncryptedSecretSet::new().merge_update(plain, &cipher).unwrap();
        catalog
            .add_provider(
                Provider::new(project.id, ProviderCode::new("wave").unwrap(), "Wave")
                    .with_secrets(vec!["api_key".to_string()], secrets),
            )
            .await;

        let service = Arc::new(SessionLifecycleService::new(
            sessions.clone(),
            transactions.clone(),
            payers,
            catalog.clone(),
            initiator.clone(),
            cipher,
            settings,
        ));

        Fixture {
            service,
            sessions,
            transactions,
            catalog,
            initiator,
            project,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(SessionSettings {
            checkout_base_url: "https://pay.test/checkout/".to_string(),
            wait_poll_interval: Duration::from_millis(10),
            wait_timeout: Duration::from_millis(50),
            ..SessionSettings::default()
        })
        .await
    }

    fn initiate_cmd(project_id: ProjectId) -> InitiateSessionCommand {
        InitiateSessionCommand {
            project_id,
            amount: 5000,
            currency: "xof".to_string(),
            description: Some("Order 42".to_string()),
            client_reference: Some("order-42".to_string()),
            payer: PayerDetails {
                phone: "+221 77 123 45 67".to_string(),
                name: Some("Awa".to_string()),
                email: None,
            },
            success_url: None,
            failure_url: None,
        }
    }

    fn checkout_cmd(session_id: SessionId, provider: &str) -> CheckoutCommand {
        CheckoutCommand {
            session_id,
            provider: ProviderCode::new(provider).unwrap(),
            redirects: RedirectUrls::default(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Initiate
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn initiate_opens_session_without_contacting_provider() {
        let fx = fixture().await;

        let result = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        assert_eq!(result.status, SessionStatus::Opened);
        assert_eq!(
            result.checkout_url,
            format!("https://pay.test/checkout/{}", result.session_id)
        );
        assert_eq!(fx.initiator.call_count().await, 0);

        let stored = fx.sessions.find_by_id(&result.session_id).await.unwrap().unwrap();
        assert_eq!(stored.currency(), "XOF");
        assert_eq!(stored.amount(), 5000);
    }

    #[tokio::test]
    async fn initiate_rejects_unknown_project() {
        let fx = fixture().await;

        let err = fx.service.initiate(initiate_cmd(ProjectId::new())).await.unwrap_err();

        assert!(matches!(err, SessionError::ProjectNotFound(_)));
    }

    #[tokio::test]
    async fn initiate_requires_an_active_provider() {
        let fx = fixture().await;
        fx.catalog
            .add_provider(
                Provider::new(fx.project.id, ProviderCode::new("wave").unwrap(), "Wave")
                    .deactivated(),
            )
            .await;

        let err = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap_err();

        assert_eq!(err, SessionError::NoActiveProvider);
    }

    #[tokio::test]
    async fn initiate_rejects_malformed_phone() {
        let fx = fixture().await;
        let mut cmd = initiate_cmd(fx.project.id);
        cmd.payer.phone = "call me".to_string();

        let err = fx.service.initiate(cmd).await.unwrap_err();

        assert!(matches!(err, SessionError::ValidationFailed { .. }));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Get
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn get_session_attaches_active_providers() {
        let fx = fixture().await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let view = fx
            .service
            .get_session(GetSessionQuery {
                session_id: opened.session_id,
                include_expired: false,
            })
            .await
            .unwrap();

        assert_eq!(view.providers.len(), 1);
        assert_eq!(view.providers[0].code.as_str(), "wave");
    }

    #[tokio::test]
    async fn expired_session_is_hidden_unless_requested() {
        let fx = fixture_with(SessionSettings {
            ttl_minutes: -1,
            ..SessionSettings::default()
        })
        .await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let hidden = fx
            .service
            .get_session(GetSessionQuery {
                session_id: opened.session_id,
                include_expired: false,
            })
            .await
            .unwrap_err();
        assert_eq!(hidden, SessionError::NotFound(opened.session_id));

        let view = fx
            .service
            .get_session(GetSessionQuery {
                session_id: opened.session_id,
                include_expired: true,
            })
            .await
            .unwrap();
        assert_eq!(view.session.status(), SessionStatus::Expired);

        let stored = fx.sessions.find_by_id(&opened.session_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), SessionStatus::Expired);
    }

    #[tokio::test]
    async fn stale_payment_cache_is_cleared_on_read() {
        let fx = fixture().await;
        fx.initiator.set_link_ttl_minutes(-1).await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();
        fx.service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();

        let view = fx
            .service
            .get_session(GetSessionQuery {
                session_id: opened.session_id,
                include_expired: false,
            })
            .await
            .unwrap();

        assert!(view.session.payment().is_none());
        let stored = fx.sessions.find_by_id(&opened.session_id).await.unwrap().unwrap();
        assert!(stored.payment().is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_initiates_charge_and_moves_to_pending() {
        let fx = fixture().await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let result = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();

        assert_eq!(result.status, SessionStatus::Pending);
        assert!(!result.reused);
        assert!(result.payment.checkout_url().is_some());

        let transactions = fx.transactions.all().await;
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].status(), TransactionStatus::Pending);
        assert_eq!(transactions[0].session_id(), Some(&opened.session_id));
        assert_eq!(
            transactions[0].provider_transaction_id(),
            result.payment.provider_transaction_id.as_deref()
        );

        let calls = fx.initiator.calls().await;
        assert_eq!(calls[0].secret_fields, 1);
        assert_eq!(calls[0].currency, "XOF");
    }

    #[tokio::test]
    async fn repeated_checkout_reuses_cached_result() {
        let fx = fixture().await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let first = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();
        let second = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();

        assert_eq!(first.payment, second.payment);
        assert!(second.reused);
        assert_eq!(fx.initiator.call_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_checkouts_start_one_charge() {
        let fx = fixture().await;
        fx.initiator.set_delay(Duration::from_millis(30)).await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let a = {
            let service = fx.service.clone();
            tokio::spawn(async move { service.checkout(checkout_cmd(opened.session_id, "wave")).await })
        };
        let b = {
            let service = fx.service.clone();
            tokio::spawn(async move { service.checkout(checkout_cmd(opened.session_id, "wave")).await })
        };

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        assert_eq!(a.payment, b.payment);
        assert_eq!(fx.initiator.call_count().await, 1);
        assert_eq!(fx.transactions.all().await.len(), 1);
    }

    #[tokio::test]
    async fn losing_the_conditional_write_reports_checkout_in_progress() {
        let fx = fixture().await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();
        // Another process won opened -> pending but has not cached a result yet.
        fx.sessions
            .transition_status(&opened.session_id, SessionStatus::Opened, SessionStatus::Pending)
            .await
            .unwrap();

        let err = fx
            .service
            .lost_checkout_race(&checkout_cmd(opened.session_id, "wave"), Timestamp::now())
            .await
            .unwrap_err();

        assert_eq!(err, SessionError::CheckoutInProgress(opened.session_id));
        assert_eq!(fx.initiator.call_count().await, 0);
    }

    #[tokio::test]
    async fn switching_provider_starts_a_new_charge() {
        let fx = fixture().await;
        fx.catalog
            .add_provider(Provider::new(
                fx.project.id,
                ProviderCode::new("orange_money").unwrap(),
                "Orange Money",
            ))
            .await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let wave = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();
        let orange = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "orange_money"))
            .await
            .unwrap();

        assert_ne!(wave.payment.reference, orange.payment.reference);
        assert_eq!(orange.status, SessionStatus::Pending);
        assert_eq!(fx.initiator.call_count().await, 2);
    }

    #[tokio::test]
    async fn redirects_follow_precedence() {
        let fx = fixture().await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        fx.service
            .checkout(CheckoutCommand {
                session_id: opened.session_id,
                provider: ProviderCode::new("wave").unwrap(),
                redirects: RedirectUrls::new(None, Some("https://override.test/ko".to_string())),
            })
            .await
            .unwrap();

        let calls = fx.initiator.calls().await;
        assert_eq!(calls[0].success_url, "https://shop.test/ok");
        assert_eq!(calls[0].failure_url, "https://override.test/ko");
    }

    #[tokio::test]
    async fn later_checkout_resolves_current_project_defaults() {
        let fx = fixture().await;
        fx.catalog
            .add_provider(Provider::new(
                fx.project.id,
                ProviderCode::new("orange_money").unwrap(),
                "Orange Money",
            ))
            .await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();
        fx.service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();

        fx.catalog
            .add_project(fx.project.clone().with_redirects(
                Some("https://shop.test/merci".to_string()),
                Some("https://shop.test/echec".to_string()),
            ))
            .await;
        fx.service
            .checkout(checkout_cmd(opened.session_id, "orange_money"))
            .await
            .unwrap();

        let calls = fx.initiator.calls().await;
        assert_eq!(calls[0].success_url, "https://shop.test/ok");
        assert_eq!(calls[1].success_url, "https://shop.test/merci");
        assert_eq!(calls[1].failure_url, "https://shop.test/echec");
        let stored = fx.sessions.find_by_id(&opened.session_id).await.unwrap().unwrap();
        assert_eq!(stored.redirects(), &RedirectUrls::default());
        assert_eq!(
            stored.resolved_redirects().map(|r| r.success_url.as_str()),
            Some("https://shop.test/merci")
        );
    }

    #[tokio::test]
    async fn session_settled_during_provider_call_is_not_reopened() {
        let fx = fixture().await;
        fx.catalog
            .add_provider(Provider::new(
                fx.project.id,
                ProviderCode::new("orange_money").unwrap(),
                "Orange Money",
            ))
            .await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();
        fx.service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();
        fx.initiator.set_delay(Duration::from_millis(200)).await;

        let switching = {
            let service = fx.service.clone();
            tokio::spawn(async move {
                service
                    .checkout(checkout_cmd(opened.session_id, "orange_money"))
                    .await
            })
        };

        // The wave charge succeeds while orange is still being contacted.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut settled = fx.sessions.find_by_id(&opened.session_id).await.unwrap().unwrap();
        settled.apply_outcome(SessionStatus::Closed, Timestamp::now()).unwrap();
        assert!(fx.sessions.update(&settled, SessionStatus::Pending).await.unwrap());

        let err = switching.await.unwrap().unwrap_err();

        assert!(matches!(err, SessionError::InvalidState(_)));
        let stored = fx.sessions.find_by_id(&opened.session_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), SessionStatus::Closed);
        let orange = fx
            .transactions
            .all()
            .await
            .into_iter()
            .find(|tx| tx.provider().as_str() == "orange_money")
            .unwrap();
        assert_eq!(orange.status(), TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn checkout_on_expired_session_fails() {
        let fx = fixture_with(SessionSettings {
            ttl_minutes: -1,
            ..SessionSettings::default()
        })
        .await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let err = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap_err();

        assert_eq!(err, SessionError::Expired(opened.session_id));
        assert_eq!(fx.initiator.call_count().await, 0);
    }

    #[tokio::test]
    async fn checkout_with_unknown_provider_fails() {
        let fx = fixture().await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let err = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "mtn"))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn missing_required_secret_fails_before_any_charge() {
        let fx = fixture().await;
        fx.catalog
            .add_provider(
                Provider::new(fx.project.id, ProviderCode::new("wave").unwrap(), "Wave")
                    .with_secrets(
                        vec!["api_key".to_string(), "merchant_id".to_string()],
                        EncryptedSecretSet::new(),
                    ),
            )
            .await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let err = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SessionError::validation("api_key", "Provider secret 'api_key' is not configured")
        );
        let stored = fx.sessions.find_by_id(&opened.session_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), SessionStatus::Opened);
        assert_eq!(fx.initiator.call_count().await, 0);
    }

    #[tokio::test]
    async fn upstream_failure_fails_the_transaction() {
        let fx = fixture().await;
        fx.initiator.fail_next("wave unavailable").await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let err = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SessionError::UpstreamInitiationFailed("wave unavailable".to_string())
        );
        let transactions = fx.transactions.all().await;
        assert_eq!(transactions[0].status(), TransactionStatus::Failed);

        // The session stays pending and a retry goes upstream again.
        let retry = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();
        assert!(!retry.reused);
        assert_eq!(fx.initiator.call_count().await, 2);
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_upstream_failure() {
        let fx = fixture_with(SessionSettings {
            initiation_timeout: Duration::from_millis(20),
            ..SessionSettings::default()
        })
        .await;
        fx.initiator.set_delay(Duration::from_millis(200)).await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let err = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::UpstreamInitiationFailed(_)));
        let transactions = fx.transactions.all().await;
        assert_eq!(transactions[0].status(), TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn tampered_secret_surfaces_cipher_error() {
        let fx = fixture().await;
        let other = CipherService::new(KeyMaterial::ephemeral());
        let mut plain = BTreeMap::new();
        plain.insert("api_key".to_string(), "k".to_string());
        let foreign = EncryptedSecretSet::new().merge_update(plain, &other).unwrap();
        fx.catalog
            .add_provider(
                Provider::new(fx.project.id, ProviderCode::new("wave").unwrap(), "Wave")
                    .with_secrets(vec!["api_key".to_string()], foreign),
            )
            .await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let err = fx
            .service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Cipher(_)));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Wait
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn wait_returns_immediately_for_opened_session() {
        let fx = fixture().await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();

        let result = fx.service.wait_status(opened.session_id).await.unwrap();

        assert_eq!(result.status, SessionStatus::Opened);
        assert_eq!(result.redirect_url, None);
    }

    #[tokio::test]
    async fn wait_times_out_as_opened_while_pending() {
        let fx = fixture().await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();
        fx.service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();

        let result = fx.service.wait_status(opened.session_id).await.unwrap();

        assert_eq!(
            result,
            WaitStatusResult {
                status: SessionStatus::Opened,
                redirect_url: None,
            }
        );
    }

    #[tokio::test]
    async fn wait_observes_terminal_status() {
        let fx = fixture_with(SessionSettings {
            wait_poll_interval: Duration::from_millis(10),
            wait_timeout: Duration::from_secs(2),
            ..SessionSettings::default()
        })
        .await;
        let opened = fx.service.initiate(initiate_cmd(fx.project.id)).await.unwrap();
        fx.service
            .checkout(checkout_cmd(opened.session_id, "wave"))
            .await
            .unwrap();

        let sessions = fx.sessions.clone();
        let id = opened.session_id;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let mut session = sessions.find_by_id(&id).await.unwrap().unwrap();
            session.apply_outcome(SessionStatus::Closed, Timestamp::now()).unwrap();
            assert!(sessions.update(&session, SessionStatus::Pending).await.unwrap());
        });

        let result = fx.service.wait_status(opened.session_id).await.unwrap();

        assert_eq!(result.status, SessionStatus::Closed);
        assert_eq!(result.redirect_url.as_deref(), Some("https://shop.test/ok"));
    }

    #[tokio::test]
    async fn wait_on_missing_session_is_not_found() {
        let fx = fixture().await;
        let id = SessionId::new();

        let err = fx.service.wait_status(id).await.unwrap_err();

        assert_eq!(err, SessionError::NotFound(id));
    }
}
