//! WebhookProcessingService - Inbound provider callbacks and outbound merchant notifications.
//!
//! Inbound: authenticate, map to `{reference, status}`, resolve the
//! transaction at most once, cascade onto the session.
//! Outbound: fan the resolved transaction out to every active endpoint of
//! the owning project.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::cipher::CipherService;
use crate::domain::foundation::{ProviderCode, Timestamp, TransactionStatus};
use crate::domain::notification::EventEnvelope;
use crate::domain::project::{Provider, ProviderSummary};
use crate::domain::transaction::Transaction;
use crate::domain::webhook::{
    CallbackMapper, CanonicalCallback, ValidatorFactory, WebhookError, WebhookRequest,
};
use crate::ports::{
    PayerRepository, ProjectCatalog, SessionRepository, TransactionRepository,
    WebhookEndpointRepository, WebhookNotifier,
};

/// Result of an inbound callback. Every variant is acknowledged to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Transaction moved out of `PENDING`.
    Processed {
        reference: String,
        status: TransactionStatus,
    },
    /// Transaction was already resolved; duplicate delivery.
    AlreadyProcessed {
        reference: String,
        status: TransactionStatus,
    },
    /// Authenticated, but nothing to do.
    Ignored { reason: String },
}

/// How outbound notifications are run after a transaction resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Spawned onto the runtime; the inbound response does not wait.
    Background,
    /// Awaited before `handle_inbound` returns.
    Inline,
}

// ════════════════════════════════════════════════════════════════════════════════
// Outbound
// ════════════════════════════════════════════════════════════════════════════════

/// Delivers resolved-transaction events to merchant endpoints.
#[derive(Clone)]
pub struct OutboundDispatcher {
    catalog: Arc<dyn ProjectCatalog>,
    payers: Arc<dyn PayerRepository>,
    endpoints: Arc<dyn WebhookEndpointRepository>,
    notifier: Arc<dyn WebhookNotifier>,
    cipher: Arc<CipherService>,
}

impl OutboundDispatcher {
    pub fn new(
        catalog: Arc<dyn ProjectCatalog>,
        payers: Arc<dyn PayerRepository>,
        endpoints: Arc<dyn WebhookEndpointRepository>,
        notifier: Arc<dyn WebhookNotifier>,
        cipher: Arc<CipherService>,
    ) -> Self {
        Self {
            catalog,
            payers,
            endpoints,
            notifier,
            cipher,
        }
    }

    /// Notifies every active endpoint of the transaction's project concurrently.
    ///
    /// Failures are logged per endpoint and never propagate. Returns the
    /// number of successful deliveries.
    pub async fn dispatch(&self, transaction: Transaction, provider: ProviderSummary) -> usize {
        let reference = transaction.reference().to_string();
        let project_id = *transaction.project_id();

        let project = match self.catalog.find_project(&project_id).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                warn!(reference = %reference, project_id = %project_id, "Project vanished, skipping notifications");
                return 0;
            }
            Err(e) => {
                warn!(reference = %reference, error = %e, "Failed to load project for notifications");
                return 0;
            }
        };

        let endpoints = match self.endpoints.find_active_by_project(&project_id).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                warn!(reference = %reference, error = %e, "Failed to load webhook endpoints");
                return 0;
            }
        };
        if endpoints.is_empty() {
            debug!(reference = %reference, "No webhook endpoints configured");
            return 0;
        }

        let payer = match transaction.payer_id() {
            Some(id) => self.payers.find_by_id(id).await.unwrap_or_else(|e| {
                warn!(reference = %reference, error = %e, "Failed to load payer for event");
                None
            }),
            None => None,
        };

        let envelope = EventEnvelope::transaction_resolved(transaction, payer, provider, &project);
        let envelope = &envelope;

        let deliveries = endpoints.iter().map(|endpoint| async move {
            let secret = match endpoint.secret.as_ref().map(|blob| self.cipher.decrypt(blob)) {
                Some(Ok(secret)) => Some(secret),
                Some(Err(e)) => {
                    warn!(endpoint = %endpoint.url, error = %e, "Endpoint secret cannot be decrypted, skipping");
                    return false;
                }
                None => None,
            };

            match self.notifier.notify(endpoint, secret.as_ref(), envelope).await {
                Ok(status) => {
                    debug!(endpoint = %endpoint.url, status, "Webhook delivered");
                    true
                }
                Err(e) => {
                    warn!(endpoint = %endpoint.url, error = %e, "Webhook delivery failed");
                    false
                }
            }
        });

        let delivered = join_all(deliveries).await.into_iter().filter(|ok| *ok).count();
        info!(
            reference = %reference,
            event = %envelope.event_type,
            delivered,
            attempted = endpoints.len(),
            "Outbound notifications sent"
        );
        delivered
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Inbound
// ════════════════════════════════════════════════════════════════════════════════

/// Processes provider callbacks.
pub struct WebhookProcessingService {
    catalog: Arc<dyn ProjectCatalog>,
    transactions: Arc<dyn TransactionRepository>,
    sessions: Arc<dyn SessionRepository>,
    validators: ValidatorFactory,
    dispatcher: OutboundDispatcher,
    mode: DispatchMode,
}

impl WebhookProcessingService {
    pub fn new(
        catalog: Arc<dyn ProjectCatalog>,
        transactions: Arc<dyn TransactionRepository>,
        sessions: Arc<dyn SessionRepository>,
        validators: ValidatorFactory,
        dispatcher: OutboundDispatcher,
    ) -> Self {
        Self {
            catalog,
            transactions,
            sessions,
            validators,
            dispatcher,
            mode: DispatchMode::Background,
        }
    }

    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Handles one callback addressed to `/webhook/{provider_code}`.
    ///
    /// # Errors
    ///
    /// - `UnknownProvider` if no active provider with a webhook config uses the code
    /// - `InvalidSignature` if no candidate provider accepts the request
    /// - `ParseError` if the authenticated payload cannot be mapped
    /// - `Cipher` / `Database` for infrastructure failures
    pub async fn handle_inbound(
        &self,
        provider_code: &str,
        request: &WebhookRequest,
    ) -> Result<WebhookOutcome, WebhookError> {
        let code = ProviderCode::new(provider_code)
            .map_err(|_| WebhookError::UnknownProvider(provider_code.to_string()))?;

        let provider = self.authenticate(&code, request).await?;

        let callback = match provider.callback_mapping.map(request.body()) {
            Ok(callback) => callback,
            Err(WebhookError::Ignored(reason)) => {
                debug!(provider = %code, reason = %reason, "Callback ignored");
                return Ok(WebhookOutcome::Ignored { reason });
            }
            Err(e) => return Err(e),
        };

        self.resolve(&provider, callback).await
    }

    /// Finds the provider registered under `code` that accepts the request.
    async fn authenticate(
        &self,
        code: &ProviderCode,
        request: &WebhookRequest,
    ) -> Result<Provider, WebhookError> {
        let candidates: Vec<Provider> = self
            .catalog
            .providers_by_code(code)
            .await?
            .into_iter()
            .filter(|p| p.active && p.webhook.is_some())
            .collect();

        if candidates.is_empty() {
            warn!(provider = %code, "Webhook for unknown provider");
            return Err(WebhookError::UnknownProvider(code.to_string()));
        }

        // A broken credential fails closed for its own project only.
        let mut first_error = None;
        for provider in candidates {
            let Some(config) = provider.webhook.as_ref() else {
                continue;
            };
            let validator = self.validators.for_kind(config.auth_kind);
            match validator.try_validate(request, config) {
                Ok(true) => {
                    debug!(provider = %code, project_id = %provider.project_id, "Webhook authenticated");
                    return Ok(provider);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        provider = %code,
                        project_id = %provider.project_id,
                        error = %e,
                        "Webhook validator failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                warn!(provider = %code, "Webhook signature rejected");
                Err(WebhookError::InvalidSignature)
            }
        }
    }

    async fn resolve(
        &self,
        provider: &Provider,
        callback: CanonicalCallback,
    ) -> Result<WebhookOutcome, WebhookError> {
        let CanonicalCallback { reference, status } = callback;

        let Some(mut transaction) = self.transactions.find_by_reference(&reference).await? else {
            info!(reference = %reference, provider = %provider.code, "Callback for unknown reference");
            return Ok(WebhookOutcome::Ignored {
                reason: format!("unknown reference {}", reference),
            });
        };

        if transaction.project_id() != &provider.project_id || transaction.provider() != &provider.code {
            warn!(
                reference = %reference,
                provider = %provider.code,
                "Callback reference belongs to another project or provider"
            );
            return Ok(WebhookOutcome::Ignored {
                reason: format!("reference {} does not belong to this provider", reference),
            });
        }

        if transaction.status() != TransactionStatus::Pending {
            debug!(reference = %reference, status = %transaction.status(), "Duplicate callback");
            return Ok(WebhookOutcome::AlreadyProcessed {
                reference,
                status: transaction.status(),
            });
        }

        let now = Timestamp::now();
        if !self.transactions.update_status(&reference, status, now).await? {
            // Another delivery resolved it between our read and write.
            let current = self
                .transactions
                .find_by_reference(&reference)
                .await?
                .map(|t| t.status())
                .unwrap_or(status);
            debug!(reference = %reference, "Callback lost resolution race");
            return Ok(WebhookOutcome::AlreadyProcessed {
                reference,
                status: current,
            });
        }
        transaction.resolve(status, now)?;

        info!(reference = %reference, provider = %provider.code, status = %status, "Transaction resolved");

        self.cascade_to_session(&transaction, now).await?;
        self.notify(transaction, provider.summary()).await;

        Ok(WebhookOutcome::Processed { reference, status })
    }

    async fn cascade_to_session(
        &self,
        transaction: &Transaction,
        now: Timestamp,
    ) -> Result<(), WebhookError> {
        let (Some(session_id), Some(outcome)) =
            (transaction.session_id(), transaction.status().session_outcome())
        else {
            return Ok(());
        };

        loop {
            let Some(mut session) = self.sessions.find_by_id(session_id).await? else {
                warn!(reference = %transaction.reference(), session_id = %session_id, "Linked session missing");
                return Ok(());
            };

            if !session.is_governed_by(transaction.reference(), outcome) {
                info!(
                    session_id = %session_id,
                    reference = %transaction.reference(),
                    status = %outcome,
                    "Outcome of a superseded charge, session left unchanged"
                );
                return Ok(());
            }

            let observed = session.status();
            match session.apply_outcome(outcome, now) {
                Ok(true) => {
                    if self.sessions.update(&session, observed).await? {
                        info!(session_id = %session_id, status = %outcome, "Session resolved");
                        return Ok(());
                    }
                    debug!(session_id = %session_id, %observed, "Session changed during cascade, reloading");
                }
                Ok(false) => {
                    debug!(session_id = %session_id, status = %session.status(), "Session already terminal");
                    return Ok(());
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Session outcome not applicable");
                    return Ok(());
                }
            }
        }
    }

    async fn notify(&self, transaction: Transaction, provider: ProviderSummary) {
        match self.mode {
            DispatchMode::Inline => {
                self.dispatcher.dispatch(transaction, provider).await;
            }
            DispatchMode::Background => {
                let dispatcher = self.dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.dispatch(transaction, provider).await;
                });
            }
        }
    }
}
