//! Request/response boundary towards the rendering layer.
//!
//! Every inbound request produces exactly one outbound event; failures are
//! turned into user-facing messages here and never propagate further.

use ab_api_types::{BridgeEvent, BridgeRequest};
use ab_chain_client::WalletProvider;
use ab_network_registry::NetworkRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::flow::{FlowConfig, TransactionFlow};
use crate::session::WalletSession;
use crate::snapshot::load_snapshot;
use crate::{FlowError, TransactionOutcome};

pub const NO_ACCOUNT_MESSAGE: &str = "No account detected for this network.";
pub const APPROVAL_FAILED_MESSAGE: &str = "Token approval failed.";
pub const BUSY_MESSAGE: &str = "Another wallet action is still in progress.";

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub flow: FlowConfig,
    /// How often to poll the wallet for a network switch. `None` disables
    /// the watcher; switches are then noticed on the next request.
    pub network_poll_interval: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            flow: FlowConfig::default(),
            network_poll_interval: Some(Duration::from_secs(4)),
        }
    }
}

pub struct Bridge {
    provider: Arc<dyn WalletProvider>,
    registry: Arc<NetworkRegistry>,
    flow: TransactionFlow,
    network_poll_interval: Option<Duration>,
    session: RwLock<Option<Arc<WalletSession>>>,
}

impl Bridge {
    pub fn new(provider: Arc<dyn WalletProvider>, registry: Arc<NetworkRegistry>, config: BridgeConfig) -> Self {
        Self {
            flow: TransactionFlow::new(registry.clone(), config.flow),
            provider,
            registry,
            network_poll_interval: config.network_poll_interval,
            session: RwLock::new(None),
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub async fn handle(&self, request: BridgeRequest) -> BridgeEvent {
        match request {
            BridgeRequest::AccountRequested => self.request_account().await,
            BridgeRequest::ApproveRequested(quantity) => self.request_approve(&quantity).await,
            BridgeRequest::MintRequested(quantity) => self.request_mint(&quantity).await,
        }
    }

    pub async fn active_session(&self) -> Option<Arc<WalletSession>> {
        self.session
            .read()
            .await
            .as_ref()
            .filter(|session| session.is_active())
            .cloned()
    }

    pub async fn request_account(&self) -> BridgeEvent {
        let session = match self.connect().await {
            Ok(session) => session,
            Err(err) => {
                warn!("account request failed: {}", err);
                return BridgeEvent::AccountFailed(NO_ACCOUNT_MESSAGE.to_owned());
            }
        };

        let Ok(network) = self.registry.lookup(session.chain_id()) else {
            return BridgeEvent::AccountFailed(format!(
                "This network is not supported by this app. Please switch to a supported network: {}",
                self.registry.network_names().join(",")
            ));
        };

        match load_snapshot(&session, network).await {
            Ok(snapshot) => {
                info!(session = %session.id(), network = %snapshot.network, "wallet snapshot loaded");
                BridgeEvent::AccountSucceeded(snapshot)
            }
            Err(err) => {
                warn!(session = %session.id(), "failed to load wallet snapshot: {}", err);
                BridgeEvent::AccountFailed(NO_ACCOUNT_MESSAGE.to_owned())
            }
        }
    }

    pub async fn request_approve(&self, quantity: &str) -> BridgeEvent {
        let outcome = match self.session().await {
            Ok(session) => self.flow.approve_allowance(&session, quantity).await,
            Err(err) => TransactionOutcome::Failure(err),
        };

        match outcome {
            TransactionOutcome::Success(_) => BridgeEvent::ApproveSucceeded,
            TransactionOutcome::Failure(err) => match err {
                FlowError::UnsupportedNetwork { .. } | FlowError::SessionInvalidated { .. } => {
                    BridgeEvent::NetworkError(err.to_string())
                }
                FlowError::Busy => BridgeEvent::ApproveFailed(BUSY_MESSAGE.to_owned()),
                FlowError::InvalidQuantity(_) => BridgeEvent::ApproveFailed(err.to_string()),
                _ => BridgeEvent::ApproveFailed(APPROVAL_FAILED_MESSAGE.to_owned()),
            },
        }
    }

    pub async fn request_mint(&self, quantity: &str) -> BridgeEvent {
        let outcome = match self.session().await {
            Ok(session) => self.flow.mint_multiple(&session, quantity).await,
            Err(err) => TransactionOutcome::Failure(err),
        };

        match outcome {
            TransactionOutcome::Success(receipt) => BridgeEvent::MintSucceeded(receipt.explorer_url),
            TransactionOutcome::Failure(
                err @ (FlowError::UnsupportedNetwork { .. } | FlowError::SessionInvalidated { .. }),
            ) => BridgeEvent::NetworkError(err.to_string()),
            TransactionOutcome::Failure(_) => BridgeEvent::MintFailed,
        }
    }

    /// The current session if it is still on the chain it connected on,
    /// otherwise a freshly connected one.
    async fn session(&self) -> Result<Arc<WalletSession>, FlowError> {
        if let Some(session) = self.active_session().await {
            session.current_chain_id().await?;
            if session.is_active() {
                return Ok(session);
            }
            info!(session = %session.id(), "reconnecting after network change");
        }
        self.connect().await
    }

    /// Connects to the wallet. An active session for the same account and
    /// chain is kept, so its in-flight action stays guarded.
    async fn connect(&self) -> Result<Arc<WalletSession>, FlowError> {
        let fresh = WalletSession::connect(self.provider.clone()).await?;

        let mut slot = self.session.write().await;
        if let Some(current) = slot.as_ref() {
            if current.address() == fresh.address() && current.observe_chain(fresh.chain_id()) {
                info!(session = %current.id(), "wallet unchanged; keeping session");
                return Ok(current.clone());
            }
        }

        let session = Arc::new(fresh);
        if let Some(interval) = self.network_poll_interval {
            session.watch_network(interval);
        }
        *slot = Some(session.clone());
        Ok(session)
    }
}
