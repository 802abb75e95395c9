//! A connected wallet account and the chain it was connected on.
//!
//! A session is bound to one chain for its whole life. When the provider
//! reports a different chain the session is invalidated, never repointed:
//! contract addresses are per-chain and a stale session must not be reused.
//! Callers watch [`WalletSession::invalidated`] or check
//! [`WalletSession::ensure_active`] and connect a fresh session.

use ab_api_types::{ChainId, WalletAddress};
use ab_chain_client::{Address, WalletProvider};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Invalidated { from: ChainId, to: ChainId },
}

pub struct WalletSession {
    id: Uuid,
    address: Address,
    chain_id: ChainId,
    provider: Arc<dyn WalletProvider>,
    state: watch::Sender<SessionState>,
    in_flight: Mutex<()>,
    watcher: StdMutex<Option<JoinHandle<()>>>,
}

impl WalletSession {
    /// Asks the wallet for account access and records the active chain.
    pub async fn connect(provider: Arc<dyn WalletProvider>) -> Result<Self, FlowError> {
        let accounts = provider.request_accounts().await?;
        let Some(address) = accounts.first().copied() else {
            return Err(FlowError::UnknownAccount("wallet returned no accounts".to_owned()));
        };
        let chain_id = provider.chain_id().await?;

        let (state, _) = watch::channel(SessionState::Active);
        let session = Self {
            id: Uuid::new_v4(),
            address,
            chain_id,
            provider,
            state,
            in_flight: Mutex::new(()),
            watcher: StdMutex::new(None),
        };
        info!(session = %session.id, address = %session.wallet_address(), chain = %chain_id, "wallet connected");
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Checksummed form of the account address.
    pub fn wallet_address(&self) -> WalletAddress {
        WalletAddress(ethers::utils::to_checksum(&self.address, None))
    }

    /// The chain the session was connected on.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn provider(&self) -> Arc<dyn WalletProvider> {
        self.provider.clone()
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn ensure_active(&self) -> Result<(), FlowError> {
        match self.state() {
            SessionState::Active => Ok(()),
            SessionState::Invalidated { from, to } => Err(FlowError::SessionInvalidated { from, to }),
        }
    }

    /// Receives the state change when the session is invalidated.
    pub fn invalidated(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolves once the session is invalidated, with the matching error.
    pub async fn until_invalidated(&self) -> FlowError {
        let mut state = self.state.subscribe();
        loop {
            if let SessionState::Invalidated { from, to } = *state.borrow_and_update() {
                return FlowError::SessionInvalidated { from, to };
            }
            if state.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Reads the chain id from the provider, invalidating on a switch.
    pub async fn current_chain_id(&self) -> Result<ChainId, FlowError> {
        let chain_id = self.provider.chain_id().await?;
        self.observe_chain(chain_id);
        Ok(chain_id)
    }

    /// Feeds a chain id reported by the provider. Returns whether the
    /// session is still usable.
    pub fn observe_chain(&self, chain_id: ChainId) -> bool {
        if chain_id == self.chain_id {
            return self.is_active();
        }

        let from = self.chain_id;
        let changed = self.state.send_if_modified(|state| {
            if *state == SessionState::Active {
                *state = SessionState::Invalidated { from, to: chain_id };
                true
            } else {
                false
            }
        });
        if changed {
            warn!(session = %self.id, %from, to = %chain_id, "network changed; session invalidated");
        }
        false
    }

    /// Claims the session's single action slot. Concurrent approve/mint
    /// requests are rejected rather than queued.
    pub fn begin_action(&self) -> Result<MutexGuard<'_, ()>, FlowError> {
        self.in_flight.try_lock().map_err(|_| FlowError::Busy)
    }

    /// Polls the provider's chain id until the session is dropped or
    /// invalidated.
    pub fn watch_network(self: &Arc<Self>, interval: Duration) {
        let session: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(session) = session.upgrade() else {
                    break;
                };
                match session.provider.chain_id().await {
                    Ok(chain_id) => {
                        if !session.observe_chain(chain_id) {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(session = %session.id, "failed to poll chain id: {}", err);
                    }
                }
            }
        });

        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(previous) = watcher.replace(handle) {
                previous.abort();
            }
        }
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        if let Ok(watcher) = self.watcher.get_mut() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_chain_client::memory::InMemoryProvider;

    fn owner() -> Address {
        "0x1000000000000000000000000000000000000001".parse().expect("valid address literal")
    }

    #[tokio::test]
    async fn connect_records_account_and_chain() -> anyhow::Result<()> {
        let provider = Arc::new(InMemoryProvider::new(ChainId(11_155_111)).with_account(owner()));
        let session = WalletSession::connect(provider).await?;

        assert_eq!(session.address(), owner());
        assert_eq!(session.chain_id(), ChainId(11_155_111));
        assert!(session.is_active());
        Ok(())
    }

    #[tokio::test]
    async fn connect_failures_are_classified() {
        let unavailable = Arc::new(InMemoryProvider::new(ChainId(97)).unavailable());
        assert!(matches!(
            WalletSession::connect(unavailable).await,
            Err(FlowError::ProviderUnavailable(_))
        ));

        let rejecting = Arc::new(InMemoryProvider::new(ChainId(97)).with_account(owner()).rejecting_requests());
        assert!(matches!(
            WalletSession::connect(rejecting).await,
            Err(FlowError::UserRejected)
        ));

        let empty = Arc::new(InMemoryProvider::new(ChainId(97)));
        assert!(matches!(
            WalletSession::connect(empty).await,
            Err(FlowError::UnknownAccount(_))
        ));
    }

    #[tokio::test]
    async fn chain_switch_invalidates_once_and_for_good() -> anyhow::Result<()> {
        let provider = Arc::new(InMemoryProvider::new(ChainId(97)).with_account(owner()));
        let session = WalletSession::connect(provider.clone()).await?;
        let mut changes = session.invalidated();

        assert!(session.observe_chain(ChainId(97)));
        provider.set_chain_id(ChainId(11_155_111)).await;
        assert_eq!(session.current_chain_id().await?, ChainId(11_155_111));

        changes.changed().await?;
        assert_eq!(
            *changes.borrow(),
            SessionState::Invalidated {
                from: ChainId(97),
                to: ChainId(11_155_111)
            }
        );

        // Switching back does not revive it.
        assert!(!session.observe_chain(ChainId(97)));
        assert!(matches!(
            session.ensure_active(),
            Err(FlowError::SessionInvalidated { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn watcher_notices_network_change() -> anyhow::Result<()> {
        let provider = Arc::new(InMemoryProvider::new(ChainId(97)).with_account(owner()));
        let session = Arc::new(WalletSession::connect(provider.clone()).await?);
        let mut changes = session.invalidated();
        session.watch_network(Duration::from_millis(5));

        provider.set_chain_id(ChainId(1)).await;
        tokio::time::timeout(Duration::from_secs(5), changes.changed()).await??;

        assert!(!session.is_active());
        Ok(())
    }

    #[tokio::test]
    async fn only_one_action_at_a_time() -> anyhow::Result<()> {
        let provider = Arc::new(InMemoryProvider::new(ChainId(97)).with_account(owner()));
        let session = WalletSession::connect(provider).await?;

        let guard = session.begin_action()?;
        assert!(matches!(session.begin_action(), Err(FlowError::Busy)));
        drop(guard);
        assert!(session.begin_action().is_ok());
        Ok(())
    }
}
