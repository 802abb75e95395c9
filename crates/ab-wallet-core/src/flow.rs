use ab_chain_client::abi::parse_address;
use ab_chain_client::contracts::{AlgoBull, Erc20};
use ab_chain_client::{ProviderError, U256, wait_for_confirmation};
use ab_network_registry::{NetworkConfig, NetworkRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::session::WalletSession;
use crate::units::{DecimalQuantity, parse_whole_quantity};
use crate::{FlowError, TransactionOutcome};

#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub receipt_poll_interval: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            receipt_poll_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approval {
    /// The existing allowance already covers the request; nothing was sent.
    AlreadyGranted { allowance: U256 },
    Confirmed { tx_hash: String, explorer_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub tx_hash: String,
    pub explorer_url: String,
}

/// Approve and mint sequences against the contracts of the session's chain.
#[derive(Clone)]
pub struct TransactionFlow {
    registry: Arc<NetworkRegistry>,
    config: FlowConfig,
}

impl TransactionFlow {
    pub fn new(registry: Arc<NetworkRegistry>, config: FlowConfig) -> Self {
        Self { registry, config }
    }

    /// Lets the mint contract spend `quantity` stablecoins on the owner's behalf.
    pub async fn approve_allowance(&self, session: &WalletSession, quantity: &str) -> TransactionOutcome<Approval> {
        let outcome = self.try_approve(session, quantity).await;
        if let Err(err) = &outcome {
            warn!(session = %session.id(), "approval failed: {}", err);
        }
        outcome.into()
    }

    /// Mints `quantity` AlgoBull tokens to the session's own account.
    pub async fn mint_multiple(&self, session: &WalletSession, quantity: &str) -> TransactionOutcome<MintReceipt> {
        let outcome = self.try_mint(session, quantity).await;
        if let Err(err) = &outcome {
            warn!(session = %session.id(), "mint failed: {}", err);
        }
        outcome.into()
    }

    fn network_for(&self, session: &WalletSession) -> Result<&NetworkConfig, FlowError> {
        session.ensure_active()?;
        self.registry
            .lookup(session.chain_id())
            .map_err(|_| FlowError::unsupported_network(&self.registry, session.chain_id()))
    }

    /// Waits for the receipt, giving up if the session is invalidated first.
    /// The transaction itself is already broadcast and cannot be recalled.
    async fn confirm(
        &self,
        session: &WalletSession,
        tx_hash: &str,
        on_error: fn(ProviderError) -> FlowError,
    ) -> Result<(), FlowError> {
        let provider = session.provider();
        tokio::select! {
            receipt = wait_for_confirmation(provider.as_ref(), tx_hash, self.config.receipt_poll_interval) => {
                receipt.map(|_| ()).map_err(on_error)
            }
            err = session.until_invalidated() => {
                warn!(session = %session.id(), %tx_hash, "stopped waiting for confirmation: {}", err);
                Err(err)
            }
        }
    }

    async fn try_approve(&self, session: &WalletSession, quantity: &str) -> Result<Approval, FlowError> {
        let network = self.network_for(session)?;
        let quantity = DecimalQuantity::parse(quantity)?;
        let _action = session.begin_action()?;

        let owner = session.address();
        let spender = parse_address(&network.mint_contract).map_err(FlowError::AllowanceReadFailure)?;
        let stablecoin = Erc20::new(
            parse_address(&network.stablecoin).map_err(FlowError::AllowanceReadFailure)?,
            session.provider(),
        );

        let decimals = stablecoin
            .decimals()
            .await
            .map_err(FlowError::AllowanceReadFailure)?;
        let amount = quantity.to_units(decimals)?;
        let allowance = stablecoin
            .allowance(owner, spender)
            .await
            .map_err(FlowError::AllowanceReadFailure)?;

        if allowance >= amount {
            info!(session = %session.id(), %allowance, %amount, "allowance already sufficient");
            return Ok(Approval::AlreadyGranted { allowance });
        }

        let tx_hash = stablecoin
            .approve(owner, spender, amount)
            .await
            .map_err(FlowError::ApprovalSubmissionFailure)?;
        let explorer_url = network.tx_url(&tx_hash);
        info!(session = %session.id(), %explorer_url, "approval submitted");

        self.confirm(session, &tx_hash, FlowError::ApprovalSubmissionFailure).await?;
        info!(session = %session.id(), %tx_hash, "approval confirmed");

        Ok(Approval::Confirmed { tx_hash, explorer_url })
    }

    async fn try_mint(&self, session: &WalletSession, quantity: &str) -> Result<MintReceipt, FlowError> {
        let network = self.network_for(session)?;
        let quantity = parse_whole_quantity(quantity)?;
        let _action = session.begin_action()?;

        let owner = session.address();
        let algobull = AlgoBull::new(
            parse_address(&network.mint_contract).map_err(FlowError::MintSubmissionFailure)?,
            session.provider(),
        );

        let tx_hash = algobull
            .mint_multiple(owner, owner, quantity)
            .await
            .map_err(FlowError::MintSubmissionFailure)?;
        let explorer_url = network.tx_url(&tx_hash);
        info!(session = %session.id(), %explorer_url, "mint submitted");

        self.confirm(session, &tx_hash, FlowError::MintSubmissionFailure).await?;
        info!(session = %session.id(), %tx_hash, "mint confirmed");

        Ok(MintReceipt { tx_hash, explorer_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_api_types::ChainId;
    use ab_chain_client::Address;
    use ab_chain_client::memory::InMemoryProvider;
    use ab_network_registry::{BSC_TESTNET, SEPOLIA};

    struct Fixture {
        provider: Arc<InMemoryProvider>,
        session: WalletSession,
        flow: TransactionFlow,
        owner: Address,
        stablecoin: Address,
        minter: Address,
    }

    async fn fixture(chain_id: ChainId, decimals: u8) -> anyhow::Result<Fixture> {
        let registry = NetworkRegistry::builtin();
        let network = registry.lookup(SEPOLIA)?.clone();
        let owner = parse_address("0x1000000000000000000000000000000000000001")?;
        let stablecoin = parse_address(&network.stablecoin)?;
        let minter = parse_address(&network.mint_contract)?;

        let provider = Arc::new(
            InMemoryProvider::new(chain_id)
                .with_account(owner)
                .with_token(stablecoin, "LINK", decimals)
                .with_minter(minter, U256::from(10u64)),
        );
        let session = WalletSession::connect(provider.clone()).await?;
        let flow = TransactionFlow::new(
            Arc::new(registry),
            FlowConfig {
                receipt_poll_interval: Duration::from_millis(1),
            },
        );

        Ok(Fixture {
            provider,
            session,
            flow,
            owner,
            stablecoin,
            minter,
        })
    }

    #[tokio::test]
    async fn approve_submits_exactly_one_transaction_when_allowance_is_short() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;

        let approval = fx.flow.approve_allowance(&fx.session, "100").await.into_result()?;

        assert!(matches!(approval, Approval::Confirmed { .. }));
        let sent = fx.provider.sent_transactions().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, fx.stablecoin);
        assert_eq!(
            fx.provider.allowance(fx.stablecoin, fx.owner, fx.minter).await,
            U256::from(100u64)
        );
        assert_eq!(fx.provider.receipt_queries().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn approve_is_idempotent_when_allowance_covers_quantity() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;
        fx.provider
            .set_allowance(fx.stablecoin, fx.owner, fx.minter, U256::from(500u64))
            .await;

        for _ in 0..3 {
            let approval = fx.flow.approve_allowance(&fx.session, "100").await.into_result()?;
            assert_eq!(
                approval,
                Approval::AlreadyGranted {
                    allowance: U256::from(500u64)
                }
            );
        }
        assert!(fx.provider.sent_transactions().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn approve_scales_quantity_by_token_decimals() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 18).await?;

        fx.flow.approve_allowance(&fx.session, "1.5").await.into_result()?;

        assert_eq!(
            fx.provider.allowance(fx.stablecoin, fx.owner, fx.minter).await,
            U256::from(1_500_000_000_000_000_000u64)
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_submission_reports_approval_failure() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;
        fx.provider.fail_sends(true).await;

        let outcome = fx.flow.approve_allowance(&fx.session, "100").await;
        assert!(matches!(
            outcome,
            TransactionOutcome::Failure(FlowError::ApprovalSubmissionFailure(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn reverted_approval_is_a_failure() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;
        fx.provider.revert_sends(true).await;

        let outcome = fx.flow.approve_allowance(&fx.session, "100").await;
        assert!(matches!(
            outcome,
            TransactionOutcome::Failure(FlowError::ApprovalSubmissionFailure(_))
        ));
        assert_eq!(fx.provider.sent_transactions().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_allowance_is_reported_separately() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;
        fx.provider.fail_reads(true).await;

        let outcome = fx.flow.approve_allowance(&fx.session, "100").await;
        assert!(matches!(
            outcome,
            TransactionOutcome::Failure(FlowError::AllowanceReadFailure(_))
        ));
        assert!(fx.provider.sent_transactions().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unsupported_chain_never_submits() -> anyhow::Result<()> {
        let fx = fixture(ChainId(1), 0).await?;

        let approve = fx.flow.approve_allowance(&fx.session, "100").await.into_result();
        let mint = fx.flow.mint_multiple(&fx.session, "1").await.into_result();

        for err in [approve.unwrap_err(), mint.unwrap_err()] {
            match err {
                FlowError::UnsupportedNetwork { chain_id, supported } => {
                    assert_eq!(chain_id, ChainId(1));
                    assert_eq!(supported, vec!["sepolia", "BinanceSmartChainTestnet"]);
                }
                other => panic!("expected an unsupported network error, got {other}"),
            }
        }
        assert!(fx.provider.sent_transactions().await.is_empty());
        assert_eq!(fx.provider.receipt_queries().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn mint_always_submits_one_transaction() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;

        let first = fx.flow.mint_multiple(&fx.session, "2").await.into_result()?;
        let second = fx.flow.mint_multiple(&fx.session, "2").await.into_result()?;

        assert_ne!(first.tx_hash, second.tx_hash);
        assert_eq!(
            first.explorer_url,
            format!("https://sepolia.etherscan.io/tx/{}", first.tx_hash)
        );
        assert_eq!(fx.provider.sent_transactions().await.len(), 2);
        assert_eq!(fx.provider.minted(fx.minter, fx.owner).await, U256::from(4u64));
        Ok(())
    }

    #[tokio::test]
    async fn mint_failure_is_reported() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;
        fx.provider.fail_sends(true).await;

        let outcome = fx.flow.mint_multiple(&fx.session, "1").await;
        assert!(matches!(
            outcome,
            TransactionOutcome::Failure(FlowError::MintSubmissionFailure(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_quantity_makes_no_calls() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;

        assert!(matches!(
            fx.flow.approve_allowance(&fx.session, "-5").await,
            TransactionOutcome::Failure(FlowError::InvalidQuantity(_))
        ));
        assert!(matches!(
            fx.flow.mint_multiple(&fx.session, "1.5").await,
            TransactionOutcome::Failure(FlowError::InvalidQuantity(_))
        ));
        assert!(fx.provider.sent_transactions().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn quantities_beyond_256_bits_make_no_submission() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 18).await?;
        let huge = format!("1{}", "0".repeat(70));

        assert!(matches!(
            fx.flow.approve_allowance(&fx.session, &huge).await,
            TransactionOutcome::Failure(FlowError::InvalidQuantity(_))
        ));
        assert!(matches!(
            fx.flow.mint_multiple(&fx.session, &"9".repeat(80)).await,
            TransactionOutcome::Failure(FlowError::InvalidQuantity(_))
        ));
        assert!(fx.provider.sent_transactions().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn token_with_unrepresentable_decimals_is_refused() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 100).await?;

        assert!(matches!(
            fx.flow.approve_allowance(&fx.session, "1").await,
            TransactionOutcome::Failure(FlowError::InvalidQuantity(_))
        ));
        assert!(fx.provider.sent_transactions().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn invalidated_session_is_refused() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;
        fx.session.observe_chain(BSC_TESTNET);

        assert!(matches!(
            fx.flow.mint_multiple(&fx.session, "1").await,
            TransactionOutcome::Failure(FlowError::SessionInvalidated { .. })
        ));
        assert!(fx.provider.sent_transactions().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn network_switch_abandons_the_confirmation_wait() -> anyhow::Result<()> {
        let registry = NetworkRegistry::builtin();
        let network = registry.lookup(SEPOLIA)?.clone();
        let provider = Arc::new(
            InMemoryProvider::new(SEPOLIA)
                .with_account(parse_address("0x1000000000000000000000000000000000000001")?)
                .with_minter(parse_address(&network.mint_contract)?, U256::zero())
                .with_pending_polls(u32::MAX),
        );
        let session = WalletSession::connect(provider.clone()).await?;
        let flow = TransactionFlow::new(
            Arc::new(registry),
            FlowConfig {
                receipt_poll_interval: Duration::from_millis(5),
            },
        );

        let (outcome, _) = tokio::join!(flow.mint_multiple(&session, "1"), async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            session.observe_chain(BSC_TESTNET);
        });

        assert!(matches!(
            outcome,
            TransactionOutcome::Failure(FlowError::SessionInvalidated { from, to })
                if from == SEPOLIA && to == BSC_TESTNET
        ));
        assert_eq!(provider.sent_transactions().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_action_on_same_session_is_rejected() -> anyhow::Result<()> {
        let fx = fixture(SEPOLIA, 0).await?;
        let _held = fx.session.begin_action()?;

        assert!(matches!(
            fx.flow.mint_multiple(&fx.session, "1").await,
            TransactionOutcome::Failure(FlowError::Busy)
        ));
        assert!(fx.provider.sent_transactions().await.is_empty());
        Ok(())
    }
}
