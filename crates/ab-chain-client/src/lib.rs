use ab_api_types::ChainId;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub mod abi;
pub mod contracts;
pub mod memory;

pub use ethers::types::{Address, U256};

/// JSON-RPC error code wallets return when the user declines a prompt (EIP-1193).
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("wallet provider unavailable: {0}")]
    Unavailable(String),
    #[error("user rejected the request")]
    UserRejected,
    #[error("json-rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed provider response: {0}")]
    Decode(String),
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },
}

impl ProviderError {
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            Self::UserRejected
        } else {
            Self::Rpc {
                code,
                message: message.into(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub to: Address,
    pub data: Vec<u8>,
}

/// An unsigned transaction handed to the wallet, which signs and broadcasts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// The wallet-side JSON-RPC surface the gateway depends on.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`: may prompt the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    /// `eth_accounts`: accounts already exposed to us.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;
    async fn get_balance(&self, address: Address) -> Result<U256, ProviderError>;
    async fn call(&self, req: CallRequest) -> Result<Vec<u8>, ProviderError>;
    /// `eth_sendTransaction`: returns the transaction hash.
    async fn send_transaction(&self, tx: TxRequest) -> Result<String, ProviderError>;
    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ProviderError>;
}

/// Polls for a receipt until the transaction is mined once.
///
/// There is no deadline; the caller waits as long as the provider keeps
/// answering. A mined transaction with a failed status is an error.
pub async fn wait_for_confirmation(
    provider: &dyn WalletProvider,
    tx_hash: &str,
    poll_interval: Duration,
) -> Result<TxReceipt, ProviderError> {
    loop {
        match provider.transaction_receipt(tx_hash).await? {
            Some(receipt) if receipt.success => return Ok(receipt),
            Some(_) => {
                return Err(ProviderError::Reverted {
                    tx_hash: tx_hash.to_owned(),
                });
            }
            None => {
                debug!(tx_hash, "transaction pending");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::Erc20;
    use crate::memory::InMemoryProvider;
    use std::sync::Arc;

    fn addr(s: &str) -> Address {
        s.parse().expect("valid address literal")
    }

    #[test]
    fn code_4001_maps_to_user_rejected() {
        assert!(matches!(
            ProviderError::from_rpc(4001, "User rejected"),
            ProviderError::UserRejected
        ));
        assert!(matches!(
            ProviderError::from_rpc(-32000, "boom"),
            ProviderError::Rpc { code: -32000, .. }
        ));
    }

    #[tokio::test]
    async fn wait_polls_until_mined() -> anyhow::Result<()> {
        let owner = addr("0x1000000000000000000000000000000000000001");
        let token = addr("0x2000000000000000000000000000000000000002");
        let spender = addr("0x3000000000000000000000000000000000000003");
        let provider = Arc::new(
            InMemoryProvider::new(ChainId(11_155_111))
                .with_account(owner)
                .with_token(token, "LINK", 18)
                .with_pending_polls(2),
        );

        let erc20 = Erc20::new(token, provider.clone());
        let tx_hash = erc20.approve(owner, spender, U256::from(5u64)).await?;
        let receipt = wait_for_confirmation(provider.as_ref(), &tx_hash, Duration::from_millis(1)).await?;

        assert!(receipt.success);
        assert_eq!(provider.receipt_queries().await, 3);
        Ok(())
    }

    #[tokio::test]
    async fn reverted_receipt_is_an_error() -> anyhow::Result<()> {
        let owner = addr("0x1000000000000000000000000000000000000001");
        let token = addr("0x2000000000000000000000000000000000000002");
        let provider = Arc::new(
            InMemoryProvider::new(ChainId(97))
                .with_account(owner)
                .with_token(token, "USDT", 6),
        );
        provider.revert_sends(true).await;

        let tx_hash = Erc20::new(token, provider.clone())
            .approve(owner, owner, U256::one())
            .await?;
        let err = wait_for_confirmation(provider.as_ref(), &tx_hash, Duration::from_millis(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Reverted { .. }));
        Ok(())
    }
}
