use ab_api_types::ChainId;
use ab_chain_client::ProviderError;
use ab_network_registry::NetworkRegistry;
use thiserror::Error;

pub mod bridge;
pub mod flow;
pub mod session;
pub mod snapshot;
pub mod units;

pub use bridge::{Bridge, BridgeConfig};
pub use flow::{Approval, FlowConfig, MintReceipt, TransactionFlow};
pub use session::{SessionState, WalletSession};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("no compatible wallet provider: {0}")]
    ProviderUnavailable(String),
    #[error("the wallet request was rejected by the user")]
    UserRejected,
    #[error(
        "Network with chain id {chain_id} is not supported. Please switch to one of the following supported networks: {}.",
        .supported.join(", ")
    )]
    UnsupportedNetwork {
        chain_id: ChainId,
        supported: Vec<String>,
    },
    #[error("could not read token allowance: {0}")]
    AllowanceReadFailure(#[source] ProviderError),
    #[error("token approval failed: {0}")]
    ApprovalSubmissionFailure(#[source] ProviderError),
    #[error("mint failed: {0}")]
    MintSubmissionFailure(#[source] ProviderError),
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("wallet switched from chain {from} to chain {to}; reconnect required")]
    SessionInvalidated { from: ChainId, to: ChainId },
    #[error("another wallet action is still in progress")]
    Busy,
    #[error("no account detected: {0}")]
    UnknownAccount(String),
}

impl FlowError {
    pub fn unsupported_network(registry: &NetworkRegistry, chain_id: ChainId) -> Self {
        Self::UnsupportedNetwork {
            chain_id,
            supported: registry.network_names(),
        }
    }
}

impl From<ProviderError> for FlowError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(message) => Self::ProviderUnavailable(message),
            ProviderError::UserRejected => Self::UserRejected,
            other => Self::UnknownAccount(other.to_string()),
        }
    }
}

/// Terminal result of one approve or mint invocation.
#[derive(Debug)]
pub enum TransactionOutcome<T> {
    Success(T),
    Failure(FlowError),
}

impl<T> TransactionOutcome<T> {
    pub fn into_result(self) -> Result<T, FlowError> {
        match self {
            TransactionOutcome::Success(value) => Ok(value),
            TransactionOutcome::Failure(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, FlowError>> for TransactionOutcome<T> {
    fn from(result: Result<T, FlowError>) -> Self {
        match result {
            Ok(value) => TransactionOutcome::Success(value),
            Err(err) => TransactionOutcome::Failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_network_names_chain_and_options() {
        let err = FlowError::unsupported_network(&NetworkRegistry::builtin(), ChainId(1));
        let message = err.to_string();
        assert!(message.starts_with("Network with chain id 1 is not supported."));
        assert!(message.ends_with("sepolia, BinanceSmartChainTestnet."));
    }

    #[test]
    fn provider_errors_map_onto_the_taxonomy() {
        assert!(matches!(
            FlowError::from(ProviderError::Unavailable("gone".to_owned())),
            FlowError::ProviderUnavailable(_)
        ));
        assert!(matches!(
            FlowError::from(ProviderError::UserRejected),
            FlowError::UserRejected
        ));
        assert!(matches!(
            FlowError::from(ProviderError::Decode("bad".to_owned())),
            FlowError::UnknownAccount(_)
        ));
    }
}
