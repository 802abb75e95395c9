use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WalletAddress(pub String);

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account view pushed to the UI after a successful `accountRequested`.
///
/// Balances and the fee are decimal strings already scaled to whole
/// tokens; `algobull_balance` is a raw integer count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub address: String,
    pub stablecoin_balance: String,
    pub stablecoin_symbol: String,
    pub eth_balance: String,
    pub network: String,
    pub stablecoin_fee: String,
    pub algobull_balance: String,
}

/// Requests arriving from the rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "port", content = "payload", rename_all = "camelCase")]
pub enum BridgeRequest {
    AccountRequested,
    ApproveRequested(String),
    MintRequested(String),
}

/// Events pushed back to the rendering layer. One per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "port", content = "payload", rename_all = "camelCase")]
pub enum BridgeEvent {
    AccountSucceeded(WalletSnapshot),
    AccountFailed(String),
    ApproveSucceeded,
    ApproveFailed(String),
    MintSucceeded(String),
    MintFailed,
    NetworkError(String),
}

impl BridgeEvent {
    pub fn port(&self) -> &'static str {
        match self {
            BridgeEvent::AccountSucceeded(_) => "accountSucceeded",
            BridgeEvent::AccountFailed(_) => "accountFailed",
            BridgeEvent::ApproveSucceeded => "approveSucceeded",
            BridgeEvent::ApproveFailed(_) => "approveFailed",
            BridgeEvent::MintSucceeded(_) => "mintSucceeded",
            BridgeEvent::MintFailed => "mintFailed",
            BridgeEvent::NetworkError(_) => "networkError",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityRequest {
    pub quantity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfoResponse {
    pub chain_id: u64,
    pub name: String,
    pub mint_contract: String,
    pub stablecoin: String,
    pub explorer_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkListResponse {
    pub networks: Vec<NetworkInfoResponse>,
}
