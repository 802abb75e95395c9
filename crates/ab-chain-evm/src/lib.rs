use ab_api_types::ChainId;
use ab_chain_client::abi::{from_hex_data, parse_address, parse_quantity, to_hex_data};
use ab_chain_client::{Address, CallRequest, ProviderError, TxReceipt, TxRequest, U256, WalletProvider};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// HTTP JSON-RPC client for an EIP-1193 style wallet endpoint.
///
/// Reads `ALGOBULL_RPC_URL` from environment at construction time
/// (default: `http://localhost:8545`). Transactions go out through
/// `eth_sendTransaction`, so the wallet behind the endpoint does the signing.
pub struct JsonRpcProvider {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl Default for JsonRpcProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl JsonRpcProvider {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("ALGOBULL_RPC_URL").ok())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(method, id, "json-rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Unavailable(format!("{method} transport: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unavailable(format!("{method} HTTP {status}: {text}")));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(format!("{method} parse: {err}")))?;

        if let Some(error) = envelope.error {
            return Err(ProviderError::from_rpc(error.code, error.message));
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
            .map_err(|err| ProviderError::Decode(format!("{method} result: {err}")))
    }

    async fn addresses(&self, method: &str) -> Result<Vec<Address>, ProviderError> {
        let raw: Vec<String> = self.request(method, json!([])).await?;
        raw.iter().map(|value| parse_address(value)).collect()
    }
}

// ── JSON-RPC wire types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptBody {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
}

fn hex_address(address: Address) -> String {
    format!("{address:#x}")
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.addresses("eth_requestAccounts").await
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.addresses("eth_accounts").await
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        let value = parse_quantity(&raw)?;
        if value > U256::from(u64::MAX) {
            return Err(ProviderError::Decode(format!("chain id out of range: {raw}")));
        }
        Ok(ChainId(value.as_u64()))
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ProviderError> {
        let raw: String = self
            .request("eth_getBalance", json!([hex_address(address), "latest"]))
            .await?;
        parse_quantity(&raw)
    }

    async fn call(&self, req: CallRequest) -> Result<Vec<u8>, ProviderError> {
        let raw: String = self
            .request(
                "eth_call",
                json!([{ "to": hex_address(req.to), "data": to_hex_data(&req.data) }, "latest"]),
            )
            .await?;
        from_hex_data(&raw)
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<String, ProviderError> {
        self.request(
            "eth_sendTransaction",
            json!([{
                "from": hex_address(tx.from),
                "to": hex_address(tx.to),
                "data": to_hex_data(&tx.data),
            }]),
        )
        .await
    }

    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ProviderError> {
        let body: Option<ReceiptBody> = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        let Some(body) = body else {
            return Ok(None);
        };

        // A receipt without a block number is still pending on some nodes.
        let Some(block_number) = body.block_number else {
            return Ok(None);
        };
        let block_number = parse_quantity(&block_number)?.low_u64();
        // Pre-Byzantium receipts carry no status; treat them as successful.
        let success = match body.status {
            Some(status) => !parse_quantity(&status)?.is_zero(),
            None => true,
        };

        Ok(Some(TxReceipt {
            tx_hash: body.transaction_hash,
            block_number: Some(block_number),
            success,
        }))
    }
}
