use ab_chain_evm::DEFAULT_RPC_URL;
use anyhow::Context;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_RECEIPT_POLL_MS: u64 = 2_000;
const DEFAULT_NETWORK_POLL_MS: u64 = 4_000;

/// Runtime settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub(crate) struct ServiceConfig {
    pub(crate) rpc_url: String,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) receipt_poll_interval: Duration,
    /// `None` when `ALGOBULL_NETWORK_POLL_MS=0`.
    pub(crate) network_poll_interval: Option<Duration>,
}

impl ServiceConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let rpc_url = lookup("ALGOBULL_RPC_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_owned());

        let bind_addr = lookup("ALGOBULL_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned())
            .parse::<SocketAddr>()
            .context("ALGOBULL_BIND_ADDR must be a socket address")?;

        let receipt_poll_ms = millis(&lookup, "ALGOBULL_RECEIPT_POLL_MS", DEFAULT_RECEIPT_POLL_MS)?;
        if receipt_poll_ms == 0 {
            anyhow::bail!("ALGOBULL_RECEIPT_POLL_MS must be greater than 0");
        }
        let network_poll_ms = millis(&lookup, "ALGOBULL_NETWORK_POLL_MS", DEFAULT_NETWORK_POLL_MS)?;

        Ok(Self {
            rpc_url,
            bind_addr,
            receipt_poll_interval: Duration::from_millis(receipt_poll_ms),
            network_poll_interval: (network_poll_ms > 0).then(|| Duration::from_millis(network_poll_ms)),
        })
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> anyhow::Result<u64> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of milliseconds")),
        None => Ok(default),
    }
}
