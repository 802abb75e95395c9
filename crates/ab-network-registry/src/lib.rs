use ab_api_types::{ChainId, NetworkInfoResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const SEPOLIA: ChainId = ChainId(11_155_111);
pub const BSC_TESTNET: ChainId = ChainId(97);

/// Contract and explorer metadata for one supported chain.
/// (chain ids per https://chainlist.org/)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: ChainId,
    pub name: String,
    pub mint_contract: String,
    pub stablecoin: String,
    pub explorer_base_url: String,
}

impl NetworkConfig {
    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base_url.trim_end_matches('/'), tx_hash)
    }

    pub fn info(&self) -> NetworkInfoResponse {
        NetworkInfoResponse {
            chain_id: self.chain_id.0,
            name: self.name.clone(),
            mint_contract: self.mint_contract.clone(),
            stablecoin: self.stablecoin.clone(),
            explorer_base_url: self.explorer_base_url.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("network with chain id {0} is not configured")]
    NotFound(ChainId),
    #[error("chain id {0} is configured more than once")]
    DuplicateChain(ChainId),
}

/// Static chain table. Declaration order is preserved for name listings.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<NetworkConfig>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NetworkRegistry {
    pub fn new(networks: Vec<NetworkConfig>) -> Result<Self, RegistryError> {
        for (index, network) in networks.iter().enumerate() {
            if networks[..index]
                .iter()
                .any(|earlier| earlier.chain_id == network.chain_id)
            {
                return Err(RegistryError::DuplicateChain(network.chain_id));
            }
        }
        Ok(Self { networks })
    }

    /// The networks the AlgoBull contracts are deployed on.
    pub fn builtin() -> Self {
        Self {
            networks: vec![
                NetworkConfig {
                    chain_id: SEPOLIA,
                    name: "sepolia".to_owned(),
                    mint_contract: "0xF3c144FC829f6351241568b7200E622fb0fb0421".to_owned(),
                    stablecoin: "0x779877A7B0D9E8603169DdbD7836e478b4624789".to_owned(),
                    explorer_base_url: "https://sepolia.etherscan.io".to_owned(),
                },
                NetworkConfig {
                    chain_id: BSC_TESTNET,
                    name: "BinanceSmartChainTestnet".to_owned(),
                    mint_contract: "0x1E67DB7b119aDdCBAfEe67978183819788B413D8".to_owned(),
                    stablecoin: "0xeD24FC36d5Ee211Ea25A80239Fb8C4Cfd80f12Ee".to_owned(),
                    explorer_base_url: "https://testnet.bscscan.com/".to_owned(),
                },
            ],
        }
    }

    pub fn is_supported(&self, chain_id: ChainId) -> bool {
        self.networks.iter().any(|network| network.chain_id == chain_id)
    }

    pub fn lookup(&self, chain_id: ChainId) -> Result<&NetworkConfig, RegistryError> {
        self.networks
            .iter()
            .find(|network| network.chain_id == chain_id)
            .ok_or(RegistryError::NotFound(chain_id))
    }

    pub fn network_names(&self) -> Vec<String> {
        let names: Vec<String> = self
            .networks
            .iter()
            .map(|network| network.name.clone())
            .collect();
        debug!(?names, "supported networks");
        names
    }

    pub fn networks(&self) -> &[NetworkConfig] {
        &self.networks
    }
}
