use ab_api_types::WalletSnapshot;
use ab_chain_client::abi::parse_address;
use ab_chain_client::contracts::{AlgoBull, Erc20};
use ab_network_registry::NetworkConfig;

use crate::FlowError;
use crate::session::WalletSession;
use crate::units::format_ether;

/// Reads the balances and fee the UI shows after connecting.
///
/// The stablecoin balance and fee are rendered with 18 decimals regardless
/// of the token's own precision.
pub async fn load_snapshot(session: &WalletSession, network: &NetworkConfig) -> Result<WalletSnapshot, FlowError> {
    session.ensure_active()?;
    let provider = session.provider();
    let owner = session.address();

    let stablecoin = Erc20::new(parse_address(&network.stablecoin)?, provider.clone());
    let algobull = AlgoBull::new(parse_address(&network.mint_contract)?, provider.clone());

    let stablecoin_symbol = stablecoin.symbol().await?;
    let stablecoin_fee = algobull.mint_fee().await?;
    let eth_balance = provider.get_balance(owner).await?;
    let stablecoin_balance = stablecoin.balance_of(owner).await?;
    let algobull_balance = algobull.balance_of(owner).await?;

    Ok(WalletSnapshot {
        address: session.wallet_address().0,
        stablecoin_balance: format_ether(stablecoin_balance),
        stablecoin_symbol,
        eth_balance: format_ether(eth_balance),
        network: network.name.clone(),
        stablecoin_fee: format_ether(stablecoin_fee),
        algobull_balance: algobull_balance.to_string(),
    })
}
