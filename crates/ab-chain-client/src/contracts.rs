//! Typed bindings for the stablecoin (ERC-20) and the AlgoBull mint contract.

use ethers::abi::Token;
use ethers::types::{Address, U256};
use std::sync::Arc;

use crate::abi::{self, decode_string, decode_uint, encode_call};
use crate::{CallRequest, ProviderError, TxRequest, WalletProvider};

#[derive(Clone)]
pub struct Erc20 {
    address: Address,
    provider: Arc<dyn WalletProvider>,
}

impl Erc20 {
    pub fn new(address: Address, provider: Arc<dyn WalletProvider>) -> Self {
        Self { address, provider }
    }

    pub async fn symbol(&self) -> Result<String, ProviderError> {
        let output = self.read(abi::SYMBOL, &[]).await?;
        decode_string(&output)
    }

    pub async fn decimals(&self) -> Result<u32, ProviderError> {
        let value = decode_uint(&self.read(abi::DECIMALS, &[]).await?)?;
        if value > U256::from(u8::MAX) {
            return Err(ProviderError::Decode(format!("decimals out of range: {value}")));
        }
        Ok(value.as_u32())
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, ProviderError> {
        decode_uint(&self.read(abi::BALANCE_OF, &[Token::Address(owner)]).await?)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ProviderError> {
        let output = self
            .read(abi::ALLOWANCE, &[Token::Address(owner), Token::Address(spender)])
            .await?;
        decode_uint(&output)
    }

    /// Submits `approve(spender, amount)` from `owner`; returns the tx hash.
    pub async fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<String, ProviderError> {
        self.provider
            .send_transaction(TxRequest {
                from: owner,
                to: self.address,
                data: encode_call(abi::APPROVE, &[Token::Address(spender), Token::Uint(amount)]),
            })
            .await
    }

    async fn read(&self, signature: &str, args: &[Token]) -> Result<Vec<u8>, ProviderError> {
        self.provider
            .call(CallRequest {
                to: self.address,
                data: encode_call(signature, args),
            })
            .await
    }
}

#[derive(Clone)]
pub struct AlgoBull {
    address: Address,
    provider: Arc<dyn WalletProvider>,
}

impl AlgoBull {
    pub fn new(address: Address, provider: Arc<dyn WalletProvider>) -> Self {
        Self { address, provider }
    }

    /// Per-token mint fee, denominated in the stablecoin's base units.
    pub async fn mint_fee(&self) -> Result<U256, ProviderError> {
        let output = self
            .provider
            .call(CallRequest {
                to: self.address,
                data: encode_call(abi::MINT_FEE, &[]),
            })
            .await?;
        decode_uint(&output)
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, ProviderError> {
        let output = self
            .provider
            .call(CallRequest {
                to: self.address,
                data: encode_call(abi::BALANCE_OF, &[Token::Address(owner)]),
            })
            .await?;
        decode_uint(&output)
    }

    pub async fn mint_multiple(&self, from: Address, recipient: Address, quantity: U256) -> Result<String, ProviderError> {
        self.provider
            .send_transaction(TxRequest {
                from,
                to: self.address,
                data: encode_call(
                    abi::MINT_MULTIPLE,
                    &[Token::Address(recipient), Token::Uint(quantity)],
                ),
            })
            .await
    }
}
