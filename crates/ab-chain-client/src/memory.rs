//! A wallet provider backed by an in-process ledger.
//!
//! Understands just enough of the ERC-20 and AlgoBull ABIs to answer the
//! gateway's reads and apply its transactions. Useful for tests and for
//! running the gateway without a node.

use ab_api_types::ChainId;
use async_trait::async_trait;
use ethers::abi::{ParamType, Token};
use ethers::types::{Address, U256};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::abi::{self, decode_call, selector};
use crate::{CallRequest, ProviderError, TxReceipt, TxRequest, WalletProvider};

#[derive(Debug, Default)]
struct TokenLedger {
    symbol: String,
    decimals: u8,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

#[derive(Debug, Default)]
struct MintLedger {
    fee: U256,
    balances: HashMap<Address, U256>,
}

#[derive(Debug)]
struct PendingReceipt {
    receipt: TxReceipt,
    polls_left: u32,
}

#[derive(Debug, Default)]
struct ChainState {
    chain_id: ChainId,
    accounts: Vec<Address>,
    unavailable: bool,
    reject_requests: bool,
    native: HashMap<Address, U256>,
    tokens: HashMap<Address, TokenLedger>,
    minters: HashMap<Address, MintLedger>,
    sent: Vec<TxRequest>,
    receipts: HashMap<String, PendingReceipt>,
    receipt_queries: usize,
    pending_polls: u32,
    fail_sends: bool,
    revert_sends: bool,
    fail_reads: bool,
    block_number: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryProvider {
    state: RwLock<ChainState>,
}

impl InMemoryProvider {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            state: RwLock::new(ChainState {
                chain_id,
                ..ChainState::default()
            }),
        }
    }

    pub fn with_account(mut self, account: Address) -> Self {
        self.state.get_mut().accounts.push(account);
        self
    }

    pub fn with_native_balance(mut self, account: Address, wei: U256) -> Self {
        self.state.get_mut().native.insert(account, wei);
        self
    }

    pub fn with_token(mut self, token: Address, symbol: &str, decimals: u8) -> Self {
        self.state.get_mut().tokens.insert(
            token,
            TokenLedger {
                symbol: symbol.to_owned(),
                decimals,
                ..TokenLedger::default()
            },
        );
        self
    }

    pub fn with_token_balance(mut self, token: Address, owner: Address, amount: U256) -> Self {
        self.state
            .get_mut()
            .tokens
            .entry(token)
            .or_default()
            .balances
            .insert(owner, amount);
        self
    }

    pub fn with_minter(mut self, minter: Address, fee: U256) -> Self {
        self.state.get_mut().minters.insert(
            minter,
            MintLedger {
                fee,
                ..MintLedger::default()
            },
        );
        self
    }

    /// Receipts stay unavailable for this many lookups after each send.
    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.state.get_mut().pending_polls = polls;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.state.get_mut().unavailable = true;
        self
    }

    pub fn rejecting_requests(mut self) -> Self {
        self.state.get_mut().reject_requests = true;
        self
    }

    pub async fn set_chain_id(&self, chain_id: ChainId) {
        self.state.write().await.chain_id = chain_id;
    }

    pub async fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        let mut state = self.state.write().await;
        state
            .tokens
            .entry(token)
            .or_default()
            .allowances
            .insert((owner, spender), amount);
    }

    pub async fn fail_sends(&self, fail: bool) {
        self.state.write().await.fail_sends = fail;
    }

    pub async fn revert_sends(&self, revert: bool) {
        self.state.write().await.revert_sends = revert;
    }

    pub async fn fail_reads(&self, fail: bool) {
        self.state.write().await.fail_reads = fail;
    }

    pub async fn sent_transactions(&self) -> Vec<TxRequest> {
        self.state.read().await.sent.clone()
    }

    pub async fn receipt_queries(&self) -> usize {
        self.state.read().await.receipt_queries
    }

    pub async fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        let state = self.state.read().await;
        state
            .tokens
            .get(&token)
            .and_then(|ledger| ledger.allowances.get(&(owner, spender)).copied())
            .unwrap_or_default()
    }

    pub async fn minted(&self, minter: Address, owner: Address) -> U256 {
        let state = self.state.read().await;
        state
            .minters
            .get(&minter)
            .and_then(|ledger| ledger.balances.get(&owner).copied())
            .unwrap_or_default()
    }

    fn check_available(state: &ChainState) -> Result<(), ProviderError> {
        if state.unavailable {
            return Err(ProviderError::Unavailable("no wallet attached".to_owned()));
        }
        Ok(())
    }
}

fn word(value: U256) -> Vec<u8> {
    ethers::abi::encode(&[Token::Uint(value)])
}

fn reverted() -> ProviderError {
    ProviderError::Rpc {
        code: -32000,
        message: "execution reverted".to_owned(),
    }
}

fn apply_transaction(state: &mut ChainState, tx: &TxRequest) -> Result<(), ProviderError> {
    let sel = tx.data.get(..4).ok_or_else(reverted)?;
    if sel == selector(abi::APPROVE) {
        let (_, args) = decode_call(&tx.data, &[ParamType::Address, ParamType::Uint(256)])?;
        let spender = args[0].clone().into_address().ok_or_else(reverted)?;
        let amount = args[1].clone().into_uint().ok_or_else(reverted)?;
        let ledger = state.tokens.get_mut(&tx.to).ok_or_else(reverted)?;
        ledger.allowances.insert((tx.from, spender), amount);
        Ok(())
    } else if sel == selector(abi::MINT_MULTIPLE) {
        let (_, args) = decode_call(&tx.data, &[ParamType::Address, ParamType::Uint(256)])?;
        let recipient = args[0].clone().into_address().ok_or_else(reverted)?;
        let quantity = args[1].clone().into_uint().ok_or_else(reverted)?;
        let ledger = state.minters.get_mut(&tx.to).ok_or_else(reverted)?;
        let balance = ledger.balances.entry(recipient).or_default();
        *balance = balance.saturating_add(quantity);
        Ok(())
    } else {
        Err(reverted())
    }
}

#[async_trait]
impl WalletProvider for InMemoryProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let state = self.state.read().await;
        Self::check_available(&state)?;
        if state.reject_requests {
            return Err(ProviderError::UserRejected);
        }
        Ok(state.accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let state = self.state.read().await;
        Self::check_available(&state)?;
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let state = self.state.read().await;
        Self::check_available(&state)?;
        Ok(state.chain_id)
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ProviderError> {
        let state = self.state.read().await;
        Self::check_available(&state)?;
        Ok(state.native.get(&address).copied().unwrap_or_default())
    }

    async fn call(&self, req: CallRequest) -> Result<Vec<u8>, ProviderError> {
        let state = self.state.read().await;
        Self::check_available(&state)?;
        if state.fail_reads {
            return Err(reverted());
        }
        let sel = req.data.get(..4).ok_or_else(reverted)?;

        if let Some(ledger) = state.tokens.get(&req.to) {
            if sel == selector(abi::SYMBOL) {
                return Ok(ethers::abi::encode(&[Token::String(ledger.symbol.clone())]));
            }
            if sel == selector(abi::DECIMALS) {
                return Ok(word(U256::from(ledger.decimals)));
            }
            if sel == selector(abi::BALANCE_OF) {
                let (_, args) = decode_call(&req.data, &[ParamType::Address])?;
                let owner = args[0].clone().into_address().ok_or_else(reverted)?;
                return Ok(word(ledger.balances.get(&owner).copied().unwrap_or_default()));
            }
            if sel == selector(abi::ALLOWANCE) {
                let (_, args) = decode_call(&req.data, &[ParamType::Address, ParamType::Address])?;
                let owner = args[0].clone().into_address().ok_or_else(reverted)?;
                let spender = args[1].clone().into_address().ok_or_else(reverted)?;
                return Ok(word(
                    ledger
                        .allowances
                        .get(&(owner, spender))
                        .copied()
                        .unwrap_or_default(),
                ));
            }
        }

        if let Some(ledger) = state.minters.get(&req.to) {
            if sel == selector(abi::MINT_FEE) {
                return Ok(word(ledger.fee));
            }
            if sel == selector(abi::BALANCE_OF) {
                let (_, args) = decode_call(&req.data, &[ParamType::Address])?;
                let owner = args[0].clone().into_address().ok_or_else(reverted)?;
                return Ok(word(ledger.balances.get(&owner).copied().unwrap_or_default()));
            }
        }

        Err(reverted())
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<String, ProviderError> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;
        if state.reject_requests {
            return Err(ProviderError::UserRejected);
        }
        if state.fail_sends {
            return Err(ProviderError::Rpc {
                code: -32603,
                message: "transaction underpriced".to_owned(),
            });
        }

        state.sent.push(tx.clone());
        let tx_hash = format!("0x{:064x}", state.sent.len());

        let success = !state.revert_sends && apply_transaction(&mut state, &tx).is_ok();
        state.block_number += 1;
        let receipt = TxReceipt {
            tx_hash: tx_hash.clone(),
            block_number: Some(state.block_number),
            success,
        };
        let polls_left = state.pending_polls;
        state
            .receipts
            .insert(tx_hash.clone(), PendingReceipt { receipt, polls_left });

        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ProviderError> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;
        state.receipt_queries += 1;
        let Some(pending) = state.receipts.get_mut(tx_hash) else {
            return Ok(None);
        };
        if pending.polls_left > 0 {
            pending.polls_left -= 1;
            return Ok(None);
        }
        Ok(Some(pending.receipt.clone()))
    }
}
