//! Solidity ABI helpers for the handful of calls the gateway makes.

use ethers::abi::{ParamType, Token, decode, encode};
use ethers::types::{Address, U256};

use crate::ProviderError;

pub const SYMBOL: &str = "symbol()";
pub const DECIMALS: &str = "decimals()";
pub const BALANCE_OF: &str = "balanceOf(address)";
pub const ALLOWANCE: &str = "allowance(address,address)";
pub const APPROVE: &str = "approve(address,uint256)";
pub const MINT_FEE: &str = "mintFee()";
pub const MINT_MULTIPLE: &str = "mintMultiple(address,uint256)";

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = ethers::utils::keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 32 * args.len());
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&encode(args));
    out
}

/// Splits calldata into its selector and decoded arguments.
pub fn decode_call(data: &[u8], params: &[ParamType]) -> Result<([u8; 4], Vec<Token>), ProviderError> {
    if data.len() < 4 {
        return Err(ProviderError::Decode("calldata shorter than a selector".to_owned()));
    }
    let mut sel = [0_u8; 4];
    sel.copy_from_slice(&data[..4]);
    let args = decode(params, &data[4..]).map_err(|err| ProviderError::Decode(err.to_string()))?;
    Ok((sel, args))
}

pub fn decode_uint(output: &[u8]) -> Result<U256, ProviderError> {
    if output.len() < 32 {
        return Err(ProviderError::Decode(format!(
            "expected a 32-byte word, got {} bytes",
            output.len()
        )));
    }
    Ok(U256::from_big_endian(&output[..32]))
}

pub fn decode_string(output: &[u8]) -> Result<String, ProviderError> {
    let mut tokens = decode(&[ParamType::String], output)
        .map_err(|err| ProviderError::Decode(err.to_string()))?;
    tokens
        .pop()
        .and_then(Token::into_string)
        .ok_or_else(|| ProviderError::Decode("expected a string".to_owned()))
}

pub fn parse_address(value: &str) -> Result<Address, ProviderError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| ProviderError::Decode(format!("invalid address: {value}")))
}

pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex_data(value: &str) -> Result<Vec<u8>, ProviderError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).map_err(|err| ProviderError::Decode(format!("invalid hex data: {err}")))
}

/// Parses a JSON-RPC quantity such as `0xaa36a7`.
pub fn parse_quantity(value: &str) -> Result<U256, ProviderError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| ProviderError::Decode(format!("quantity without 0x prefix: {value}")))?;
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|err| ProviderError::Decode(format!("invalid quantity {value}: {err}")))
}
