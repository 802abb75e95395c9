//! Decimal-string quantities and their on-chain integer form.

use ab_chain_client::U256;
use ethers::utils::format_units;

use crate::FlowError;

/// Decimals used for ether and for the stablecoin amounts shown in the UI.
pub const ETHER_DECIMALS: u32 = 18;

/// A non-negative decimal number as typed by the user, e.g. `100` or `2.5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalQuantity {
    integer: String,
    fraction: String,
}

impl DecimalQuantity {
    pub fn parse(input: &str) -> Result<Self, FlowError> {
        let trimmed = input.trim();
        let (integer, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if integer.is_empty() && fraction.is_empty() {
            return Err(FlowError::InvalidQuantity(format!("`{input}` is not a number")));
        }
        if !all_digits(integer) || !all_digits(fraction) {
            return Err(FlowError::InvalidQuantity(format!("`{input}` is not a non-negative decimal")));
        }

        Ok(Self {
            integer: if integer.is_empty() { "0".to_owned() } else { integer.to_owned() },
            fraction: fraction.to_owned(),
        })
    }

    /// Scales to base units. Digits beyond `decimals` are dropped; a result
    /// that does not fit in 256 bits is an invalid quantity.
    pub fn to_units(&self, decimals: u32) -> Result<U256, FlowError> {
        let out_of_range = || {
            FlowError::InvalidQuantity(format!(
                "`{}` is too large for a token with {decimals} decimals",
                self.integer
            ))
        };
        let pow10 = |exp: u32| U256::from(10u64).checked_pow(U256::from(exp)).ok_or_else(out_of_range);

        let keep = self.fraction.len().min(decimals as usize);
        let fraction = &self.fraction[..keep];

        let integer = U256::from_dec_str(&self.integer).map_err(|_| out_of_range())?;
        let fraction = if fraction.is_empty() {
            U256::zero()
        } else {
            let digits = U256::from_dec_str(fraction).map_err(|_| out_of_range())?;
            digits
                .checked_mul(pow10(decimals - keep as u32)?)
                .ok_or_else(out_of_range)?
        };

        integer
            .checked_mul(pow10(decimals)?)
            .and_then(|scaled| scaled.checked_add(fraction))
            .ok_or_else(out_of_range)
    }
}

/// A whole number of units, e.g. how many tokens to mint.
pub fn parse_whole_quantity(input: &str) -> Result<U256, FlowError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FlowError::InvalidQuantity(format!("`{input}` is not a whole number")));
    }
    U256::from_dec_str(trimmed).map_err(|err| FlowError::InvalidQuantity(format!("`{input}`: {err}")))
}

/// Renders base units as a decimal string: `1.0`, `0.25`, `12.5`.
pub fn format_token_amount(amount: U256, decimals: u32) -> String {
    let Ok(formatted) = format_units(amount, decimals) else {
        return amount.to_string();
    };
    if !formatted.contains('.') {
        return format!("{formatted}.0");
    }
    let trimmed = formatted.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_owned()
    }
}

pub fn format_ether(amount: U256) -> String {
    format_token_amount(amount, ETHER_DECIMALS)
}
