//! Withdraw amount resolution.

use crate::error::{ClientError, Result};

/// Share of the balance withheld from native-asset withdrawals, in bps.
pub const NATIVE_BUFFER_BPS: u64 = 100;

/// A request at or above this share of the stake counts as near-full, in bps.
pub const NEAR_FULL_THRESHOLD_BPS: u64 = 9_900;

const BPS_DENOMINATOR: u64 = 10_000;

/// How much to withdraw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WithdrawAmount {
    /// Exactly this many raw units
    Exact(u64),
    /// Close out the stake, keeping dust behind when the balance allows
    All,
}

impl From<Option<u64>> for WithdrawAmount {
    fn from(amount: Option<u64>) -> Self {
        amount.map_or(Self::All, Self::Exact)
    }
}

/// Close-out amount: `staked - dust` when `staked > 2 * dust`, else `staked`.
pub fn close_out_amount(staked: u64, dust: u64) -> u64 {
    if staked > dust.saturating_mul(2) {
        staked - dust
    } else {
        staked
    }
}

/// Whether `amount` is at least 99% of `staked`.
pub fn is_near_full(amount: u64, staked: u64) -> bool {
    u128::from(amount) * u128::from(BPS_DENOMINATOR)
        >= u128::from(staked) * u128::from(NEAR_FULL_THRESHOLD_BPS)
}

/// Subtract the native-asset buffer.
pub fn apply_native_buffer(amount: u64) -> u64 {
    let buffer = u128::from(amount) * u128::from(NATIVE_BUFFER_BPS) / u128::from(BPS_DENOMINATOR);
    // buffer <= amount / 100, so it fits back into u64
    amount - buffer as u64
}

/// Resolve a request against the staked balance.
///
/// The native buffer is applied to near-full native withdrawals only.
pub fn resolve_withdraw_amount(
    staked: u64,
    request: WithdrawAmount,
    is_native: bool,
    dust: u64,
) -> Result<u64> {
    if staked == 0 {
        return Err(ClientError::InvalidInput("nothing staked in this pool".into()));
    }
    let amount = match request {
        WithdrawAmount::Exact(0) => {
            return Err(ClientError::InvalidInput("withdraw amount must be positive".into()));
        }
        WithdrawAmount::Exact(amount) if amount > staked => {
            return Err(ClientError::InvalidInput(format!(
                "withdraw amount {amount} exceeds staked balance {staked}"
            )));
        }
        WithdrawAmount::Exact(amount) => amount,
        WithdrawAmount::All => close_out_amount(staked, dust),
    };
    if is_native && is_near_full(amount, staked) {
        return Ok(apply_native_buffer(amount));
    }
    Ok(amount)
}
