//! Deterministic address derivation.
//!
//! Pure and offline: the same inputs always give the same addresses.

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use stakeflow_interface::pda::{
    self, MAX_SEED_LEN, PROJECT_SEED, REFLECTION_VAULT_SEED, REWARD_VAULT_SEED,
    STAKING_VAULT_SEED,
};

use crate::error::{ClientError, Result};

/// Derive a pool-scoped address for an arbitrary seed label.
pub fn derive_pool_address(
    program_id: &Pubkey,
    label: &str,
    mint: &Pubkey,
    pool_index: u64,
) -> Result<Pubkey> {
    if label.is_empty() || label.len() > MAX_SEED_LEN {
        return Err(ClientError::InvalidInput(format!(
            "seed label must be 1..={MAX_SEED_LEN} bytes, got {}",
            label.len()
        )));
    }
    pda::try_find_pool_pda(program_id, label.as_bytes(), mint, pool_index)
        .map(|(address, _)| address)
        .ok_or_else(|| ClientError::InvalidInput(format!("no valid address for seed {label}")))
}

/// Platform config singleton.
pub fn platform_config_address(program_id: &Pubkey) -> Pubkey {
    pda::find_platform_config_pda(program_id).0
}

/// Stake record of `owner` in `project`.
pub fn stake_address(program_id: &Pubkey, project: &Pubkey, owner: &Pubkey) -> Pubkey {
    pda::find_stake_pda(program_id, project, owner).0
}

/// Parse a base58 address.
pub fn parse_address(value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value.trim())
        .map_err(|e| ClientError::InvalidInput(format!("malformed address {value:?}: {e}")))
}

/// Program-derived addresses of one pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolAddresses {
    /// Project record
    pub project: Pubkey,
    /// Principal vault
    pub staking_vault: Pubkey,
    /// Undistributed rewards vault
    pub reward_vault: Pubkey,
}

impl PoolAddresses {
    /// Derive all addresses of `(mint, pool_index)`.
    pub fn derive(program_id: &Pubkey, mint: &Pubkey, pool_index: u64) -> Self {
        Self {
            project: pda::find_project_pda(program_id, mint, pool_index).0,
            staking_vault: pda::find_staking_vault_pda(program_id, mint, pool_index).0,
            reward_vault: pda::find_reward_vault_pda(program_id, mint, pool_index).0,
        }
    }

    /// Seed-derived reflection vault.
    ///
    /// For comparison against the project's recorded vault only. Instructions
    /// always take the recorded address. `None` when no bump yields a valid
    /// address.
    pub fn seed_reflection_vault(
        program_id: &Pubkey,
        mint: &Pubkey,
        pool_index: u64,
    ) -> Option<Pubkey> {
        pda::try_find_pool_pda(program_id, REFLECTION_VAULT_SEED, mint, pool_index)
            .map(|(address, _)| address)
    }
}

/// Seed labels of the pool-scoped accounts, for display and diagnostics.
pub const POOL_SEED_LABELS: [&[u8]; 4] = [
    PROJECT_SEED,
    STAKING_VAULT_SEED,
    REWARD_VAULT_SEED,
    REFLECTION_VAULT_SEED,
];
