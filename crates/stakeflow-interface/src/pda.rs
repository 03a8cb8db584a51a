//! Program Derived Address (PDA) helpers.
//!
//! All PDAs are derived using standardized seeds for each account type:
//!
//! | Account          | Seeds                                          |
//! |------------------|------------------------------------------------|
//! | Platform config  | `["platform"]`                                 |
//! | Project          | `["project", mint, pool_index_le]`             |
//! | Staking vault    | `["staking_vault", mint, pool_index_le]`       |
//! | Reward vault     | `["reward_vault", mint, pool_index_le]`        |
//! | Reflection vault | `["reflection_vault", mint, pool_index_le]`    |
//! | Stake            | `["stake", project, owner]`                    |
//!
//! The reflection vault seed is exposed for verification only. Instructions
//! always take the address recorded on the project account.

use solana_program::pubkey::Pubkey;

/// Platform config PDA seed.
pub const PLATFORM_SEED: &[u8] = b"platform";
/// Project PDA seed.
pub const PROJECT_SEED: &[u8] = b"project";
/// Staking vault PDA seed.
pub const STAKING_VAULT_SEED: &[u8] = b"staking_vault";
/// Reward vault PDA seed.
pub const REWARD_VAULT_SEED: &[u8] = b"reward_vault";
/// Reflection vault PDA seed.
pub const REFLECTION_VAULT_SEED: &[u8] = b"reflection_vault";
/// Stake record PDA seed.
pub const STAKE_SEED: &[u8] = b"stake";

/// Maximum length of a single seed, enforced by the runtime.
pub const MAX_SEED_LEN: usize = 32;

/// Derive the platform config PDA.
pub fn find_platform_config_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PLATFORM_SEED], program_id)
}

/// Derive a pool-scoped PDA from `(label, mint, pool_index)`.
///
/// Returns `None` when the label exceeds the seed length limit or no valid
/// bump exists.
pub fn try_find_pool_pda(
    program_id: &Pubkey,
    label: &[u8],
    mint: &Pubkey,
    pool_index: u64,
) -> Option<(Pubkey, u8)> {
    if label.len() > MAX_SEED_LEN {
        return None;
    }
    Pubkey::try_find_program_address(
        &[label, mint.as_ref(), &pool_index.to_le_bytes()],
        program_id,
    )
}

/// Derive the project PDA for `(mint, pool_index)`.
pub fn find_project_pda(program_id: &Pubkey, mint: &Pubkey, pool_index: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[PROJECT_SEED, mint.as_ref(), &pool_index.to_le_bytes()],
        program_id,
    )
}

/// Derive the staking vault PDA for `(mint, pool_index)`.
pub fn find_staking_vault_pda(
    program_id: &Pubkey,
    mint: &Pubkey,
    pool_index: u64,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[STAKING_VAULT_SEED, mint.as_ref(), &pool_index.to_le_bytes()],
        program_id,
    )
}

/// Derive the reward vault PDA for `(mint, pool_index)`.
pub fn find_reward_vault_pda(program_id: &Pubkey, mint: &Pubkey, pool_index: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[REWARD_VAULT_SEED, mint.as_ref(), &pool_index.to_le_bytes()],
        program_id,
    )
}

/// Derive the stake record PDA for `(project, owner)`.
pub fn find_stake_pda(program_id: &Pubkey, project: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[STAKE_SEED, project.as_ref(), owner.as_ref()], program_id)
}
