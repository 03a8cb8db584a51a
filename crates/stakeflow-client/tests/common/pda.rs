//! PDA derivation helpers for client tests.
//!
//! Written against the raw seeds so tests catch drift in the client's own
//! derivation.

use solana_sdk::pubkey::Pubkey;

// ============================================================================
// Staking Program PDAs
// ============================================================================

pub fn find_platform_config(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"platform"], program_id).0
}

pub fn find_project(program_id: &Pubkey, mint: &Pubkey, pool_index: u64) -> Pubkey {
    Pubkey::find_program_address(
        &[b"project", mint.as_ref(), &pool_index.to_le_bytes()],
        program_id,
    )
    .0
}

pub fn find_staking_vault(program_id: &Pubkey, mint: &Pubkey, pool_index: u64) -> Pubkey {
    Pubkey::find_program_address(
        &[b"staking_vault", mint.as_ref(), &pool_index.to_le_bytes()],
        program_id,
    )
    .0
}

pub fn find_reward_vault(program_id: &Pubkey, mint: &Pubkey, pool_index: u64) -> Pubkey {
    Pubkey::find_program_address(
        &[b"reward_vault", mint.as_ref(), &pool_index.to_le_bytes()],
        program_id,
    )
    .0
}

pub fn find_stake(program_id: &Pubkey, project: &Pubkey, owner: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"stake", project.as_ref(), owner.as_ref()], program_id).0
}

// ============================================================================
// Token Accounts
// ============================================================================

/// Associated token account, derived from the raw ATA seeds.
pub fn find_ata(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), token_program.as_ref(), mint.as_ref()],
        &stakeflow_client::interface::ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}
