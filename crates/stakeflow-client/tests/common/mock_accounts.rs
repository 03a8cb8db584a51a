//! Mock account data for client tests.

use borsh::BorshSerialize;
use solana_sdk::account::Account;
use solana_sdk::address_lookup_table::program::ID as LOOKUP_TABLE_PROGRAM_ID;
use solana_sdk::pubkey::Pubkey;
use stakeflow_client::interface::discriminator::account_discriminator;
use stakeflow_client::interface::{PlatformConfig, SPL_TOKEN_PROGRAM_ID, Stake, StakingAccount};

/// Lookup table metadata size; addresses follow it.
pub const LOOKUP_TABLE_META_SIZE: usize = 56;

fn account(owner: Pubkey, data: Vec<u8>) -> Account {
    Account {
        lamports: 1_000_000_000,
        data,
        owner,
        executable: false,
        rent_epoch: 0,
    }
}

/// Mint account owned by `token_program`.
pub fn mint_account(token_program: Pubkey, decimals: u8) -> Account {
    // SPL mint layout (82 bytes), shared by both token programs
    let mut data = vec![0u8; 82];
    data[0] = 1; // mint_authority: Some
    data[44] = decimals;
    data[45] = 1; // is_initialized
    account(token_program, data)
}

/// Token account of `owner` for `mint`.
pub fn token_account(token_program: Pubkey, mint: &Pubkey, owner: &Pubkey, amount: u64) -> Account {
    let mut data = vec![0u8; 165];
    data[0..32].copy_from_slice(mint.as_ref());
    data[32..64].copy_from_slice(owner.as_ref());
    data[64..72].copy_from_slice(&amount.to_le_bytes());
    data[108] = 1; // AccountState::Initialized
    account(token_program, data)
}

/// Project account body, field for field as the program lays it out.
#[derive(BorshSerialize, Clone, Debug)]
pub struct ProjectData {
    pub admin: Pubkey,
    pub mint: Pubkey,
    pub pool_index: u64,
    pub rate_mode: u8,
    pub rate_bps_per_year: u64,
    pub reward_rate_per_second: u64,
    pub total_staked: u64,
    pub total_rewards_deposited: u64,
    pub lockup_seconds: i64,
    pub pool_duration_seconds: i64,
    pub start_time: i64,
    pub referrer: Option<Pubkey>,
    pub referrer_split_bps: u16,
    pub reflection_vault: Option<Pubkey>,
    pub reflection_mint: Option<Pubkey>,
    pub deposits_paused: bool,
    pub withdrawals_paused: bool,
    pub claims_paused: bool,
    pub bump: u8,
}

impl ProjectData {
    /// Fixed-rate project with no referrer or reflections.
    pub fn fixed(admin: Pubkey, mint: Pubkey, pool_index: u64, rate_bps_per_year: u64) -> Self {
        Self {
            admin,
            mint,
            pool_index,
            rate_mode: 0,
            rate_bps_per_year,
            reward_rate_per_second: 0,
            total_staked: 0,
            total_rewards_deposited: 0,
            lockup_seconds: 0,
            pool_duration_seconds: 0,
            start_time: 1_700_000_000,
            referrer: None,
            referrer_split_bps: 0,
            reflection_vault: None,
            reflection_mint: None,
            deposits_paused: false,
            withdrawals_paused: false,
            claims_paused: false,
            bump: 254,
        }
    }

    /// Variable-rate project.
    pub fn variable(
        admin: Pubkey,
        mint: Pubkey,
        pool_index: u64,
        reward_rate_per_second: u64,
        total_staked: u64,
    ) -> Self {
        Self {
            rate_mode: 1,
            reward_rate_per_second,
            total_staked,
            ..Self::fixed(admin, mint, pool_index, 0)
        }
    }
}

/// Account owned by `program_id` holding `name`'s discriminator and `body`.
pub fn program_account<T: BorshSerialize>(program_id: Pubkey, name: &str, body: &T) -> Account {
    let mut data = account_discriminator(name).to_vec();
    body.serialize(&mut data).unwrap();
    // Programs allocate headroom past the encoded size
    data.extend_from_slice(&[0u8; 32]);
    account(program_id, data)
}

pub fn project_account(program_id: Pubkey, project: &ProjectData) -> Account {
    program_account(program_id, "Project", project)
}

pub fn platform_config_account(program_id: Pubkey, config: &PlatformConfig) -> Account {
    program_account(program_id, PlatformConfig::NAME, config)
}

pub fn stake_account(program_id: Pubkey, stake: &Stake) -> Account {
    program_account(program_id, Stake::NAME, stake)
}

/// Active lookup table owned by `authority` holding `addresses`.
pub fn lookup_table_account(authority: &Pubkey, addresses: &[Pubkey]) -> Account {
    let mut data = vec![0u8; LOOKUP_TABLE_META_SIZE];
    // ProgramState::LookupTable
    data[0..4].copy_from_slice(&1u32.to_le_bytes());
    // deactivation_slot: active
    data[4..12].copy_from_slice(&u64::MAX.to_le_bytes());
    // last_extended_slot (8) and start index (1) stay zero
    // authority: Some(authority)
    data[21] = 1;
    data[22..54].copy_from_slice(authority.as_ref());
    let mut account = account(LOOKUP_TABLE_PROGRAM_ID, data);
    append_lookup_table_addresses(&mut account, addresses);
    account
}

/// Mark a lookup table deactivated at `slot`.
pub fn deactivate_lookup_table(account: &mut Account, slot: u64) {
    account.data[4..12].copy_from_slice(&slot.to_le_bytes());
}

pub fn append_lookup_table_addresses(account: &mut Account, addresses: &[Pubkey]) {
    for address in addresses {
        account.data.extend_from_slice(address.as_ref());
    }
}

/// Native mint account, as the legacy token program owns it.
pub fn native_mint_account() -> Account {
    mint_account(SPL_TOKEN_PROGRAM_ID, 9)
}
