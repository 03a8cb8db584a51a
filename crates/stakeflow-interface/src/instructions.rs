//! Instruction encoding for the staking program.
//!
//! Account ordering and argument encoding here are the program's ABI and must
//! only change together with a program deployment. Each builder emits exactly
//! one instruction; resolving the accounts is the caller's job.
//!
//! When a project has an active referrer it is appended after the fixed
//! accounts as a writable, non-signing account.

use borsh::BorshSerialize;
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;

use crate::discriminator::{DISCRIMINATOR_LEN, instruction_discriminator};
use crate::program_ids::{ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID};
use crate::state::RecordedReflectionVault;

// ============================================================================
// Instruction Set
// ============================================================================

/// Instructions this client builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumIter)]
pub enum StakingInstruction {
    /// Stake principal into a project
    Deposit,
    /// Withdraw principal from a project
    Withdraw,
    /// Claim accrued rewards
    Claim,
    /// Claim accrued reflections
    ClaimReflections,
    /// Admin: withdraw undistributed rewards
    ClaimUnclaimedTokens,
}

impl StakingInstruction {
    /// Instruction name as declared by the program.
    pub fn name(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Claim => "claim",
            Self::ClaimReflections => "claim_reflections",
            Self::ClaimUnclaimedTokens => "claim_unclaimed_tokens",
        }
    }

    /// 8-byte instruction discriminator.
    pub fn discriminator(self) -> [u8; DISCRIMINATOR_LEN] {
        instruction_discriminator(self.name())
    }

    /// Identify an instruction from its data prefix.
    pub fn from_data(data: &[u8]) -> Option<Self> {
        let prefix = data.get(..DISCRIMINATOR_LEN)?;
        <Self as strum::IntoEnumIterator>::iter().find(|ix| ix.discriminator() == prefix)
    }
}

/// Args for instructions carrying a single raw amount.
#[derive(BorshSerialize)]
struct AmountArgs {
    amount: u64,
}

/// Build instruction data with discriminator and Borsh-serialized args.
fn build_instruction_data<T: BorshSerialize>(ix: StakingInstruction, args: &T) -> Vec<u8> {
    let mut data = ix.discriminator().to_vec();
    // Writing into a Vec cannot fail.
    let _ = args.serialize(&mut data);
    data
}

/// Build instruction data with just the discriminator (no args).
fn build_instruction_data_no_args(ix: StakingInstruction) -> Vec<u8> {
    ix.discriminator().to_vec()
}

/// Parse the `amount` argument of deposit, withdraw and claim-unclaimed data.
pub fn parse_amount_arg(data: &[u8]) -> Option<u64> {
    let bytes = data.get(DISCRIMINATOR_LEN..DISCRIMINATOR_LEN + 8)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

fn push_referrer(accounts: &mut Vec<AccountMeta>, referrer: Option<Pubkey>) {
    if let Some(referrer) = referrer {
        accounts.push(AccountMeta::new(referrer, false));
    }
}

// ============================================================================
// Deposit
// ============================================================================

/// Account indices for deposit.
pub mod deposit_accounts {
    /// Depositor (writable, signer)
    pub const USER: usize = 0;
    /// Platform config
    pub const PLATFORM_CONFIG: usize = 1;
    /// Project (writable)
    pub const PROJECT: usize = 2;
    /// Stake record (writable, created on first deposit)
    pub const STAKE: usize = 3;
    /// Staked mint
    pub const MINT: usize = 4;
    /// Depositor's token account (writable, source)
    pub const USER_TOKEN: usize = 5;
    /// Staking vault (writable)
    pub const STAKING_VAULT: usize = 6;
    /// Fee collector token account (writable)
    pub const FEE_COLLECTOR_TOKEN: usize = 7;
    /// Token program matching the mint
    pub const TOKEN_PROGRAM: usize = 8;
    /// Associated token program
    pub const ASSOCIATED_TOKEN_PROGRAM: usize = 9;
    /// System program
    pub const SYSTEM_PROGRAM: usize = 10;
    /// Accounts before the optional referrer
    pub const COUNT: usize = 11;
}

/// Resolved accounts for a deposit.
#[derive(Clone, Debug)]
pub struct DepositAccounts {
    /// Depositor
    pub user: Pubkey,
    /// Platform config PDA
    pub platform_config: Pubkey,
    /// Project PDA
    pub project: Pubkey,
    /// Stake PDA
    pub stake: Pubkey,
    /// Staked mint
    pub mint: Pubkey,
    /// Depositor's token account (own address for the native mint)
    pub user_token_account: Pubkey,
    /// Staking vault PDA
    pub staking_vault: Pubkey,
    /// Fee collector token account (own address for the native mint)
    pub fee_collector_token_account: Pubkey,
    /// Token program owning the mint
    pub token_program: Pubkey,
    /// Active referrer, if any
    pub referrer: Option<Pubkey>,
}

/// Build a deposit instruction.
pub fn deposit(program_id: &Pubkey, accounts: &DepositAccounts, amount: u64) -> Instruction {
    let mut metas = vec![
        AccountMeta::new(accounts.user, true),
        AccountMeta::new_readonly(accounts.platform_config, false),
        AccountMeta::new(accounts.project, false),
        AccountMeta::new(accounts.stake, false),
        AccountMeta::new_readonly(accounts.mint, false),
        AccountMeta::new(accounts.user_token_account, false),
        AccountMeta::new(accounts.staking_vault, false),
        AccountMeta::new(accounts.fee_collector_token_account, false),
        AccountMeta::new_readonly(accounts.token_program, false),
        AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
    ];
    push_referrer(&mut metas, accounts.referrer);

    Instruction {
        program_id: *program_id,
        accounts: metas,
        data: build_instruction_data(StakingInstruction::Deposit, &AmountArgs { amount }),
    }
}

// ============================================================================
// Withdraw / Claim
// ============================================================================

/// Account indices shared by withdraw and claim.
///
/// Withdraw pays out of the staking vault, claim out of the reward vault.
pub mod payout_accounts {
    /// Stake owner (writable, signer)
    pub const USER: usize = 0;
    /// Platform config
    pub const PLATFORM_CONFIG: usize = 1;
    /// Project (writable)
    pub const PROJECT: usize = 2;
    /// Stake record (writable)
    pub const STAKE: usize = 3;
    /// Staked mint
    pub const MINT: usize = 4;
    /// Withdrawal wallet recorded on the stake
    pub const WITHDRAWAL_WALLET: usize = 5;
    /// Withdrawal wallet's token account (writable, destination)
    pub const WITHDRAWAL_TOKEN: usize = 6;
    /// Source vault (writable)
    pub const VAULT: usize = 7;
    /// Fee collector token account (writable)
    pub const FEE_COLLECTOR_TOKEN: usize = 8;
    /// Token program matching the mint
    pub const TOKEN_PROGRAM: usize = 9;
    /// System program
    pub const SYSTEM_PROGRAM: usize = 10;
    /// Accounts before the optional referrer
    pub const COUNT: usize = 11;
}

/// Resolved accounts for a withdraw or claim.
#[derive(Clone, Debug)]
pub struct PayoutAccounts {
    /// Stake owner
    pub user: Pubkey,
    /// Platform config PDA
    pub platform_config: Pubkey,
    /// Project PDA
    pub project: Pubkey,
    /// Stake PDA
    pub stake: Pubkey,
    /// Staked mint
    pub mint: Pubkey,
    /// Withdrawal wallet recorded on the stake
    pub withdrawal_wallet: Pubkey,
    /// Withdrawal wallet's token account (own address for the native mint)
    pub withdrawal_token_account: Pubkey,
    /// Staking vault for withdraw, reward vault for claim
    pub vault: Pubkey,
    /// Fee collector token account (own address for the native mint)
    pub fee_collector_token_account: Pubkey,
    /// Token program owning the mint
    pub token_program: Pubkey,
    /// Active referrer, if any
    pub referrer: Option<Pubkey>,
}

fn payout_metas(accounts: &PayoutAccounts) -> Vec<AccountMeta> {
    let mut metas = vec![
        AccountMeta::new(accounts.user, true),
        AccountMeta::new_readonly(accounts.platform_config, false),
        AccountMeta::new(accounts.project, false),
        AccountMeta::new(accounts.stake, false),
        AccountMeta::new_readonly(accounts.mint, false),
        AccountMeta::new_readonly(accounts.withdrawal_wallet, false),
        AccountMeta::new(accounts.withdrawal_token_account, false),
        AccountMeta::new(accounts.vault, false),
        AccountMeta::new(accounts.fee_collector_token_account, false),
        AccountMeta::new_readonly(accounts.token_program, false),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
    ];
    push_referrer(&mut metas, accounts.referrer);
    metas
}

/// Build a withdraw instruction. `accounts.vault` must be the staking vault.
pub fn withdraw(program_id: &Pubkey, accounts: &PayoutAccounts, amount: u64) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: payout_metas(accounts),
        data: build_instruction_data(StakingInstruction::Withdraw, &AmountArgs { amount }),
    }
}

/// Build a claim-rewards instruction. `accounts.vault` must be the reward vault.
pub fn claim(program_id: &Pubkey, accounts: &PayoutAccounts) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: payout_metas(accounts),
        data: build_instruction_data_no_args(StakingInstruction::Claim),
    }
}

// ============================================================================
// Claim Reflections
// ============================================================================

/// Account indices for claim-reflections.
pub mod claim_reflections_accounts {
    /// Stake owner (writable, signer)
    pub const USER: usize = 0;
    /// Project (writable)
    pub const PROJECT: usize = 1;
    /// Stake record (writable)
    pub const STAKE: usize = 2;
    /// Reflection mint recorded on the project
    pub const REFLECTION_MINT: usize = 3;
    /// Reflection vault recorded on the project (writable)
    pub const REFLECTION_VAULT: usize = 4;
    /// Withdrawal wallet recorded on the stake
    pub const WITHDRAWAL_WALLET: usize = 5;
    /// Withdrawal wallet's reflection token account (writable)
    pub const WITHDRAWAL_REFLECTION_TOKEN: usize = 6;
    /// Token program matching the reflection mint
    pub const TOKEN_PROGRAM: usize = 7;
    /// System program
    pub const SYSTEM_PROGRAM: usize = 8;
    /// Accounts before the optional referrer
    pub const COUNT: usize = 9;
}

/// Resolved accounts for a reflection claim.
#[derive(Clone, Debug)]
pub struct ClaimReflectionsAccounts {
    /// Stake owner
    pub user: Pubkey,
    /// Project PDA
    pub project: Pubkey,
    /// Stake PDA
    pub stake: Pubkey,
    /// Reflection vault and mint read from the project account
    pub reflection: RecordedReflectionVault,
    /// Withdrawal wallet recorded on the stake
    pub withdrawal_wallet: Pubkey,
    /// Withdrawal wallet's reflection token account
    pub withdrawal_reflection_token_account: Pubkey,
    /// Token program owning the reflection mint
    pub reflection_token_program: Pubkey,
    /// Active referrer, if any
    pub referrer: Option<Pubkey>,
}

/// Build a claim-reflections instruction.
pub fn claim_reflections(program_id: &Pubkey, accounts: &ClaimReflectionsAccounts) -> Instruction {
    let mut metas = vec![
        AccountMeta::new(accounts.user, true),
        AccountMeta::new(accounts.project, false),
        AccountMeta::new(accounts.stake, false),
        AccountMeta::new_readonly(accounts.reflection.mint(), false),
        AccountMeta::new(accounts.reflection.vault(), false),
        AccountMeta::new_readonly(accounts.withdrawal_wallet, false),
        AccountMeta::new(accounts.withdrawal_reflection_token_account, false),
        AccountMeta::new_readonly(accounts.reflection_token_program, false),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
    ];
    push_referrer(&mut metas, accounts.referrer);

    Instruction {
        program_id: *program_id,
        accounts: metas,
        data: build_instruction_data_no_args(StakingInstruction::ClaimReflections),
    }
}

// ============================================================================
// Claim Unclaimed Tokens (admin)
// ============================================================================

/// Account indices for claim-unclaimed-tokens.
pub mod claim_unclaimed_accounts {
    /// Project admin (writable, signer)
    pub const ADMIN: usize = 0;
    /// Platform config
    pub const PLATFORM_CONFIG: usize = 1;
    /// Project (writable)
    pub const PROJECT: usize = 2;
    /// Staked mint
    pub const MINT: usize = 3;
    /// Reward vault (writable)
    pub const REWARD_VAULT: usize = 4;
    /// Admin token account (writable, destination)
    pub const ADMIN_TOKEN: usize = 5;
    /// Token program matching the mint
    pub const TOKEN_PROGRAM: usize = 6;
    /// Accounts before the optional referrer
    pub const COUNT: usize = 7;
}

/// Resolved accounts for an admin reward sweep.
#[derive(Clone, Debug)]
pub struct ClaimUnclaimedAccounts {
    /// Project admin
    pub admin: Pubkey,
    /// Platform config PDA
    pub platform_config: Pubkey,
    /// Project PDA
    pub project: Pubkey,
    /// Staked mint
    pub mint: Pubkey,
    /// Reward vault PDA
    pub reward_vault: Pubkey,
    /// Admin token account (own address for the native mint)
    pub admin_token_account: Pubkey,
    /// Token program owning the mint
    pub token_program: Pubkey,
    /// Active referrer, if any
    pub referrer: Option<Pubkey>,
}

/// Build a claim-unclaimed-tokens instruction.
pub fn claim_unclaimed_tokens(
    program_id: &Pubkey,
    accounts: &ClaimUnclaimedAccounts,
    amount: u64,
) -> Instruction {
    let mut metas = vec![
        AccountMeta::new(accounts.admin, true),
        AccountMeta::new_readonly(accounts.platform_config, false),
        AccountMeta::new(accounts.project, false),
        AccountMeta::new_readonly(accounts.mint, false),
        AccountMeta::new(accounts.reward_vault, false),
        AccountMeta::new(accounts.admin_token_account, false),
        AccountMeta::new_readonly(accounts.token_program, false),
    ];
    push_referrer(&mut metas, accounts.referrer);

    Instruction {
        program_id: *program_id,
        accounts: metas,
        data: build_instruction_data(
            StakingInstruction::ClaimUnclaimedTokens,
            &AmountArgs { amount },
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================
