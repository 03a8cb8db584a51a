//! Single-operation instruction builders.
//!
//! Each builder resolves the accounts of one staking instruction from ledger
//! state and emits exactly one instruction. Nothing here signs or submits.
//!
//! Resolution is split in two: [`PoolContext::load`] fetches everything that
//! is shared by every operation on a pool (mint, project, platform config),
//! and the per-operation methods on [`PoolContext`] are pure apart from
//! claim-reflections, which must detect the reflection mint's variant.

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use stakeflow_interface::instructions::{
    self, ClaimReflectionsAccounts, ClaimUnclaimedAccounts, DepositAccounts, PayoutAccounts,
};
use stakeflow_interface::{PlatformConfig, Project, Stake, StakingAccount};
use tracing::debug;

use crate::accounts::RequiredAccount;
use crate::address::{PoolAddresses, platform_config_address, stake_address};
use crate::amounts::{WithdrawAmount, resolve_withdraw_amount};
use crate::error::{ClientError, RejectionReason, Result};
use crate::rpc::LedgerRpc;
use crate::token_program::{MintInfo, detect_mint};

// ============================================================================
// Account Fetching
// ============================================================================

/// Decode a fetched staking account.
pub fn decode_account<T: StakingAccount>(address: &Pubkey, data: &[u8]) -> Result<T> {
    T::try_from_account_data(data).map_err(|source| ClientError::Decode {
        address: *address,
        source,
    })
}

/// Fetch and decode a staking account, `None` if it does not exist.
pub async fn fetch_optional_account<T: StakingAccount, R: LedgerRpc + ?Sized>(
    rpc: &R,
    address: &Pubkey,
) -> Result<Option<T>> {
    match rpc.get_account(address).await? {
        Some(account) => decode_account(address, &account.data).map(Some),
        None => Ok(None),
    }
}

/// Fetch and decode a staking account that must exist.
pub async fn fetch_account<T: StakingAccount, R: LedgerRpc + ?Sized>(
    rpc: &R,
    address: &Pubkey,
) -> Result<T> {
    fetch_optional_account(rpc, address)
        .await?
        .ok_or(ClientError::NotFound(*address))
}

// ============================================================================
// Built Instruction
// ============================================================================

/// One staking instruction plus the destination accounts it writes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltInstruction {
    /// The instruction
    pub instruction: Instruction,
    /// Token accounts that must exist before it executes
    pub required_accounts: Vec<RequiredAccount>,
    /// Amount argument, for instructions that take one
    pub amount: Option<u64>,
}

// ============================================================================
// Pool Context
// ============================================================================

/// Ledger state shared by every operation on one pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolContext {
    /// Staking program
    pub program_id: Pubkey,
    /// Pool index under the mint
    pub pool_index: u64,
    /// Staked mint and its token program
    pub mint: MintInfo,
    /// Program-derived pool addresses
    pub addresses: PoolAddresses,
    /// Decoded project record
    pub project: Project,
    /// Platform config address
    pub platform_config: Pubkey,
    /// Decoded platform config
    pub platform: PlatformConfig,
}

impl PoolContext {
    /// Fetch mint, project and platform config in one request.
    pub async fn load<R: LedgerRpc + ?Sized>(
        rpc: &R,
        program_id: &Pubkey,
        mint: &Pubkey,
        pool_index: u64,
    ) -> Result<Self> {
        let addresses = PoolAddresses::derive(program_id, mint, pool_index);
        let platform_config = platform_config_address(program_id);

        let keys = [*mint, addresses.project, platform_config];
        let mut fetched = rpc.get_multiple_accounts(&keys).await?.into_iter();
        let mut next = |address: &Pubkey| {
            fetched
                .next()
                .flatten()
                .ok_or(ClientError::NotFound(*address))
        };

        let mint_account = next(mint)?;
        let project_account = next(&addresses.project)?;
        let platform_account = next(&platform_config)?;

        let mint = MintInfo::from_account(*mint, &mint_account)?;
        let project: Project = decode_account(&addresses.project, &project_account.data)?;
        let platform: PlatformConfig = decode_account(&platform_config, &platform_account.data)?;

        debug!(
            project = %addresses.project,
            pool_index,
            program = %mint.program,
            "pool context loaded"
        );

        Ok(Self {
            program_id: *program_id,
            pool_index,
            mint,
            addresses,
            project,
            platform_config,
            platform,
        })
    }

    /// Stake record address of `owner`.
    pub fn stake_address(&self, owner: &Pubkey) -> Pubkey {
        stake_address(&self.program_id, &self.addresses.project, owner)
    }

    /// Fetch the stake record of `owner`.
    pub async fn fetch_stake<R: LedgerRpc + ?Sized>(&self, rpc: &R, owner: &Pubkey) -> Result<Stake> {
        fetch_account(rpc, &self.stake_address(owner)).await
    }

    fn fee_collector_account(&self) -> Pubkey {
        self.mint.token_account(&self.platform.fee_collector)
    }

    fn required_for(&self, owners: &[Pubkey]) -> Vec<RequiredAccount> {
        owners
            .iter()
            .filter_map(|owner| RequiredAccount::for_owner(owner, &self.mint))
            .collect()
    }

    fn ensure_open(&self, paused: bool, operation: &str) -> Result<()> {
        if paused {
            return Err(ClientError::rejected(
                RejectionReason::PoolPaused,
                format!("{operation} paused on project {}", self.addresses.project),
            ));
        }
        Ok(())
    }

    fn payout_accounts(&self, user: &Pubkey, stake: &Stake, vault: Pubkey) -> PayoutAccounts {
        PayoutAccounts {
            user: *user,
            platform_config: self.platform_config,
            project: self.addresses.project,
            stake: self.stake_address(user),
            mint: self.mint.address,
            withdrawal_wallet: stake.withdrawal_wallet,
            withdrawal_token_account: self.mint.token_account(&stake.withdrawal_wallet),
            vault,
            fee_collector_token_account: self.fee_collector_account(),
            token_program: self.mint.program.id(),
            referrer: self.project.active_referrer(),
        }
    }

    /// Deposit `amount` raw units from `user`.
    pub fn deposit(&self, user: &Pubkey, amount: u64) -> Result<BuiltInstruction> {
        if amount == 0 {
            return Err(ClientError::InvalidInput("deposit amount must be positive".into()));
        }
        self.ensure_open(self.project.deposits_paused, "deposits")?;

        let accounts = DepositAccounts {
            user: *user,
            platform_config: self.platform_config,
            project: self.addresses.project,
            stake: self.stake_address(user),
            mint: self.mint.address,
            user_token_account: self.mint.token_account(user),
            staking_vault: self.addresses.staking_vault,
            fee_collector_token_account: self.fee_collector_account(),
            token_program: self.mint.program.id(),
            referrer: self.project.active_referrer(),
        };
        Ok(BuiltInstruction {
            instruction: instructions::deposit(&self.program_id, &accounts, amount),
            required_accounts: self.required_for(&[self.platform.fee_collector]),
            amount: Some(amount),
        })
    }

    /// Withdraw principal to the stake's withdrawal wallet.
    pub fn withdraw(
        &self,
        user: &Pubkey,
        stake: &Stake,
        request: WithdrawAmount,
        dust: u64,
    ) -> Result<BuiltInstruction> {
        self.ensure_open(self.project.withdrawals_paused, "withdrawals")?;
        let amount = resolve_withdraw_amount(stake.amount, request, self.mint.is_native(), dust)?;

        let accounts = self.payout_accounts(user, stake, self.addresses.staking_vault);
        Ok(BuiltInstruction {
            instruction: instructions::withdraw(&self.program_id, &accounts, amount),
            required_accounts: self
                .required_for(&[stake.withdrawal_wallet, self.platform.fee_collector]),
            amount: Some(amount),
        })
    }

    /// Claim accrued rewards to the stake's withdrawal wallet.
    pub fn claim(&self, user: &Pubkey, stake: &Stake) -> Result<BuiltInstruction> {
        self.ensure_open(self.project.claims_paused, "claims")?;

        let accounts = self.payout_accounts(user, stake, self.addresses.reward_vault);
        Ok(BuiltInstruction {
            instruction: instructions::claim(&self.program_id, &accounts),
            required_accounts: self
                .required_for(&[stake.withdrawal_wallet, self.platform.fee_collector]),
            amount: None,
        })
    }

    /// Claim accrued reflections, using the vault recorded on the project.
    pub async fn claim_reflections<R: LedgerRpc + ?Sized>(
        &self,
        rpc: &R,
        user: &Pubkey,
        stake: &Stake,
    ) -> Result<BuiltInstruction> {
        self.ensure_open(self.project.claims_paused, "claims")?;
        let reflection = self.project.recorded_reflection().ok_or_else(|| {
            ClientError::InvalidInput(format!(
                "project {} has no reflection vault",
                self.addresses.project
            ))
        })?;
        let reflection_mint = detect_mint(rpc, &reflection.mint()).await?;

        let accounts = ClaimReflectionsAccounts {
            user: *user,
            project: self.addresses.project,
            stake: self.stake_address(user),
            reflection,
            withdrawal_wallet: stake.withdrawal_wallet,
            withdrawal_reflection_token_account: reflection_mint
                .token_account(&stake.withdrawal_wallet),
            reflection_token_program: reflection_mint.program.id(),
            referrer: self.project.active_referrer(),
        };
        Ok(BuiltInstruction {
            instruction: instructions::claim_reflections(&self.program_id, &accounts),
            required_accounts: RequiredAccount::for_owner(&stake.withdrawal_wallet, &reflection_mint)
                .into_iter()
                .collect(),
            amount: None,
        })
    }

    /// Admin: withdraw undistributed rewards from the reward vault.
    pub fn claim_unclaimed(&self, admin: &Pubkey, amount: u64) -> Result<BuiltInstruction> {
        if *admin != self.project.admin {
            return Err(ClientError::Unauthorized(format!(
                "{admin} is not the admin of project {}",
                self.addresses.project
            )));
        }
        if amount == 0 {
            return Err(ClientError::InvalidInput("claim amount must be positive".into()));
        }

        let accounts = ClaimUnclaimedAccounts {
            admin: *admin,
            platform_config: self.platform_config,
            project: self.addresses.project,
            mint: self.mint.address,
            reward_vault: self.addresses.reward_vault,
            admin_token_account: self.mint.token_account(admin),
            token_program: self.mint.program.id(),
            referrer: self.project.active_referrer(),
        };
        Ok(BuiltInstruction {
            instruction: instructions::claim_unclaimed_tokens(&self.program_id, &accounts, amount),
            required_accounts: self.required_for(&[*admin]),
            amount: Some(amount),
        })
    }
}

// ============================================================================
// Async Builders
// ============================================================================

/// Build a deposit for `user`.
pub async fn build_deposit<R: LedgerRpc + ?Sized>(
    rpc: &R,
    program_id: &Pubkey,
    user: &Pubkey,
    mint: &Pubkey,
    pool_index: u64,
    amount: u64,
) -> Result<BuiltInstruction> {
    PoolContext::load(rpc, program_id, mint, pool_index)
        .await?
        .deposit(user, amount)
}

/// Build a withdraw for `user`.
pub async fn build_withdraw<R: LedgerRpc + ?Sized>(
    rpc: &R,
    program_id: &Pubkey,
    user: &Pubkey,
    mint: &Pubkey,
    pool_index: u64,
    request: WithdrawAmount,
    dust: u64,
) -> Result<BuiltInstruction> {
    let ctx = PoolContext::load(rpc, program_id, mint, pool_index).await?;
    let stake = ctx.fetch_stake(rpc, user).await?;
    ctx.withdraw(user, &stake, request, dust)
}

/// Build a reward claim for `user`.
pub async fn build_claim<R: LedgerRpc + ?Sized>(
    rpc: &R,
    program_id: &Pubkey,
    user: &Pubkey,
    mint: &Pubkey,
    pool_index: u64,
) -> Result<BuiltInstruction> {
    let ctx = PoolContext::load(rpc, program_id, mint, pool_index).await?;
    let stake = ctx.fetch_stake(rpc, user).await?;
    ctx.claim(user, &stake)
}

/// Build a reflection claim for `user`.
pub async fn build_claim_reflections<R: LedgerRpc + ?Sized>(
    rpc: &R,
    program_id: &Pubkey,
    user: &Pubkey,
    mint: &Pubkey,
    pool_index: u64,
) -> Result<BuiltInstruction> {
    let ctx = PoolContext::load(rpc, program_id, mint, pool_index).await?;
    let stake = ctx.fetch_stake(rpc, user).await?;
    ctx.claim_reflections(rpc, user, &stake).await
}

/// Build an admin claim of undistributed rewards.
pub async fn build_claim_unclaimed<R: LedgerRpc + ?Sized>(
    rpc: &R,
    program_id: &Pubkey,
    admin: &Pubkey,
    mint: &Pubkey,
    pool_index: u64,
    amount: u64,
) -> Result<BuiltInstruction> {
    PoolContext::load(rpc, program_id, mint, pool_index)
        .await?
        .claim_unclaimed(admin, amount)
}
