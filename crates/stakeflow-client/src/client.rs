//! The public staking client.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use stakeflow_interface::{PlatformConfig, Project, Stake};
use tracing::{info, instrument};

use crate::accounts::with_destination_accounts;
use crate::address::{PoolAddresses, platform_config_address, stake_address};
use crate::amounts::WithdrawAmount;
use crate::batch::{BatchKind, BatchProgress, BatchRunner, BatchStep, PoolRef};
use crate::builders::{
    BuiltInstruction, PoolContext, decode_account, fetch_account, fetch_optional_account,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::lookup_table::{LookupTableStore, MemoryLookupTableStore};
use crate::rates::{
    PoolRate, lockup_remaining, pending_rewards_ui, pool_end_time, pool_rate, to_ui_amount,
};
use crate::rpc::LedgerRpc;
use crate::submit::{TxOutcome, send_and_confirm};
use crate::sync::{NoopStakeSync, StakeSync, StakeSyncEvent, SyncAction, sync_quietly};
use crate::token_program::{MintInfo, detect_mint};
use crate::transaction::build_versioned_transaction;

/// Read-only snapshot of a pool.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectInfo {
    /// Derived pool addresses
    pub addresses: PoolAddresses,
    /// Decoded project record
    pub project: Project,
    /// Staked mint
    pub mint: MintInfo,
    /// Current rate
    pub rate: PoolRate,
    /// Total staked in human units
    pub total_staked_ui: f64,
    /// Unix time the pool ends, if bounded
    pub end_time: Option<i64>,
    /// Whether the recorded reflection vault equals the seed-derived one;
    /// `None` when the project has no reflections or the seed address cannot
    /// be derived
    pub reflection_vault_matches_seed: Option<bool>,
}

/// Staking client over a ledger RPC.
pub struct StakingClient<R: LedgerRpc> {
    rpc: Arc<R>,
    config: ClientConfig,
    program_id: Pubkey,
    signer: Option<Arc<Keypair>>,
    lookup_store: Arc<dyn LookupTableStore>,
    stake_sync: Arc<dyn StakeSync>,
    pause: Arc<AtomicBool>,
}

impl<R: LedgerRpc> StakingClient<R> {
    /// Client with no wallet, an in-memory lookup-table store and no sync.
    pub fn new(rpc: Arc<R>, config: ClientConfig) -> Result<Self> {
        let program_id = config.program_id()?;
        Ok(Self {
            rpc,
            config,
            program_id,
            signer: None,
            lookup_store: Arc::new(MemoryLookupTableStore::new()),
            stake_sync: Arc::new(NoopStakeSync),
            pause: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Connect a wallet.
    pub fn with_signer(mut self, signer: Arc<Keypair>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Persist lookup tables in `store`.
    pub fn with_lookup_store(mut self, store: Arc<dyn LookupTableStore>) -> Self {
        self.lookup_store = store;
        self
    }

    /// Report deposits and withdrawals to `sync`.
    pub fn with_stake_sync(mut self, sync: Arc<dyn StakeSync>) -> Self {
        self.stake_sync = sync;
        self
    }

    /// Flag that stops a running batch before its next transaction.
    pub fn pause_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.pause)
    }

    /// Clear the pause flag so later batches run again.
    pub fn resume(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }

    /// Staking program id.
    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connected wallet address, if any.
    pub fn wallet(&self) -> Option<Pubkey> {
        self.signer.as_ref().map(|s| s.pubkey())
    }

    fn signer(&self) -> Result<&Keypair> {
        self.signer
            .as_deref()
            .ok_or_else(|| ClientError::Unauthorized("no wallet connected".into()))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Deposit `amount` raw units into a pool.
    #[instrument(skip(self))]
    pub async fn stake(&self, mint: &Pubkey, pool_index: u64, amount: u64) -> Result<TxOutcome> {
        let signer = self.signer()?;
        let ctx = self.pool_context(mint, pool_index).await?;
        let op = ctx.deposit(&signer.pubkey(), amount)?;
        let outcome = self.submit(signer, op).await?;
        self.sync(mint, pool_index, SyncAction::Deposit, &outcome).await;
        Ok(outcome)
    }

    /// Withdraw principal from a pool.
    #[instrument(skip(self))]
    pub async fn unstake(
        &self,
        mint: &Pubkey,
        pool_index: u64,
        amount: WithdrawAmount,
    ) -> Result<TxOutcome> {
        let signer = self.signer()?;
        let owner = signer.pubkey();
        let ctx = self.pool_context(mint, pool_index).await?;
        let stake = ctx.fetch_stake(self.rpc.as_ref(), &owner).await?;
        let op = ctx.withdraw(&owner, &stake, amount, self.config.dust_amount)?;
        info!(amount = ?op.amount, staked = stake.amount, "withdrawing");
        let outcome = self.submit(signer, op).await?;
        self.sync(mint, pool_index, SyncAction::Withdraw, &outcome).await;
        Ok(outcome)
    }

    /// Claim pending rewards of a pool.
    #[instrument(skip(self))]
    pub async fn claim_rewards(&self, mint: &Pubkey, pool_index: u64) -> Result<TxOutcome> {
        let signer = self.signer()?;
        let owner = signer.pubkey();
        let ctx = self.pool_context(mint, pool_index).await?;
        let stake = ctx.fetch_stake(self.rpc.as_ref(), &owner).await?;
        let op = ctx.claim(&owner, &stake)?;
        self.submit(signer, op).await
    }

    /// Claim pending reflections of a pool.
    #[instrument(skip(self))]
    pub async fn claim_reflections(&self, mint: &Pubkey, pool_index: u64) -> Result<TxOutcome> {
        let signer = self.signer()?;
        let owner = signer.pubkey();
        let ctx = self.pool_context(mint, pool_index).await?;
        let stake = ctx.fetch_stake(self.rpc.as_ref(), &owner).await?;
        let op = ctx.claim_reflections(self.rpc.as_ref(), &owner, &stake).await?;
        self.submit(signer, op).await
    }

    /// Admin: withdraw `amount` undistributed rewards.
    #[instrument(skip(self))]
    pub async fn claim_unclaimed(
        &self,
        mint: &Pubkey,
        pool_index: u64,
        amount: u64,
    ) -> Result<TxOutcome> {
        let signer = self.signer()?;
        let ctx = self.pool_context(mint, pool_index).await?;
        let op = ctx.claim_unclaimed(&signer.pubkey(), amount)?;
        self.submit(signer, op).await
    }

    /// Claim rewards across many pools in as few transactions as fit.
    pub async fn batch_claim<F>(&self, pools: &[PoolRef], progress: F) -> Result<Vec<BatchStep>>
    where
        F: FnMut(BatchProgress) + Send,
    {
        self.run_batch(BatchKind::Claim, pools, progress).await
    }

    /// Claim and re-deposit rewards across many pools.
    pub async fn batch_compound<F>(&self, pools: &[PoolRef], progress: F) -> Result<Vec<BatchStep>>
    where
        F: FnMut(BatchProgress) + Send,
    {
        self.run_batch(BatchKind::Compound, pools, progress).await
    }

    async fn run_batch<F>(
        &self,
        kind: BatchKind,
        pools: &[PoolRef],
        progress: F,
    ) -> Result<Vec<BatchStep>>
    where
        F: FnMut(BatchProgress) + Send,
    {
        let signer = self.signer()?;
        let runner = BatchRunner::new(self.rpc.as_ref(), signer, self.program_id, &self.config)
            .with_lookup_store(self.lookup_store.as_ref())
            .with_pause_flag(self.pause_handle());
        Ok(runner.run(kind, pools, progress).await)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Stake record of `owner` in a pool, `None` if they never staked.
    pub async fn get_user_stake(
        &self,
        mint: &Pubkey,
        pool_index: u64,
        owner: &Pubkey,
    ) -> Result<Option<Stake>> {
        let project = PoolAddresses::derive(&self.program_id, mint, pool_index).project;
        let address = stake_address(&self.program_id, &project, owner);
        fetch_optional_account(self.rpc.as_ref(), &address).await
    }

    /// Stake records of `owner` across `pools`, in one request.
    pub async fn get_user_stakes(
        &self,
        pools: &[PoolRef],
        owner: &Pubkey,
    ) -> Result<Vec<(PoolRef, Option<Stake>)>> {
        let addresses: Vec<Pubkey> = pools
            .iter()
            .map(|pool| {
                let project = PoolAddresses::derive(&self.program_id, &pool.mint, pool.pool_index).project;
                stake_address(&self.program_id, &project, owner)
            })
            .collect();
        let accounts = self.rpc.get_multiple_accounts(&addresses).await?;

        pools
            .iter()
            .zip(addresses.iter().zip(accounts))
            .map(|(pool, (address, account))| {
                let stake = account
                    .map(|account| decode_account::<Stake>(address, &account.data))
                    .transpose()?;
                Ok((pool.clone(), stake))
            })
            .collect()
    }

    /// Snapshot of a pool.
    pub async fn get_project_info(&self, mint: &Pubkey, pool_index: u64) -> Result<ProjectInfo> {
        let addresses = PoolAddresses::derive(&self.program_id, mint, pool_index);
        let project: Project = fetch_account(self.rpc.as_ref(), &addresses.project).await?;
        let mint_info = detect_mint(self.rpc.as_ref(), mint).await?;
        let reflection_vault_matches_seed = project.recorded_reflection().and_then(|recorded| {
            PoolAddresses::seed_reflection_vault(&self.program_id, mint, pool_index)
                .map(|seed| seed == recorded.vault())
        });
        Ok(ProjectInfo {
            addresses,
            rate: pool_rate(&project),
            total_staked_ui: to_ui_amount(project.total_staked, mint_info.decimals),
            end_time: pool_end_time(&project),
            mint: mint_info,
            reflection_vault_matches_seed,
            project,
        })
    }

    /// Current APY/APR of a pool.
    pub async fn get_pool_rate(&self, mint: &Pubkey, pool_index: u64) -> Result<PoolRate> {
        let project = PoolAddresses::derive(&self.program_id, mint, pool_index).project;
        let project: Project = fetch_account(self.rpc.as_ref(), &project).await?;
        Ok(pool_rate(&project))
    }

    /// Platform config singleton.
    pub async fn get_platform_config(&self) -> Result<PlatformConfig> {
        fetch_account(self.rpc.as_ref(), &platform_config_address(&self.program_id)).await
    }

    /// Pending rewards of `owner` in human units; 0 without a stake record.
    pub async fn get_pending_rewards(
        &self,
        mint: &Pubkey,
        pool_index: u64,
        owner: &Pubkey,
    ) -> Result<f64> {
        let Some(stake) = self.get_user_stake(mint, pool_index, owner).await? else {
            return Ok(0.0);
        };
        let mint_info = detect_mint(self.rpc.as_ref(), mint).await?;
        Ok(pending_rewards_ui(&stake, mint_info.decimals))
    }

    /// Seconds of lockup left for `owner` at unix time `now`; `None` without
    /// a stake record.
    pub async fn get_lockup_remaining(
        &self,
        mint: &Pubkey,
        pool_index: u64,
        owner: &Pubkey,
        now: i64,
    ) -> Result<Option<i64>> {
        let Some(stake) = self.get_user_stake(mint, pool_index, owner).await? else {
            return Ok(None);
        };
        let project = PoolAddresses::derive(&self.program_id, mint, pool_index).project;
        let project: Project = fetch_account(self.rpc.as_ref(), &project).await?;
        Ok(Some(lockup_remaining(&stake, project.lockup_seconds, now)))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn pool_context(&self, mint: &Pubkey, pool_index: u64) -> Result<PoolContext> {
        PoolContext::load(self.rpc.as_ref(), &self.program_id, mint, pool_index).await
    }

    async fn submit(&self, signer: &Keypair, op: BuiltInstruction) -> Result<TxOutcome> {
        let instructions: Vec<Instruction> = with_destination_accounts(
            self.rpc.as_ref(),
            &signer.pubkey(),
            &op.required_accounts,
            [op.instruction],
        )
        .await?;
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let tx = build_versioned_transaction(signer, &instructions, &[], blockhash)?;
        let outcome = send_and_confirm(self.rpc.as_ref(), &tx, &self.config.poll).await?;
        info!(outcome = ?outcome, "operation submitted");
        Ok(outcome)
    }

    async fn sync(&self, mint: &Pubkey, pool_index: u64, action: SyncAction, outcome: &TxOutcome) {
        let Some(wallet) = self.wallet() else {
            return;
        };
        let event = StakeSyncEvent::new(
            &wallet,
            mint,
            pool_index,
            action,
            outcome.signature().as_ref(),
        );
        sync_quietly(self.stake_sync.as_ref(), event).await;
    }
}
