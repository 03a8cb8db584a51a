//! Batched claim and compound.
//!
//! A batch run turns N pool operations into as few transactions as fit:
//!
//! 1. Resolve every pool up front and drop pools with nothing pending.
//! 2. Make sure the wallet's lookup table covers every referenced account.
//!    Any lookup-table failure falls back to the smaller table-free budget.
//! 3. Partition the pools into ordered chunks of the per-transaction budget.
//! 4. For each chunk, in order: build, sign, submit and confirm one
//!    transaction, reporting each phase to the caller.
//!
//! A failing chunk is recorded and the run moves on to the next one. The
//! returned list always has one step per chunk. A pool that cannot be
//! prepared is left out of its chunk's transaction and listed on the step;
//! the rest of the chunk is still submitted.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use tracing::{debug, info, warn};

use crate::accounts::{RequiredAccount, with_destination_accounts};
use crate::builders::{BuiltInstruction, PoolContext};
use crate::config::{BatchConfig, ClientConfig};
use crate::error::{ClientError, Result};
use crate::lookup_table::{LookupTableManager, LookupTableStore, seed_addresses};
use crate::rpc::LedgerRpc;
use crate::submit::{TxOutcome, send_and_confirm};
use crate::transaction::{build_versioned_transaction, compute_budget_instructions};

// ============================================================================
// Types
// ============================================================================

/// Operation applied to every pool of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BatchKind {
    /// Claim pending rewards
    Claim,
    /// Claim pending rewards and deposit them back
    Compound,
}

impl BatchKind {
    /// Pools per transaction.
    pub fn pools_per_transaction(self, has_table: bool, config: &BatchConfig) -> usize {
        let pools = match (self, has_table) {
            (Self::Claim, true) => config.claim_pools_with_table,
            (Self::Claim, false) => config.claim_pools_without_table,
            (Self::Compound, true) => config.compound_pools_with_table,
            (Self::Compound, false) => config.compound_pools_without_table,
        };
        pools.max(1)
    }
}

/// A pool taking part in a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolRef {
    /// Staked mint
    pub mint: Pubkey,
    /// Pool index under the mint
    pub pool_index: u64,
    /// Display symbol
    pub symbol: String,
}

impl PoolRef {
    /// New pool reference.
    pub fn new(mint: Pubkey, pool_index: u64, symbol: impl Into<String>) -> Self {
        Self {
            mint,
            pool_index,
            symbol: symbol.into(),
        }
    }
}

/// Phase of the transaction currently in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BatchPhase {
    /// Assembling instructions
    Building,
    /// Signing
    Signing,
    /// Submitted, polling for confirmation
    Confirming,
    /// Finished, successfully or not
    Done,
}

/// Progress report passed to the caller's callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchProgress {
    /// Zero-based index of the transaction
    pub batch_index: usize,
    /// Number of transactions in the run
    pub total_batches: usize,
    /// Current phase
    pub phase: BatchPhase,
    /// Signature, once known
    pub signature: Option<Signature>,
}

/// Status of one queued transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BatchStepStatus {
    /// Not reached
    Pending,
    /// Assembling instructions
    Building,
    /// Signing
    Signing,
    /// Polling for confirmation
    Confirming,
    /// Submitted without error
    Success,
    /// Failed to build, submit or execute
    Error,
}

/// A pool left out of its transaction because it could not be prepared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolFailure {
    /// The pool
    pub pool: PoolRef,
    /// Why it was left out
    pub error: String,
}

/// One queued transaction of a batch run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchStep {
    /// Zero-based position in the run
    pub index: usize,
    /// Pools covered, in input order
    pub pools: Vec<PoolRef>,
    /// Current status
    pub status: BatchStepStatus,
    /// Signature, once known
    pub signature: Option<Signature>,
    /// Whether confirmation was observed; `false` on a soft success
    pub confirmed: bool,
    /// Failure text
    pub error: Option<String>,
    /// Advisory text on a soft success
    pub note: Option<String>,
    /// Pools of this step left out of the transaction
    pub failed_pools: Vec<PoolFailure>,
}

impl BatchStep {
    fn pending(index: usize, pools: Vec<PoolRef>) -> Self {
        Self {
            index,
            pools,
            status: BatchStepStatus::Pending,
            signature: None,
            confirmed: false,
            error: None,
            note: None,
            failed_pools: Vec::new(),
        }
    }

    /// Symbols of the covered pools.
    pub fn symbols(&self) -> Vec<&str> {
        self.pools.iter().map(|p| p.symbol.as_str()).collect()
    }

    /// Whether the step ended in error.
    pub fn is_error(&self) -> bool {
        self.status == BatchStepStatus::Error
    }

    /// Whether any pool of the step went unprocessed.
    pub fn has_failures(&self) -> bool {
        self.is_error() || !self.failed_pools.is_empty()
    }

    fn record_outcome(&mut self, outcome: TxOutcome) {
        self.status = BatchStepStatus::Success;
        match outcome {
            TxOutcome::Confirmed(signature) => {
                self.signature = Some(signature);
                self.confirmed = true;
            }
            TxOutcome::Unconfirmed(signature) => {
                self.signature = Some(signature);
                self.note = Some("not confirmed in time, refresh to verify".to_string());
            }
            TxOutcome::NeedsRefresh(message) => {
                self.note = Some(message);
            }
        }
    }

    fn record_error(&mut self, error: &ClientError) {
        self.status = BatchStepStatus::Error;
        self.error = Some(error.to_string());
    }
}

/// Split `items` into ordered chunks of at most `budget`.
pub fn partition<T>(items: Vec<T>, budget: usize) -> Vec<Vec<T>> {
    let budget = budget.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(budget));
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        chunks.push(items.by_ref().take(budget).collect());
    }
    chunks
}

// ============================================================================
// Runner
// ============================================================================

struct PreparedPool {
    pool: PoolRef,
    operations: Result<Vec<BuiltInstruction>>,
}

/// Executes batch runs for one signer.
pub struct BatchRunner<'a, R: LedgerRpc + ?Sized> {
    rpc: &'a R,
    signer: &'a Keypair,
    program_id: Pubkey,
    config: &'a ClientConfig,
    store: Option<&'a dyn LookupTableStore>,
    pause: Option<Arc<AtomicBool>>,
}

impl<'a, R: LedgerRpc + ?Sized> BatchRunner<'a, R> {
    /// Runner without a lookup table or pause flag.
    pub fn new(rpc: &'a R, signer: &'a Keypair, program_id: Pubkey, config: &'a ClientConfig) -> Self {
        Self {
            rpc,
            signer,
            program_id,
            config,
            store: None,
            pause: None,
        }
    }

    /// Use lookup tables persisted in `store`.
    pub fn with_lookup_store(mut self, store: &'a dyn LookupTableStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Stop between transactions once `pause` is set.
    pub fn with_pause_flag(mut self, pause: Arc<AtomicBool>) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Run `kind` over `pools`, reporting progress.
    pub async fn run<F>(&self, kind: BatchKind, pools: &[PoolRef], mut progress: F) -> Vec<BatchStep>
    where
        F: FnMut(BatchProgress) + Send,
    {
        let owner = self.signer.pubkey();
        let mut prepared = Vec::with_capacity(pools.len());
        let mut seeds = None;
        for pool in pools {
            match self.prepare(kind, &owner, pool).await {
                Ok(Some((ctx, operations))) => {
                    seeds.get_or_insert_with(|| {
                        seed_addresses(&ctx.platform_config, &ctx.platform.fee_collector, &owner)
                    });
                    prepared.push(PreparedPool {
                        pool: pool.clone(),
                        operations: Ok(operations),
                    });
                }
                Ok(None) => debug!(symbol = %pool.symbol, "nothing pending, skipping pool"),
                Err(e) => {
                    warn!(symbol = %pool.symbol, error = %e, "failed to prepare pool");
                    prepared.push(PreparedPool {
                        pool: pool.clone(),
                        operations: Err(e),
                    });
                }
            }
        }

        let table = match seeds {
            Some(seeds) => self.lookup_table(&seeds, &prepared).await,
            None => None,
        };
        let budget = kind.pools_per_transaction(table.is_some(), &self.config.batch);
        let chunks = partition(prepared, budget);
        let total = chunks.len();
        info!(%kind, pools = pools.len(), transactions = total, budget, "starting batch run");

        let mut steps: Vec<BatchStep> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| BatchStep::pending(i, chunk.iter().map(|p| p.pool.clone()).collect()))
            .collect();

        for (index, chunk) in chunks.into_iter().enumerate() {
            if self.is_paused() {
                info!(batch = index, total, "batch run paused");
                break;
            }
            let step = &mut steps[index];
            let report = |phase: BatchPhase, signature: Option<Signature>| BatchProgress {
                batch_index: index,
                total_batches: total,
                phase,
                signature,
            };

            let mut forward = |phase, signature| progress(report(phase, signature));
            match self.execute(step, chunk, table.as_ref(), &mut forward).await {
                Ok(outcome) => {
                    info!(batch = index, signature = ?outcome.signature(), "batch transaction landed");
                    step.record_outcome(outcome);
                }
                Err(e) => {
                    warn!(batch = index, error = %e, "batch transaction failed");
                    step.record_error(&e);
                }
            }
            progress(report(BatchPhase::Done, step.signature));

            if index + 1 < total {
                tokio::time::sleep(self.config.batch.inter_batch_delay()).await;
            }
        }
        steps
    }

    async fn prepare(
        &self,
        kind: BatchKind,
        owner: &Pubkey,
        pool: &PoolRef,
    ) -> Result<Option<(PoolContext, Vec<BuiltInstruction>)>> {
        let ctx = PoolContext::load(self.rpc, &self.program_id, &pool.mint, pool.pool_index).await?;
        let stake = ctx.fetch_stake(self.rpc, owner).await?;
        if stake.pending_rewards == 0 {
            return Ok(None);
        }
        let mut operations = vec![ctx.claim(owner, &stake)?];
        if kind == BatchKind::Compound {
            // Rewards land in the withdrawal wallet; only the signer's own
            // tokens can be deposited back.
            if stake.withdrawal_wallet == *owner {
                operations.push(ctx.deposit(owner, stake.pending_rewards)?);
            } else {
                warn!(
                    symbol = %pool.symbol,
                    withdrawal_wallet = %stake.withdrawal_wallet,
                    "rewards go to a separate withdrawal wallet, claiming without re-deposit"
                );
            }
        }
        Ok(Some((ctx, operations)))
    }

    async fn lookup_table(
        &self,
        seeds: &[Pubkey],
        prepared: &[PreparedPool],
    ) -> Option<AddressLookupTableAccount> {
        if !self.config.lookup_table.enabled {
            return None;
        }
        let store = self.store?;

        let mut seen = HashSet::new();
        let referenced: Vec<Pubkey> = prepared
            .iter()
            .filter_map(|p| p.operations.as_ref().ok())
            .flatten()
            .flat_map(|op| op.instruction.accounts.iter().map(|meta| meta.pubkey))
            .filter(|key| seen.insert(*key))
            .collect();

        let manager = LookupTableManager::new(
            self.rpc,
            store,
            &self.config.lookup_table,
            &self.config.poll,
        );
        match manager.ensure(self.signer, seeds, &referenced).await {
            Ok(table) => {
                debug!(table = %table.key, entries = table.addresses.len(), "using lookup table");
                Some(table)
            }
            Err(e) => {
                warn!(error = %e, "lookup table unavailable, using smaller batches");
                None
            }
        }
    }

    async fn execute(
        &self,
        step: &mut BatchStep,
        chunk: Vec<PreparedPool>,
        table: Option<&AddressLookupTableAccount>,
        report: &mut (dyn FnMut(BatchPhase, Option<Signature>) + Send),
    ) -> Result<TxOutcome> {
        step.status = BatchStepStatus::Building;
        report(BatchPhase::Building, None);

        let mut operations = Vec::new();
        let mut first_error = None;
        for prepared in chunk {
            match prepared.operations {
                Ok(ops) => operations.extend(ops),
                Err(e) => {
                    step.failed_pools.push(PoolFailure {
                        pool: prepared.pool,
                        error: e.to_string(),
                    });
                    first_error.get_or_insert(e);
                }
            }
        }
        if operations.is_empty() {
            // Chunks are never empty, so every pool failed
            return Err(first_error.unwrap_or_else(|| {
                ClientError::InvalidInput("batch chunk has no operations".into())
            }));
        }
        let required: Vec<RequiredAccount> = operations
            .iter()
            .flat_map(|op| op.required_accounts.iter().copied())
            .collect();
        let mut instructions = compute_budget_instructions(
            self.config.compute_units_per_operation,
            operations.len(),
            self.config.compute_unit_price_micro_lamports,
        );
        instructions.extend(
            with_destination_accounts(
                self.rpc,
                &self.signer.pubkey(),
                &required,
                operations.into_iter().map(|op| op.instruction),
            )
            .await?,
        );
        let blockhash = self.rpc.get_latest_blockhash().await?;

        step.status = BatchStepStatus::Signing;
        report(BatchPhase::Signing, None);
        let tables: &[AddressLookupTableAccount] = table.map(std::slice::from_ref).unwrap_or(&[]);
        let tx = build_versioned_transaction(self.signer, &instructions, tables, blockhash)?;

        let signature = tx.signatures.first().copied();
        step.signature = signature;
        step.status = BatchStepStatus::Confirming;
        report(BatchPhase::Confirming, signature);
        send_and_confirm(self.rpc, &tx, &self.config.poll).await
    }

    fn is_paused(&self) -> bool {
        self.pause
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(14, 6, &[6, 6, 2] ; "claim with table")]
    #[test_case(14, 2, &[2, 2, 2, 2, 2, 2, 2] ; "claim without table")]
    #[test_case(5, 3, &[3, 2] ; "compound with table")]
    #[test_case(3, 1, &[1, 1, 1] ; "compound without table")]
    #[test_case(0, 6, &[] ; "empty")]
    #[test_case(6, 6, &[6] ; "exact fit")]
    fn test_partition_sizes(n: usize, budget: usize, expected: &[usize]) {
        let items: Vec<usize> = (0..n).collect();
        let chunks = partition(items.clone(), budget);
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, expected);
        assert_eq!(chunks.len(), n.div_ceil(budget));
        assert_eq!(chunks.concat(), items);
    }

    #[test]
    fn test_partition_zero_budget_treated_as_one() {
        assert_eq!(partition(vec![1, 2], 0), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_budgets() {
        let config = BatchConfig::default();
        assert_eq!(BatchKind::Claim.pools_per_transaction(true, &config), 6);
        assert_eq!(BatchKind::Claim.pools_per_transaction(false, &config), 2);
        assert_eq!(BatchKind::Compound.pools_per_transaction(true, &config), 3);
        assert_eq!(BatchKind::Compound.pools_per_transaction(false, &config), 1);
    }
}
