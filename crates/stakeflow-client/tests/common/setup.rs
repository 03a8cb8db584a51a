//! Test environment setup.

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use stakeflow_client::batch::PoolRef;
use stakeflow_client::config::{ClientConfig, PollConfig};
use stakeflow_client::interface::{NATIVE_MINT, PlatformConfig, Stake};
use stakeflow_client::StakingClient;

use super::ledger::MockLedger;
use super::mock_accounts::*;
use super::pda::*;

/// A pool written to the mock ledger.
#[derive(Clone, Debug)]
pub struct TestPool {
    pub mint: Pubkey,
    pub pool_index: u64,
    pub token_program: Pubkey,
    pub project_address: Pubkey,
    pub project: ProjectData,
    pub symbol: String,
}

impl TestPool {
    pub fn pool_ref(&self) -> PoolRef {
        PoolRef::new(self.mint, self.pool_index, self.symbol.clone())
    }
}

/// Ledger, program and a funded user with a connected wallet.
pub struct TestEnv {
    pub ledger: Arc<MockLedger>,
    pub program_id: Pubkey,
    pub user: Arc<Keypair>,
    pub admin: Keypair,
    pub fee_collector: Pubkey,
    pub platform_config: Pubkey,
}

impl TestEnv {
    pub fn new() -> Self {
        let ledger = Arc::new(MockLedger::new());
        let program_id = Pubkey::new_unique();
        let admin = Keypair::new();
        let fee_collector = Pubkey::new_unique();
        let platform_config = find_platform_config(&program_id);
        ledger.set_account(
            platform_config,
            platform_config_account(
                program_id,
                &PlatformConfig {
                    admin: admin.pubkey(),
                    fee_collector,
                    deposit_fee_bps: 50,
                    withdraw_fee_bps: 50,
                    bump: 255,
                },
            ),
        );
        Self {
            ledger,
            program_id,
            user: Arc::new(Keypair::new()),
            admin,
            fee_collector,
            platform_config,
        }
    }

    /// Fast config: no delays, three poll attempts, lookup tables enabled.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig {
            program_id: Some(self.program_id.to_string()),
            poll: PollConfig {
                interval_ms: 0,
                max_attempts: 3,
            },
            ..ClientConfig::default()
        };
        config.batch.inter_batch_delay_ms = 0;
        config.lookup_table.activation_delay_ms = 0;
        config
    }

    pub fn client(&self) -> StakingClient<MockLedger> {
        self.client_with(self.config())
    }

    pub fn client_with(&self, config: ClientConfig) -> StakingClient<MockLedger> {
        StakingClient::new(Arc::clone(&self.ledger), config)
            .unwrap()
            .with_signer(Arc::clone(&self.user))
    }

    /// Pool with a fresh mint owned by `token_program`; token accounts for
    /// the user and fee collector exist.
    pub fn add_pool(&self, token_program: Pubkey, pool_index: u64) -> TestPool {
        let mint = Pubkey::new_unique();
        self.ledger.set_account(mint, mint_account(token_program, 6));
        self.add_pool_for_mint(mint, token_program, pool_index)
    }

    /// Pool over the native mint.
    pub fn add_native_pool(&self, pool_index: u64) -> TestPool {
        let token_program = stakeflow_client::interface::SPL_TOKEN_PROGRAM_ID;
        self.ledger.set_account(NATIVE_MINT, native_mint_account());
        self.add_pool_for_mint(NATIVE_MINT, token_program, pool_index)
    }

    fn add_pool_for_mint(&self, mint: Pubkey, token_program: Pubkey, pool_index: u64) -> TestPool {
        let project_address = find_project(&self.program_id, &mint, pool_index);
        let project = ProjectData::fixed(self.admin.pubkey(), mint, pool_index, 1000);
        self.ledger
            .set_account(project_address, project_account(self.program_id, &project));

        for owner in [self.user.pubkey(), self.fee_collector, self.admin.pubkey()] {
            self.ledger.set_account(
                find_ata(&owner, &mint, &token_program),
                token_account(token_program, &mint, &owner, 0),
            );
        }

        TestPool {
            mint,
            pool_index,
            token_program,
            project_address,
            project,
            symbol: format!("TKN{pool_index}"),
        }
    }

    /// Overwrite a pool's project record.
    pub fn update_project(&self, pool: &mut TestPool, update: impl FnOnce(&mut ProjectData)) {
        update(&mut pool.project);
        self.ledger.set_account(
            pool.project_address,
            project_account(self.program_id, &pool.project),
        );
    }

    pub fn stake_address(&self, pool: &TestPool) -> Pubkey {
        find_stake(&self.program_id, &pool.project_address, &self.user.pubkey())
    }

    /// Write the user's stake record for `pool`.
    pub fn add_stake(&self, pool: &TestPool, amount: u64, pending_rewards: u64) -> Stake {
        let stake = Stake {
            owner: self.user.pubkey(),
            project: pool.project_address,
            withdrawal_wallet: self.user.pubkey(),
            amount,
            stake_timestamp: 1_700_000_000,
            pending_rewards,
            pending_reflections: 0,
            total_claimed: 0,
            bump: 253,
        };
        self.set_stake(pool, &stake);
        stake
    }

    pub fn set_stake(&self, pool: &TestPool, stake: &Stake) {
        self.ledger
            .set_account(self.stake_address(pool), stake_account(self.program_id, stake));
    }
}
