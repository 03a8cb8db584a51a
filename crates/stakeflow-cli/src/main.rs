//! Stakeflow CLI - stake, claim and inspect Stakeflow pools
//!
//! Commands:
//! - `stakeflow rate` / `project` / `stake-info` - Read pool and stake state
//! - `stakeflow stake` / `unstake` - Move principal in or out of a pool
//! - `stakeflow claim` / `claim-reflections` - Collect rewards of one pool
//! - `stakeflow batch-claim` / `batch-compound` - Collect across many pools
//! - `stakeflow claim-unclaimed` - Admin withdrawal of undistributed rewards

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, read_keypair_file};
use solana_sdk::signer::Signer;
use stakeflow_client::address::parse_address;
use stakeflow_client::amounts::WithdrawAmount;
use stakeflow_client::lookup_table::FileLookupTableStore;
use stakeflow_client::sync::HttpStakeSync;
use stakeflow_client::{
    BatchProgress, BatchStep, BatchStepStatus, ClientConfig, PoolRef, StakingClient, TxOutcome,
    interface,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stakeflow")]
#[command(about = "Client for the Stakeflow multi-pool staking program")]
struct Cli {
    /// JSON configuration file; defaults plus STAKEFLOW_* variables when absent
    #[arg(short, long, env = "STAKEFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// RPC endpoint, overriding the configuration
    #[arg(long)]
    rpc_url: Option<String>,

    /// Wallet keypair file, required by commands that sign
    #[arg(short, long, env = "STAKEFLOW_KEYPAIR")]
    keypair: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current APY/APR of a pool
    Rate(PoolArgs),
    /// Show a pool's project record and derived addresses
    Project(PoolArgs),
    /// Show a wallet's stake in a pool
    StakeInfo {
        #[command(flatten)]
        pool: PoolArgs,
        /// Stake owner; defaults to the keypair's address
        #[arg(long)]
        owner: Option<String>,
    },
    /// Deposit raw token units into a pool
    Stake {
        #[command(flatten)]
        pool: PoolArgs,
        /// Amount in raw units
        amount: u64,
    },
    /// Withdraw principal; omit the amount to close out the position
    Unstake {
        #[command(flatten)]
        pool: PoolArgs,
        /// Amount in raw units
        amount: Option<u64>,
    },
    /// Claim pending rewards of a pool
    Claim(PoolArgs),
    /// Claim pending reflections of a pool
    ClaimReflections(PoolArgs),
    /// Admin: withdraw undistributed rewards of a pool
    ClaimUnclaimed {
        #[command(flatten)]
        pool: PoolArgs,
        /// Amount in raw units
        amount: u64,
    },
    /// Claim rewards across pools given as MINT:INDEX[:SYMBOL]
    BatchClaim {
        #[arg(required = true, value_parser = parse_pool_ref)]
        pools: Vec<PoolRef>,
    },
    /// Claim and re-deposit rewards across pools given as MINT:INDEX[:SYMBOL]
    BatchCompound {
        #[arg(required = true, value_parser = parse_pool_ref)]
        pools: Vec<PoolRef>,
    },
}

#[derive(clap::Args)]
struct PoolArgs {
    /// Staked token mint
    #[arg(long)]
    mint: String,
    /// Pool index under the mint
    #[arg(long, default_value_t = 0)]
    pool: u64,
}

impl PoolArgs {
    fn mint(&self) -> Result<Pubkey> {
        Ok(parse_address(&self.mint)?)
    }
}

/// Parse `MINT:INDEX[:SYMBOL]`.
fn parse_pool_ref(value: &str) -> Result<PoolRef, String> {
    let mut parts = value.splitn(3, ':');
    let mint = parts.next().unwrap_or_default();
    let mint: Pubkey = mint.parse().map_err(|e| format!("mint {mint}: {e}"))?;
    let index = parts
        .next()
        .ok_or_else(|| format!("{value}: expected MINT:INDEX"))?;
    let index: u64 = index.parse().map_err(|e| format!("pool index {index}: {e}"))?;
    let symbol = parts
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}#{index}", &mint.to_string()[..4]));
    Ok(PoolRef::new(mint, index, symbol))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("stakeflow={default_level},stakeflow_client={default_level}"))),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref(), cli.rpc_url)?;
    let client = build_client(config, cli.keypair.as_deref())?;

    match cli.command {
        Commands::Rate(pool) => {
            let rate = client.get_pool_rate(&pool.mint()?, pool.pool).await?;
            println!("{rate}");
        }
        Commands::Project(pool) => show_project(&client, &pool).await?,
        Commands::StakeInfo { pool, owner } => {
            let owner = match owner {
                Some(owner) => parse_address(&owner)?,
                None => client
                    .wallet()
                    .context("pass --owner or --keypair to choose the stake owner")?,
            };
            show_stake(&client, &pool, &owner).await?;
        }
        Commands::Stake { pool, amount } => {
            let outcome = client.stake(&pool.mint()?, pool.pool, amount).await?;
            print_outcome("stake", &outcome);
        }
        Commands::Unstake { pool, amount } => {
            let outcome = client
                .unstake(&pool.mint()?, pool.pool, WithdrawAmount::from(amount))
                .await?;
            print_outcome("unstake", &outcome);
        }
        Commands::Claim(pool) => {
            let outcome = client.claim_rewards(&pool.mint()?, pool.pool).await?;
            print_outcome("claim", &outcome);
        }
        Commands::ClaimReflections(pool) => {
            let outcome = client.claim_reflections(&pool.mint()?, pool.pool).await?;
            print_outcome("claim reflections", &outcome);
        }
        Commands::ClaimUnclaimed { pool, amount } => {
            let outcome = client
                .claim_unclaimed(&pool.mint()?, pool.pool, amount)
                .await?;
            print_outcome("claim unclaimed", &outcome);
        }
        Commands::BatchClaim { pools } => {
            let steps = client.batch_claim(&pools, log_progress).await?;
            print_steps(&steps)?;
        }
        Commands::BatchCompound { pools } => {
            let steps = client.batch_compound(&pools, log_progress).await?;
            print_steps(&steps)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, rpc_url: Option<String>) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ClientConfig::from_env()?,
    };
    if let Some(url) = rpc_url {
        config.rpc_url = url;
    }
    debug!(rpc_url = %config.rpc_url, commitment = %config.commitment, "configuration loaded");
    Ok(config)
}

fn build_client(config: ClientConfig, keypair: Option<&Path>) -> Result<StakingClient<RpcClient>> {
    let rpc = Arc::new(RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        config.commitment_config()?,
    ));
    let store = Arc::new(FileLookupTableStore::new(&config.lookup_table.store_path));
    let sync = config
        .sync_url
        .clone()
        .map(HttpStakeSync::new)
        .transpose()?;

    let mut client = StakingClient::new(rpc, config)?.with_lookup_store(store);
    info!(
        network = interface::NETWORK,
        program_id = %client.program_id(),
        "staking client ready"
    );
    if let Some(sync) = sync {
        client = client.with_stake_sync(Arc::new(sync));
    }
    if let Some(path) = keypair {
        let signer = load_keypair(path)?;
        info!(wallet = %signer.pubkey(), "wallet connected");
        client = client.with_signer(Arc::new(signer));
    }
    Ok(client)
}

fn load_keypair(path: &Path) -> Result<Keypair> {
    read_keypair_file(path).map_err(|e| anyhow!("Failed to read keypair {}: {e}", path.display()))
}

async fn show_project(client: &StakingClient<RpcClient>, pool: &PoolArgs) -> Result<()> {
    let info = client.get_project_info(&pool.mint()?, pool.pool).await?;
    println!("project:        {}", info.addresses.project);
    println!("staking vault:  {}", info.addresses.staking_vault);
    println!("reward vault:   {}", info.addresses.reward_vault);
    println!("mint:           {} ({}, {} decimals)", info.mint.address, info.mint.program, info.mint.decimals);
    println!("rate:           {}", info.rate);
    println!("total staked:   {}", info.total_staked_ui);
    println!("lockup:         {}s", info.project.lockup_seconds);
    match info.end_time {
        Some(end) => println!("ends at:        {end}"),
        None => println!("ends at:        never"),
    }
    if let Some(referrer) = info.project.active_referrer() {
        println!("referrer:       {referrer}");
    }
    if let Some(recorded) = info.project.recorded_reflection() {
        println!("reflections:    {} (mint {})", recorded.vault(), recorded.mint());
        if info.reflection_vault_matches_seed == Some(false) {
            println!("                recorded vault differs from the seed-derived address");
        }
    }
    let paused: Vec<&str> = [
        (info.project.deposits_paused, "deposits"),
        (info.project.withdrawals_paused, "withdrawals"),
        (info.project.claims_paused, "claims"),
    ]
    .into_iter()
    .filter_map(|(paused, name)| paused.then_some(name))
    .collect();
    if !paused.is_empty() {
        println!("paused:         {}", paused.join(", "));
    }
    Ok(())
}

async fn show_stake(
    client: &StakingClient<RpcClient>,
    pool: &PoolArgs,
    owner: &Pubkey,
) -> Result<()> {
    let mint = pool.mint()?;
    let Some(stake) = client.get_user_stake(&mint, pool.pool, owner).await? else {
        println!("no stake for {owner}");
        return Ok(());
    };
    let pending = client.get_pending_rewards(&mint, pool.pool, owner).await?;
    println!("staked:             {}", stake.amount);
    println!("pending rewards:    {pending}");
    println!("pending reflections: {}", stake.pending_reflections);
    println!("total claimed:      {}", stake.total_claimed);
    println!("withdrawal wallet:  {}", stake.withdrawal_wallet);
    println!("staked at:          {}", stake.stake_timestamp);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?
        .as_secs();
    let now = i64::try_from(now).context("system clock out of range")?;
    if let Some(remaining) = client
        .get_lockup_remaining(&mint, pool.pool, owner, now)
        .await?
    {
        println!("lockup remaining:   {remaining}s");
    }
    Ok(())
}

fn print_outcome(operation: &str, outcome: &TxOutcome) {
    match outcome {
        TxOutcome::Confirmed(signature) => println!("{operation} confirmed: {signature}"),
        TxOutcome::Unconfirmed(signature) => {
            println!("{operation} submitted but not yet confirmed: {signature}");
        }
        TxOutcome::NeedsRefresh(message) => println!("{operation}: {message}"),
    }
}

fn log_progress(progress: BatchProgress) {
    info!(
        batch = progress.batch_index + 1,
        total = progress.total_batches,
        phase = %progress.phase,
        signature = ?progress.signature,
        "batch progress"
    );
}

fn print_steps(steps: &[BatchStep]) -> Result<()> {
    if steps.is_empty() {
        println!("nothing to claim");
        return Ok(());
    }
    for step in steps {
        let pools = step.symbols().join(", ");
        match step.status {
            BatchStepStatus::Success => match (step.signature, &step.note) {
                (Some(signature), None) => println!("[{}] {pools}: {signature}", step.index + 1),
                (signature, note) => println!(
                    "[{}] {pools}: {} ({})",
                    step.index + 1,
                    signature.map(|s| s.to_string()).unwrap_or_default(),
                    note.as_deref().unwrap_or_default()
                ),
            },
            BatchStepStatus::Error => println!(
                "[{}] {pools}: failed: {}",
                step.index + 1,
                step.error.as_deref().unwrap_or("unknown error")
            ),
            status => println!("[{}] {pools}: {status}", step.index + 1),
        }
        if step.status != BatchStepStatus::Error {
            for failure in &step.failed_pools {
                println!("    {} skipped: {}", failure.pool.symbol, failure.error);
            }
        }
    }
    let failed = steps.iter().filter(|s| s.has_failures()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} batch transactions did not cover every pool", steps.len());
    }
    Ok(())
}
