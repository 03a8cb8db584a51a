//! Client configuration.
//!
//! Loaded from a JSON file where every field is optional, then overridden by
//! environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Overrides `rpc_url`.
pub const ENV_RPC_URL: &str = "STAKEFLOW_RPC_URL";
/// Overrides `sync_url`.
pub const ENV_SYNC_URL: &str = "STAKEFLOW_SYNC_URL";
/// Overrides `dust_amount`.
pub const ENV_DUST: &str = "STAKEFLOW_DUST";

/// Raw units left behind on a close-out unstake.
pub const DEFAULT_DUST_AMOUNT: u64 = 100_000_000;

/// Top-level client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Commitment level used for reads and confirmation
    pub commitment: String,
    /// Staking program id; the compiled-in network id when unset
    pub program_id: Option<String>,
    /// Stake-sync endpoint; sync is disabled when unset
    pub sync_url: Option<String>,
    /// Raw units retained on a close-out unstake
    pub dust_amount: u64,
    /// Compute units requested per pool operation in a batch
    pub compute_units_per_operation: u32,
    /// Optional priority fee
    pub compute_unit_price_micro_lamports: Option<u64>,
    /// Batch sizing and pacing
    pub batch: BatchConfig,
    /// Confirmation polling
    pub poll: PollConfig,
    /// Lookup-table handling
    pub lookup_table: LookupTableConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            program_id: None,
            sync_url: None,
            dust_amount: DEFAULT_DUST_AMOUNT,
            compute_units_per_operation: 120_000,
            compute_unit_price_micro_lamports: None,
            batch: BatchConfig::default(),
            poll: PollConfig::default(),
            lookup_table: LookupTableConfig::default(),
        }
    }
}

/// Pools per transaction and pacing between transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Claim batch size when a lookup table is available
    pub claim_pools_with_table: usize,
    /// Claim batch size without a lookup table
    pub claim_pools_without_table: usize,
    /// Compound batch size when a lookup table is available
    pub compound_pools_with_table: usize,
    /// Compound batch size without a lookup table
    pub compound_pools_without_table: usize,
    /// Pause between transactions
    pub inter_batch_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            claim_pools_with_table: 6,
            claim_pools_without_table: 2,
            compound_pools_with_table: 3,
            compound_pools_without_table: 1,
            inter_batch_delay_ms: 500,
        }
    }
}

impl BatchConfig {
    /// Delay inserted between transactions.
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }
}

/// Signature-status polling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between status checks
    pub interval_ms: u64,
    /// Status checks before giving up
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            max_attempts: 30,
        }
    }
}

impl PollConfig {
    /// Delay between status checks.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Lookup-table handling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupTableConfig {
    /// Use (and create) a lookup table for batches
    pub enabled: bool,
    /// Where table addresses are persisted
    pub store_path: PathBuf,
    /// Wait after create/extend before the table is referenced
    pub activation_delay_ms: u64,
    /// Addresses per extend transaction
    pub extend_chunk_size: usize,
}

impl Default for LookupTableConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store_path: PathBuf::from(".stakeflow/lookup_tables.json"),
            activation_delay_ms: 1_000,
            extend_chunk_size: 20,
        }
    }
}

impl LookupTableConfig {
    /// Activation wait.
    pub fn activation_delay(&self) -> Duration {
        Duration::from_millis(self.activation_delay_ms)
    }
}

impl ClientConfig {
    /// Load from a JSON file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("reading {}: {e}", path.display())))?;
        let mut config: Self = serde_json::from_str(&raw)
            .map_err(|e| ClientError::Config(format!("parsing {}: {e}", path.display())))?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `STAKEFLOW_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_RPC_URL) {
            debug!(rpc_url = %url, "rpc url overridden from environment");
            self.rpc_url = url;
        }
        if let Some(url) = lookup(ENV_SYNC_URL) {
            self.sync_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(dust) = lookup(ENV_DUST) {
            self.dust_amount = dust
                .trim()
                .parse()
                .map_err(|e| ClientError::Config(format!("{ENV_DUST}={dust}: {e}")))?;
        }
        Ok(())
    }

    /// Staking program id, from config or the compiled-in network id.
    pub fn program_id(&self) -> Result<Pubkey> {
        match &self.program_id {
            Some(id) => Pubkey::from_str(id)
                .map_err(|e| ClientError::Config(format!("program_id {id}: {e}"))),
            None => Ok(stakeflow_interface::STAKING_PROGRAM_ID),
        }
    }

    /// Parsed commitment level.
    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|e| ClientError::Config(format!("commitment {}: {e}", self.commitment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"rpc_url":"http://localhost:8899","batch":{"claim_pools_with_table":4}}"#)
                .unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8899");
        assert_eq!(config.batch.claim_pools_with_table, 4);
        assert_eq!(config.batch.claim_pools_without_table, 2);
        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.dust_amount, DEFAULT_DUST_AMOUNT);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_RPC_URL, "http://rpc.example"),
            (ENV_SYNC_URL, "http://sync.example/stakes"),
            (ENV_DUST, "42"),
        ]
        .into_iter()
        .collect();
        let mut config = ClientConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.rpc_url, "http://rpc.example");
        assert_eq!(config.sync_url.as_deref(), Some("http://sync.example/stakes"));
        assert_eq!(config.dust_amount, 42);
    }

    #[test]
    fn test_bad_dust_override() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_overrides(|k| (k == ENV_DUST).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_program_id_default_and_override() {
        let mut config = ClientConfig::default();
        assert_eq!(config.program_id().unwrap(), stakeflow_interface::STAKING_PROGRAM_ID);

        let custom = Pubkey::new_unique();
        config.program_id = Some(custom.to_string());
        assert_eq!(config.program_id().unwrap(), custom);

        config.program_id = Some("not-a-key".to_string());
        assert!(config.program_id().is_err());
    }

    #[test]
    fn test_commitment_parse() {
        let config = ClientConfig::default();
        assert_eq!(config.commitment_config().unwrap(), CommitmentConfig::confirmed());
    }
}
