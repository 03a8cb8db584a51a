//! Stake sync collaborator.
//!
//! After a deposit or withdraw lands, an external service is told so it can
//! refresh its copy of the stake. The call is fire-and-forget: failures are
//! logged and never reach the caller.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// What changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncAction {
    /// Principal was deposited
    Deposit,
    /// Principal was withdrawn
    Withdraw,
}

/// Body of a sync request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StakeSyncEvent {
    /// Stake owner
    pub wallet: String,
    /// Staked mint
    pub mint: String,
    /// Pool index under the mint
    pub pool_index: u64,
    /// What changed
    pub action: SyncAction,
    /// Transaction signature, when known
    pub signature: Option<String>,
}

impl StakeSyncEvent {
    /// Event for a landed operation.
    pub fn new(
        wallet: &Pubkey,
        mint: &Pubkey,
        pool_index: u64,
        action: SyncAction,
        signature: Option<&Signature>,
    ) -> Self {
        Self {
            wallet: wallet.to_string(),
            mint: mint.to_string(),
            pool_index,
            action,
            signature: signature.map(ToString::to_string),
        }
    }
}

/// Receives stake changes.
#[async_trait]
pub trait StakeSync: Send + Sync {
    /// Report one change.
    async fn sync_stake(&self, event: &StakeSyncEvent) -> Result<()>;
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStakeSync;

#[async_trait]
impl StakeSync for NoopStakeSync {
    async fn sync_stake(&self, _event: &StakeSyncEvent) -> Result<()> {
        Ok(())
    }
}

/// POSTs each event as JSON to a fixed URL.
#[derive(Clone, Debug)]
pub struct HttpStakeSync {
    client: reqwest::Client,
    url: String,
}

impl HttpStakeSync {
    /// Sync to `url`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SYNC_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl StakeSync for HttpStakeSync {
    async fn sync_stake(&self, event: &StakeSyncEvent) -> Result<()> {
        self.client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ClientError::Rpc(format!("stake sync: {e}")))?;
        debug!(url = %self.url, action = %event.action, "stake synced");
        Ok(())
    }
}

/// Report `event`, logging and swallowing any failure.
pub async fn sync_quietly(sync: &dyn StakeSync, event: StakeSyncEvent) {
    if let Err(e) = sync.sync_stake(&event).await {
        warn!(
            wallet = %event.wallet,
            mint = %event.mint,
            pool_index = event.pool_index,
            error = %e,
            "stake sync failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let event = StakeSyncEvent::new(&wallet, &mint, 3, SyncAction::Withdraw, None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["wallet"], wallet.to_string());
        assert_eq!(json["mint"], mint.to_string());
        assert_eq!(json["pool_index"], 3);
        assert_eq!(json["action"], "withdraw");
        assert!(json["signature"].is_null());
    }
}
