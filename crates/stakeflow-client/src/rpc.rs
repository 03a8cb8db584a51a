//! Ledger RPC seam.
//!
//! Everything the client needs from a node, as one async trait. The
//! production implementation wraps the nonblocking [`RpcClient`]; tests use an
//! in-memory ledger.

use async_trait::async_trait;
use solana_client::client_error::ClientError as RpcClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tracing::debug;

use crate::classify::error_from_text;
use crate::error::Result;

/// Accounts per `getMultipleAccounts` request.
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;

/// Status of a submitted signature at the client's commitment level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureState {
    /// Unknown to the node, or not yet at the requested commitment
    Pending,
    /// Landed without error at the requested commitment
    Confirmed,
    /// Landed with an execution error
    Failed(String),
}

/// Remote ledger operations used by the client.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Fetch one account; `None` when it does not exist.
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>>;

    /// Fetch many accounts, in input order.
    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<Account>>>;

    /// Latest blockhash for a new transaction.
    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// Current slot.
    async fn get_slot(&self) -> Result<u64>;

    /// Submit a signed transaction.
    async fn send_transaction(&self, transaction: &VersionedTransaction) -> Result<Signature>;

    /// Status of one signature.
    async fn get_signature_status(&self, signature: &Signature) -> Result<SignatureState>;
}

fn rpc_error(err: RpcClientError) -> crate::error::ClientError {
    error_from_text(err.to_string())
}

#[async_trait]
impl LedgerRpc for RpcClient {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        let response = self
            .get_account_with_commitment(address, self.commitment())
            .await
            .map_err(rpc_error)?;
        Ok(response.value)
    }

    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<Account>>> {
        let mut accounts = Vec::with_capacity(addresses.len());
        for chunk in addresses.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let fetched = RpcClient::get_multiple_accounts(self, chunk)
                .await
                .map_err(rpc_error)?;
            accounts.extend(fetched);
        }
        Ok(accounts)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        RpcClient::get_latest_blockhash(self).await.map_err(rpc_error)
    }

    async fn get_slot(&self) -> Result<u64> {
        RpcClient::get_slot(self).await.map_err(rpc_error)
    }

    async fn send_transaction(&self, transaction: &VersionedTransaction) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            preflight_commitment: Some(self.commitment().commitment),
            ..RpcSendTransactionConfig::default()
        };
        let signature = self
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(rpc_error)?;
        debug!(%signature, "transaction submitted");
        Ok(signature)
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<SignatureState> {
        let response = self
            .get_signature_statuses(&[*signature])
            .await
            .map_err(rpc_error)?;
        let Some(Some(status)) = response.value.into_iter().next() else {
            return Ok(SignatureState::Pending);
        };
        if let Some(err) = &status.err {
            return Ok(SignatureState::Failed(err.to_string()));
        }
        if status.satisfies_commitment(self.commitment()) {
            Ok(SignatureState::Confirmed)
        } else {
            Ok(SignatureState::Pending)
        }
    }
}
