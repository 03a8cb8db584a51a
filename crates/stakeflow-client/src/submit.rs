//! Idempotent submission.
//!
//! A submission call can report failure for a transaction that landed, most
//! often "already processed" after a retry. Such errors are resolved into a
//! normal outcome instead of surfacing as failures.

use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tracing::{info, warn};

use crate::classify::{ErrorClass, classify, recover_signature};
use crate::config::PollConfig;
use crate::confirm::{Confirmation, wait_for_confirmation};
use crate::error::{ClientError, Result};
use crate::rpc::LedgerRpc;

/// Message returned when a duplicate carries no signature.
pub const REFRESH_TO_VERIFY: &str =
    "Transaction may have already been processed. Refresh to verify.";

/// Outcome of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// Landed and confirmed
    Confirmed(Signature),
    /// Submitted but not confirmed within the polling window
    Unconfirmed(Signature),
    /// Reported as a duplicate with no recoverable signature
    NeedsRefresh(String),
}

impl TxOutcome {
    /// Signature, when known.
    pub fn signature(&self) -> Option<Signature> {
        match self {
            Self::Confirmed(sig) | Self::Unconfirmed(sig) => Some(*sig),
            Self::NeedsRefresh(_) => None,
        }
    }

    /// Whether the transaction is known to have landed.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

impl From<(Signature, Confirmation)> for TxOutcome {
    fn from((signature, confirmation): (Signature, Confirmation)) -> Self {
        match confirmation {
            Confirmation::Confirmed => Self::Confirmed(signature),
            Confirmation::Unconfirmed => Self::Unconfirmed(signature),
        }
    }
}

/// Submit a signed transaction and wait for confirmation.
pub async fn send_and_confirm<R: LedgerRpc + ?Sized>(
    rpc: &R,
    transaction: &VersionedTransaction,
    poll: &PollConfig,
) -> Result<TxOutcome> {
    let signature = match rpc.send_transaction(transaction).await {
        Ok(signature) => signature,
        Err(err) => return recover_submission(rpc, err, poll).await,
    };
    let confirmation = wait_for_confirmation(rpc, &signature, poll).await?;
    Ok(TxOutcome::from((signature, confirmation)))
}

async fn recover_submission<R: LedgerRpc + ?Sized>(
    rpc: &R,
    err: ClientError,
    poll: &PollConfig,
) -> Result<TxOutcome> {
    let payload = match err {
        ClientError::DuplicateSubmission(payload) => payload,
        ClientError::Rpc(text) if classify(&text) == ErrorClass::DuplicateSubmission => text,
        other => return Err(other),
    };

    match recover_signature(&payload) {
        Some(signature) => {
            info!(%signature, "duplicate submission, continuing with recovered signature");
            let confirmation = wait_for_confirmation(rpc, &signature, poll).await?;
            Ok(TxOutcome::from((signature, confirmation)))
        }
        None => {
            warn!(error = %payload, "duplicate submission without signature");
            Ok(TxOutcome::NeedsRefresh(REFRESH_TO_VERIFY.to_string()))
        }
    }
}
