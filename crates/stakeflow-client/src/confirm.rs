//! Signature confirmation by polling.

use solana_sdk::signature::Signature;
use tracing::{debug, warn};

use crate::classify::rejection_from_text;
use crate::config::PollConfig;
use crate::error::Result;
use crate::rpc::{LedgerRpc, SignatureState};

/// Result of polling a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    /// Reached the requested commitment
    Confirmed,
    /// Attempts exhausted; the transaction may still land
    Unconfirmed,
}

/// Poll until `signature` is confirmed, fails, or attempts run out.
///
/// An execution error on the ledger is returned as `ExecutionRejected`.
/// Transient RPC errors count as a pending attempt.
pub async fn wait_for_confirmation<R: LedgerRpc + ?Sized>(
    rpc: &R,
    signature: &Signature,
    poll: &PollConfig,
) -> Result<Confirmation> {
    for attempt in 1..=poll.max_attempts {
        match rpc.get_signature_status(signature).await {
            Ok(SignatureState::Confirmed) => {
                debug!(%signature, attempt, "transaction confirmed");
                return Ok(Confirmation::Confirmed);
            }
            Ok(SignatureState::Failed(message)) => {
                warn!(%signature, error = %message, "transaction failed on ledger");
                return Err(rejection_from_text(message));
            }
            Ok(SignatureState::Pending) => {}
            Err(e) => {
                warn!(%signature, attempt, error = %e, "signature status check failed");
            }
        }
        if attempt < poll.max_attempts {
            tokio::time::sleep(poll.interval()).await;
        }
    }

    warn!(
        %signature,
        attempts = poll.max_attempts,
        "transaction not confirmed in time, refetch state to verify"
    );
    Ok(Confirmation::Unconfirmed)
}
