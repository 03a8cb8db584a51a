//! Client error type.

use solana_sdk::pubkey::Pubkey;
use stakeflow_interface::AccountDecodeError;
use thiserror::Error;

/// Short, user-facing classification of an on-ledger rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RejectionReason {
    /// Stake is still inside its lockup window
    LockupNotExpired,
    /// The pool has the relevant operation paused
    PoolPaused,
    /// Balance, stake or vault cannot cover the amount
    InsufficientBalance,
    /// The program refused the signer
    Unauthorized,
    /// The transaction's blockhash expired before it landed
    BlockhashExpired,
    /// Anything the classifier does not recognise
    Other,
}

/// Errors raised by the staking client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A referenced account does not exist
    #[error("account not found: {0}")]
    NotFound(Pubkey),

    /// No wallet connected, or the signer lacks the required authority
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The ledger reports the transaction was already processed
    #[error("duplicate submission: {0}")]
    DuplicateSubmission(String),

    /// The program (or runtime) rejected the transaction
    #[error("transaction rejected ({reason}): {message}")]
    ExecutionRejected {
        /// Classified reason
        reason: RejectionReason,
        /// Raw error text
        message: String,
    },

    /// Caller supplied an unusable argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport or RPC-level failure
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Account data did not match the expected layout
    #[error("failed to decode account {address}: {source}")]
    Decode {
        /// Account that failed to decode
        address: Pubkey,
        /// Underlying decode failure
        #[source]
        source: AccountDecodeError,
    },

    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Lookup-table store failure
    #[error("lookup table store error: {0}")]
    Store(String),
}

impl ClientError {
    /// Build an `ExecutionRejected` error.
    pub fn rejected(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self::ExecutionRejected {
            reason,
            message: message.into(),
        }
    }

    /// Rejection reason, if this is an on-ledger rejection.
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            Self::ExecutionRejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Result alias used throughout the client.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
