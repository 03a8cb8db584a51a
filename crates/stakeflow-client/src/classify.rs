//! Error text classification.
//!
//! The ledger reports failures as free text. All substring matching against
//! that text lives here; call sites only ever see an [`ErrorClass`].

use std::str::FromStr;

use solana_sdk::signature::Signature;
use stakeflow_interface::StakingProgramError;
use strum::IntoEnumIterator;

use crate::error::{ClientError, RejectionReason};

/// Tagged result of classifying a ledger error message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The transaction was already processed
    DuplicateSubmission,
    /// The program or runtime rejected the transaction
    Rejected(RejectionReason),
    /// Transport-level failure with no execution verdict
    Transport,
}

const DUPLICATE_MARKERS: &[&str] = &[
    "already been processed",
    "alreadyprocessed",
    "already processed",
];

const BLOCKHASH_MARKERS: &[&str] = &[
    "blockhash not found",
    "block height exceeded",
    "blockhashnotfound",
];

const CUSTOM_ERROR_MARKER: &str = "custom program error: 0x";

// Checked in order; the first match wins.
const REASON_MARKERS: &[(&str, RejectionReason)] = &[
    ("lockup", RejectionReason::LockupNotExpired),
    ("paused", RejectionReason::PoolPaused),
    ("insufficient", RejectionReason::InsufficientBalance),
    ("unauthorized", RejectionReason::Unauthorized),
    ("constrainthasone", RejectionReason::Unauthorized),
    ("constraintsigner", RejectionReason::Unauthorized),
    ("missing required signature", RejectionReason::Unauthorized),
];

const EXECUTION_MARKERS: &[&str] = &[
    "error processing instruction",
    "transaction simulation failed",
    "instructionerror",
    "program failed",
];

/// Classify ledger error text.
pub fn classify(text: &str) -> ErrorClass {
    let lower = text.to_ascii_lowercase();

    if DUPLICATE_MARKERS.iter().any(|m| lower.contains(m)) {
        return ErrorClass::DuplicateSubmission;
    }
    if BLOCKHASH_MARKERS.iter().any(|m| lower.contains(m)) {
        return ErrorClass::Rejected(RejectionReason::BlockhashExpired);
    }
    if let Some(error) = program_error_code(&lower).or_else(|| program_error_message(&lower)) {
        return ErrorClass::Rejected(reason_for_program_error(error));
    }
    if let Some((_, reason)) = REASON_MARKERS.iter().find(|(m, _)| lower.contains(m)) {
        return ErrorClass::Rejected(*reason);
    }
    if lower.contains(CUSTOM_ERROR_MARKER) || EXECUTION_MARKERS.iter().any(|m| lower.contains(m))
    {
        return ErrorClass::Rejected(RejectionReason::Other);
    }
    ErrorClass::Transport
}

/// Turn error text into the matching [`ClientError`].
pub fn error_from_text(text: impl Into<String>) -> ClientError {
    let text = text.into();
    match classify(&text) {
        ErrorClass::DuplicateSubmission => ClientError::DuplicateSubmission(text),
        ErrorClass::Rejected(reason) => ClientError::rejected(reason, text),
        ErrorClass::Transport => ClientError::Rpc(text),
    }
}

/// Error text for an on-ledger execution failure.
///
/// Anything reported against a landed transaction is a rejection, even when
/// the text is not recognised.
pub fn rejection_from_text(text: impl Into<String>) -> ClientError {
    let text = text.into();
    let reason = match classify(&text) {
        ErrorClass::Rejected(reason) => reason,
        ErrorClass::DuplicateSubmission | ErrorClass::Transport => RejectionReason::Other,
    };
    ClientError::rejected(reason, text)
}

/// Find a transaction signature embedded in error text.
pub fn recover_signature(text: &str) -> Option<Signature> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| (64..=88).contains(&token.len()))
        .find_map(|token| Signature::from_str(token).ok())
}

fn program_error_code(lower: &str) -> Option<StakingProgramError> {
    let start = lower.find(CUSTOM_ERROR_MARKER)? + CUSTOM_ERROR_MARKER.len();
    let hex: String = lower[start..]
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect();
    let code = u32::from_str_radix(&hex, 16).ok()?;
    StakingProgramError::from_u32(code)
}

// Logged messages are matched case-insensitively, like every other marker.
fn program_error_message(lower: &str) -> Option<StakingProgramError> {
    StakingProgramError::iter().find(|error| lower.contains(&error.message().to_ascii_lowercase()))
}

fn reason_for_program_error(error: StakingProgramError) -> RejectionReason {
    match error {
        StakingProgramError::LockupNotExpired => RejectionReason::LockupNotExpired,
        StakingProgramError::DepositsPaused
        | StakingProgramError::WithdrawalsPaused
        | StakingProgramError::ClaimsPaused
        | StakingProgramError::PoolEnded => RejectionReason::PoolPaused,
        StakingProgramError::InsufficientStake | StakingProgramError::InsufficientRewards => {
            RejectionReason::InsufficientBalance
        }
        StakingProgramError::Unauthorized | StakingProgramError::InvalidWithdrawalWallet => {
            RejectionReason::Unauthorized
        }
        StakingProgramError::InvalidAmount
        | StakingProgramError::ReflectionsDisabled
        | StakingProgramError::MathOverflow
        | StakingProgramError::InvalidReferrer => RejectionReason::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Transaction simulation failed: This transaction has already been processed" ; "simulation")]
    #[test_case("RPC response error -32002: AlreadyProcessed" ; "variant name")]
    fn test_duplicate_detected(text: &str) {
        assert_eq!(classify(text), ErrorClass::DuplicateSubmission);
    }

    #[test_case("Error processing Instruction 1: custom program error: 0x1770", RejectionReason::LockupNotExpired ; "lockup code")]
    #[test_case("Error processing Instruction 0: custom program error: 0x1772", RejectionReason::PoolPaused ; "withdrawals paused code")]
    #[test_case("Error processing Instruction 0: custom program error: 0x1775", RejectionReason::InsufficientBalance ; "rewards code")]
    #[test_case("Program log: Error: Lockup period has not expired", RejectionReason::LockupNotExpired ; "lockup text")]
    #[test_case("Program log: Deposits are paused", RejectionReason::PoolPaused ; "paused text")]
    #[test_case("Transfer: insufficient funds", RejectionReason::InsufficientBalance ; "insufficient text")]
    #[test_case("AnchorError caused by account: stake. Error Code: ConstraintHasOne", RejectionReason::Unauthorized ; "has one")]
    #[test_case("Program log: AnchorError occurred. Error Message: Pool has ended.", RejectionReason::PoolPaused ; "pool ended message")]
    #[test_case("Program log: Error Message: Invalid withdrawal wallet", RejectionReason::Unauthorized ; "withdrawal wallet message")]
    #[test_case("Program log: Error Message: Math overflow", RejectionReason::Other ; "overflow message")]
    #[test_case("Blockhash not found", RejectionReason::BlockhashExpired ; "blockhash")]
    #[test_case("Error processing Instruction 0: custom program error: 0x1", RejectionReason::Other ; "unknown code")]
    fn test_rejection_reasons(text: &str, expected: RejectionReason) {
        assert_eq!(classify(text), ErrorClass::Rejected(expected));
    }

    #[test]
    fn test_transport_error() {
        assert_eq!(classify("error sending request: connection refused"), ErrorClass::Transport);
        assert!(matches!(
            error_from_text("connection reset"),
            ClientError::Rpc(_)
        ));
    }

    #[test]
    fn test_rejection_from_unknown_text_is_other() {
        let err = rejection_from_text("something odd");
        assert_eq!(err.rejection_reason(), Some(RejectionReason::Other));
    }

    #[test]
    fn test_recover_signature() {
        let signature = Signature::from([7u8; 64]);
        let text = format!("This transaction has already been processed: {signature}.");
        assert_eq!(recover_signature(&text), Some(signature));
    }

    #[test]
    fn test_recover_signature_absent() {
        assert_eq!(
            recover_signature("This transaction has already been processed"),
            None
        );
    }
}
