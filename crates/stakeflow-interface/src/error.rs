//! Staking program error codes.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Anchor offsets user-defined error codes by this value.
pub const CUSTOM_ERROR_OFFSET: u32 = 6000;

/// Error codes returned by the staking program.
///
/// These are matched by the client's error classifier to turn an opaque
/// `custom program error: 0x...` into a user-facing rejection reason.
#[repr(u32)]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    IntoPrimitive,
    TryFromPrimitive,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
pub enum StakingProgramError {
    /// Stake is still inside its lockup window
    LockupNotExpired = 6000,
    /// Deposits are paused on this project
    DepositsPaused = 6001,
    /// Withdrawals are paused on this project
    WithdrawalsPaused = 6002,
    /// Claims are paused on this project
    ClaimsPaused = 6003,
    /// Withdraw amount exceeds staked amount
    InsufficientStake = 6004,
    /// Reward vault cannot cover the claim
    InsufficientRewards = 6005,
    /// Signer is not allowed to perform this action
    Unauthorized = 6006,
    /// Amount is zero or out of range
    InvalidAmount = 6007,
    /// Pool duration has elapsed
    PoolEnded = 6008,
    /// Project has no reflection vault
    ReflectionsDisabled = 6009,
    /// Arithmetic overflow in settlement
    MathOverflow = 6010,
    /// Referrer account does not match the project
    InvalidReferrer = 6011,
    /// Withdrawal wallet does not match the stake record
    InvalidWithdrawalWallet = 6012,
}

impl StakingProgramError {
    /// Convert to error code
    pub fn to_u32(self) -> u32 {
        self.into()
    }

    /// Create from error code
    pub fn from_u32(code: u32) -> Option<Self> {
        Self::try_from(code).ok()
    }

    /// Human readable message, as the program logs it.
    ///
    /// Used to recognise a rejection from program logs when no error code is
    /// present in the text.
    pub fn message(self) -> &'static str {
        match self {
            Self::LockupNotExpired => "Lockup period has not expired",
            Self::DepositsPaused => "Deposits are paused",
            Self::WithdrawalsPaused => "Withdrawals are paused",
            Self::ClaimsPaused => "Claims are paused",
            Self::InsufficientStake => "Insufficient staked balance",
            Self::InsufficientRewards => "Insufficient rewards in vault",
            Self::Unauthorized => "Unauthorized",
            Self::InvalidAmount => "Invalid amount",
            Self::PoolEnded => "Pool has ended",
            Self::ReflectionsDisabled => "Reflections are not enabled",
            Self::MathOverflow => "Math overflow",
            Self::InvalidReferrer => "Invalid referrer",
            Self::InvalidWithdrawalWallet => "Invalid withdrawal wallet",
        }
    }
}
