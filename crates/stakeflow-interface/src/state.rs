//! Read-only account layouts of the staking program.
//!
//! Every account is an 8-byte discriminator followed by the Borsh encoding of
//! the struct. Accounts may be allocated larger than their encoding, so
//! decoding ignores trailing bytes.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::discriminator::{DISCRIMINATOR_LEN, account_discriminator};

// ============================================================================
// Decoding
// ============================================================================

/// Failure to decode account data into a typed record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountDecodeError {
    /// Data is shorter than the discriminator
    TooShort,
    /// Discriminator does not match the expected account type
    DiscriminatorMismatch {
        /// Type that was expected
        expected: &'static str,
    },
    /// Borsh body failed to decode
    InvalidBody(String),
}

impl core::fmt::Display for AccountDecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooShort => write!(f, "account data shorter than discriminator"),
            Self::DiscriminatorMismatch { expected } => {
                write!(f, "account is not a {expected}")
            }
            Self::InvalidBody(e) => write!(f, "invalid account body: {e}"),
        }
    }
}

impl std::error::Error for AccountDecodeError {}

/// A typed account owned by the staking program.
pub trait StakingAccount: BorshDeserialize + Sized {
    /// Anchor type name, used for the discriminator.
    const NAME: &'static str;

    /// Discriminator prefix for this account type.
    fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        account_discriminator(Self::NAME)
    }

    /// Decode account data, checking the discriminator.
    fn try_from_account_data(data: &[u8]) -> Result<Self, AccountDecodeError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(AccountDecodeError::TooShort);
        }
        let (disc, mut body) = data.split_at(DISCRIMINATOR_LEN);
        if disc != Self::discriminator() {
            return Err(AccountDecodeError::DiscriminatorMismatch {
                expected: Self::NAME,
            });
        }
        Self::deserialize(&mut body).map_err(|e| AccountDecodeError::InvalidBody(e.to_string()))
    }
}

// ============================================================================
// Platform Config
// ============================================================================

/// Platform-wide singleton, created externally.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Platform administrator
    pub admin: Pubkey,
    /// Wallet receiving protocol fees
    pub fee_collector: Pubkey,
    /// Deposit fee in basis points
    pub deposit_fee_bps: u16,
    /// Withdrawal fee in basis points
    pub withdraw_fee_bps: u16,
    /// PDA bump
    pub bump: u8,
}

impl StakingAccount for PlatformConfig {
    const NAME: &'static str = "PlatformConfig";
}

// ============================================================================
// Project
// ============================================================================

/// How a project's yield rate is expressed.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum RateMode {
    /// Static APY given by `rate_bps_per_year`
    Fixed = 0,
    /// APR driven by `reward_rate_per_second` over `total_staked`
    Variable = 1,
}

/// Reflection vault and mint as recorded on a project account.
///
/// The only way to obtain one is [`Project::recorded_reflection`], so any
/// instruction taking this type necessarily uses the on-chain address rather
/// than one recomputed from seeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedReflectionVault {
    vault: Pubkey,
    mint: Pubkey,
}

impl RecordedReflectionVault {
    /// Reflection vault token account.
    pub fn vault(&self) -> Pubkey {
        self.vault
    }

    /// Mint of the reflection token.
    pub fn mint(&self) -> Pubkey {
        self.mint
    }
}

/// One yield offering for a `(mint, pool_index)` pair.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Project {
    /// Project administrator
    pub admin: Pubkey,
    /// Staked token mint
    pub mint: Pubkey,
    /// Pool index under the mint
    pub pool_index: u64,
    /// Rate representation
    pub rate_mode: RateMode,
    /// Fixed-mode yearly rate in basis points
    pub rate_bps_per_year: u64,
    /// Variable-mode emission in raw units per second
    pub reward_rate_per_second: u64,
    /// Total principal currently staked (raw units)
    pub total_staked: u64,
    /// Total rewards ever deposited into the reward vault
    pub total_rewards_deposited: u64,
    /// Lockup applied to each stake, in seconds
    pub lockup_seconds: i64,
    /// Pool lifetime in seconds, 0 for open-ended
    pub pool_duration_seconds: i64,
    /// Unix timestamp the pool started
    pub start_time: i64,
    /// Optional referrer receiving a share of fees
    pub referrer: Option<Pubkey>,
    /// Referrer share in basis points
    pub referrer_split_bps: u16,
    reflection_vault: Option<Pubkey>,
    reflection_mint: Option<Pubkey>,
    /// Deposits disabled
    pub deposits_paused: bool,
    /// Withdrawals disabled
    pub withdrawals_paused: bool,
    /// Claims disabled
    pub claims_paused: bool,
    /// PDA bump
    pub bump: u8,
}

impl StakingAccount for Project {
    const NAME: &'static str = "Project";
}

impl Project {
    /// Referrer to append to instructions, if set and non-default.
    pub fn active_referrer(&self) -> Option<Pubkey> {
        self.referrer.filter(|r| *r != Pubkey::default())
    }

    /// Reflection vault and mint recorded on-chain, if the project has reflections.
    pub fn recorded_reflection(&self) -> Option<RecordedReflectionVault> {
        match (self.reflection_vault, self.reflection_mint) {
            (Some(vault), Some(mint)) if vault != Pubkey::default() => {
                Some(RecordedReflectionVault { vault, mint })
            }
            _ => None,
        }
    }
}

// ============================================================================
// Stake
// ============================================================================

/// Per-user, per-project stake record.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Stake {
    /// Stake owner (the signer that created it)
    pub owner: Pubkey,
    /// Project this stake belongs to
    pub project: Pubkey,
    /// Wallet receiving withdrawals and claims
    pub withdrawal_wallet: Pubkey,
    /// Principal staked (raw units)
    pub amount: u64,
    /// Unix timestamp of the last deposit
    pub stake_timestamp: i64,
    /// Accrued, unclaimed rewards (raw units)
    pub pending_rewards: u64,
    /// Accrued, unclaimed reflections (raw units of the reflection mint)
    pub pending_reflections: u64,
    /// Lifetime rewards claimed
    pub total_claimed: u64,
    /// PDA bump
    pub bump: u8,
}

impl StakingAccount for Stake {
    const NAME: &'static str = "Stake";
}

impl Stake {
    /// Whether the record holds any principal.
    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }
}
