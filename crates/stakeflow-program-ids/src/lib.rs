//! Single source of truth for the Stakeflow staking program ID.
//!
//! The staking program is deployed externally; this crate only pins which
//! deployment the client talks to. IDs are `&'static str` constants so they
//! can be decoded at compile time by downstream crates.
//!
//! # Feature Flags
//!
//! - `devnet` - Use the devnet deployment
//! - `mainnet` - Use the mainnet deployment (default)
//! - `localnet` - Use the localnet deployment (same as mainnet)
//!
//! # Usage
//!
//! ```rust,ignore
//! pub const STAKING_PROGRAM_ID: Pubkey =
//!     Pubkey::new_from_array(five8_const::decode_32_const(stakeflow_program_ids::STAKING_PROGRAM_ID));
//! ```

#![no_std]

// =============================================================================
// Staking Program ID
// =============================================================================

/// Staking program ID (devnet).
///
/// Multi-pool staking program: deposits, withdrawals, reward and reflection claims.
#[cfg(feature = "devnet")]
pub const STAKING_PROGRAM_ID: &str = "A1ryGLDpGpBRwjHtbFg3Gbz2msPVCzqDzkajRAMpdZvz";

/// Staking program ID (mainnet/localnet).
///
/// Multi-pool staking program: deposits, withdrawals, reward and reflection claims.
#[cfg(not(feature = "devnet"))]
pub const STAKING_PROGRAM_ID: &str = "37EkDyYbaR4couyBySjYfW2nCDqyTnP9v2Jq1acX1cQR";

// =============================================================================
// Network name
// =============================================================================

/// Name of the network the IDs were compiled for, logged by the CLI at startup.
#[cfg(feature = "devnet")]
pub const NETWORK: &str = "devnet";

/// Name of the network the IDs were compiled for, logged by the CLI at startup.
#[cfg(all(feature = "localnet", not(feature = "devnet")))]
pub const NETWORK: &str = "localnet";

/// Name of the network the IDs were compiled for, logged by the CLI at startup.
#[cfg(not(any(feature = "devnet", feature = "localnet")))]
pub const NETWORK: &str = "mainnet";
