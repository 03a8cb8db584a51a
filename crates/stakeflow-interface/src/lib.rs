//! Stakeflow Staking Interface
//!
//! The versioned ABI of the externally deployed staking program, as seen by
//! off-chain clients.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    stakeflow-client                          │
//! │  • Resolves accounts (RPC)                                   │
//! │  • Batches, signs, submits, confirms                         │
//! └─────────────────────────────────────────────────────────────┘
//!               │ uses
//!               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   stakeflow-interface                        │
//! │  • PDA seeds and derivation                                  │
//! │  • Account layouts (PlatformConfig, Project, Stake)          │
//! │  • Instruction encoding and account ordering                 │
//! │  • Program error codes                                       │
//! └─────────────────────────────────────────────────────────────┘
//!               │ describes
//!               ▼
//!        staking program (on-chain, external)
//! ```
//!
//! # Modules
//!
//! - [`pda`]: Seeds and PDA derivation
//! - [`state`]: Account layouts and decoding
//! - [`instructions`]: Instruction builders
//! - [`error`]: Program error codes
//! - [`program_ids`]: Program ID constants

pub mod discriminator;
mod error;
pub mod instructions;
pub mod pda;
mod program_ids;
pub mod state;

pub use error::*;
pub use program_ids::*;
pub use state::{
    AccountDecodeError, PlatformConfig, Project, RateMode, RecordedReflectionVault, Stake,
    StakingAccount,
};
