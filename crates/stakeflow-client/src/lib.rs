//! Stakeflow Staking Client
//!
//! Transaction orchestration for the Stakeflow multi-pool staking program:
//! resolves accounts from ledger state, builds instructions, packs batches
//! through an address lookup table, submits, and confirms by polling.
//!
//! # Flow
//!
//! ```text
//! caller ──► StakingClient
//!              │
//!              ├── single operation ──► PoolContext ──► builder ──┐
//!              │                                                   │
//!              └── batch ──► BatchRunner ──► LookupTableManager ───┤
//!                                                                  ▼
//!                             destination accounts + compute budget
//!                                                                  │
//!                                            sign ──► send_and_confirm
//!                                                      │         │
//!                                       duplicate recovery   wait_for_confirmation
//! ```
//!
//! # Modules
//!
//! - [`address`]: Deterministic address derivation
//! - [`token_program`]: Token-program variant detection
//! - [`rates`]: APY/APR and pending reward conversion
//! - [`amounts`]: Withdraw amount resolution
//! - [`builders`]: Single-operation instruction builders
//! - [`accounts`]: Destination-account creation
//! - [`lookup_table`]: Lookup table discovery, creation and extension
//! - [`batch`]: Batch orchestration
//! - [`confirm`]: Confirmation polling
//! - [`submit`]: Idempotent submission
//! - [`classify`]: Error text classification
//! - [`sync`]: Stake sync collaborator
//! - [`config`]: Configuration
//! - [`rpc`]: Ledger RPC seam

pub mod accounts;
pub mod address;
pub mod amounts;
pub mod batch;
pub mod builders;
pub mod classify;
mod client;
pub mod config;
pub mod confirm;
mod error;
pub mod lookup_table;
pub mod rates;
pub mod rpc;
pub mod submit;
pub mod sync;
pub mod token_program;
pub mod transaction;

pub use batch::{
    BatchKind, BatchPhase, BatchProgress, BatchStep, BatchStepStatus, PoolFailure, PoolRef,
};
pub use client::{ProjectInfo, StakingClient};
pub use config::ClientConfig;
pub use error::{ClientError, RejectionReason, Result};
pub use rpc::{LedgerRpc, SignatureState};
pub use submit::TxOutcome;

pub use stakeflow_interface as interface;
