//! Shared test helpers for stakeflow-client tests.

#![allow(dead_code, unused_imports)]

pub mod ledger;
pub mod mock_accounts;
pub mod pda;
pub mod setup;

pub use ledger::*;
pub use mock_accounts::*;
pub use pda::*;
pub use setup::*;
