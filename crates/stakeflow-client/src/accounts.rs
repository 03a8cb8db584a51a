//! Destination token accounts.
//!
//! Payout instructions fail if their destination token account does not
//! exist. [`with_destination_accounts`] checks every required destination in
//! one request and prepends an idempotent creation instruction for each
//! missing one, in the same transaction as the target instructions.

use std::collections::HashSet;

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use tracing::debug;

use crate::error::Result;
use crate::rpc::LedgerRpc;
use crate::token_program::MintInfo;

/// An associated token account an instruction writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequiredAccount {
    /// Associated token account address
    pub address: Pubkey,
    /// Wallet owning it
    pub owner: Pubkey,
    /// Mint
    pub mint: Pubkey,
    /// Token program of the mint
    pub token_program: Pubkey,
}

impl RequiredAccount {
    /// Token account of `owner` for `mint`.
    ///
    /// `None` for the native mint, whose operative account is the owner's
    /// wallet and always exists.
    pub fn for_owner(owner: &Pubkey, mint: &MintInfo) -> Option<Self> {
        if mint.is_native() {
            return None;
        }
        Some(Self {
            address: mint.token_account(owner),
            owner: *owner,
            mint: mint.address,
            token_program: mint.program.id(),
        })
    }

    /// Idempotent creation instruction, funded by `payer`.
    pub fn create_instruction(&self, payer: &Pubkey) -> Instruction {
        create_associated_token_account_idempotent(
            payer,
            &self.owner,
            &self.mint,
            &self.token_program,
        )
    }
}

/// Required accounts that do not exist yet, deduplicated, in first-seen order.
pub async fn missing_accounts<R: LedgerRpc + ?Sized>(
    rpc: &R,
    required: &[RequiredAccount],
) -> Result<Vec<RequiredAccount>> {
    let mut seen = HashSet::new();
    let unique: Vec<RequiredAccount> = required
        .iter()
        .filter(|r| seen.insert(r.address))
        .copied()
        .collect();
    if unique.is_empty() {
        return Ok(Vec::new());
    }

    let addresses: Vec<Pubkey> = unique.iter().map(|r| r.address).collect();
    let accounts = rpc.get_multiple_accounts(&addresses).await?;
    Ok(unique
        .into_iter()
        .zip(accounts)
        .filter_map(|(required, account)| account.is_none().then_some(required))
        .collect())
}

/// Prefix `instructions` with creation of any missing destination account.
pub async fn with_destination_accounts<R: LedgerRpc + ?Sized>(
    rpc: &R,
    payer: &Pubkey,
    required: &[RequiredAccount],
    instructions: impl IntoIterator<Item = Instruction>,
) -> Result<Vec<Instruction>> {
    let missing = missing_accounts(rpc, required).await?;
    for account in &missing {
        debug!(address = %account.address, owner = %account.owner, "creating destination account");
    }
    Ok(missing
        .iter()
        .map(|account| account.create_instruction(payer))
        .chain(instructions)
        .collect())
}
