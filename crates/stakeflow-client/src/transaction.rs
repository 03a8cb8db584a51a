//! Versioned transaction assembly.

use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::{AddressLookupTableAccount, VersionedMessage, v0};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;

use crate::error::{ClientError, Result};

/// Compute-unit ceiling of a single transaction.
pub const MAX_COMPUTE_UNITS: u32 = 1_400_000;

/// Compute-budget prefix for a transaction carrying `operations` pool operations.
pub fn compute_budget_instructions(
    units_per_operation: u32,
    operations: usize,
    price_micro_lamports: Option<u64>,
) -> Vec<Instruction> {
    let operations = u32::try_from(operations).unwrap_or(u32::MAX).max(1);
    let limit = units_per_operation
        .saturating_mul(operations)
        .min(MAX_COMPUTE_UNITS);
    let mut instructions = vec![ComputeBudgetInstruction::set_compute_unit_limit(limit)];
    if let Some(price) = price_micro_lamports {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(price));
    }
    instructions
}

/// Compile and sign a v0 transaction paid for by `payer`.
pub fn build_versioned_transaction(
    payer: &Keypair,
    instructions: &[Instruction],
    lookup_tables: &[AddressLookupTableAccount],
    blockhash: Hash,
) -> Result<VersionedTransaction> {
    let message = v0::Message::try_compile(&payer.pubkey(), instructions, lookup_tables, blockhash)
        .map_err(|e| ClientError::InvalidInput(format!("failed to compile message: {e}")))?;
    VersionedTransaction::try_new(VersionedMessage::V0(message), &[payer])
        .map_err(|e| ClientError::InvalidInput(format!("failed to sign transaction: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::AccountMeta;
    use solana_sdk::pubkey::Pubkey;

    #[test]
    fn test_compute_limit_scales_and_caps() {
        let ixs = compute_budget_instructions(120_000, 3, None);
        assert_eq!(ixs.len(), 1);
        assert_eq!(ixs[0], ComputeBudgetInstruction::set_compute_unit_limit(360_000));

        let ixs = compute_budget_instructions(500_000, 6, Some(10));
        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[0], ComputeBudgetInstruction::set_compute_unit_limit(MAX_COMPUTE_UNITS));
    }

    #[test]
    fn test_lookup_table_shrinks_message() {
        let payer = Keypair::new();
        let program_id = Pubkey::new_unique();
        let accounts: Vec<Pubkey> = (0..20).map(|_| Pubkey::new_unique()).collect();
        let ix = Instruction {
            program_id,
            accounts: accounts.iter().map(|a| AccountMeta::new(*a, false)).collect(),
            data: vec![1],
        };
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: accounts.clone(),
        };

        let plain =
            build_versioned_transaction(&payer, &[ix.clone()], &[], Hash::new_unique()).unwrap();
        let compressed =
            build_versioned_transaction(&payer, &[ix], &[table], Hash::new_unique()).unwrap();

        assert_eq!(plain.message.static_account_keys().len(), 22);
        assert_eq!(compressed.message.static_account_keys().len(), 2);
        assert!(plain.verify_with_results().iter().all(|ok| *ok));
    }
}
