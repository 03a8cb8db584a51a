//! Program ID constants.
//!
//! The staking program ID is imported from the central `stakeflow-program-ids`
//! crate, which is the single source of truth for the deployment address.
//! The correct address is selected at compile-time based on the network feature.
//!
//! The remaining IDs are well-known runtime programs every instruction touches.

use solana_program::{pubkey, pubkey::Pubkey};

// =============================================================================
// Staking Program
// =============================================================================

/// Staking program ID for the network this crate was compiled for.
pub const STAKING_PROGRAM_ID: Pubkey = Pubkey::new_from_array(five8_const::decode_32_const(
    stakeflow_program_ids::STAKING_PROGRAM_ID,
));

/// Network the program ids were compiled for.
pub use stakeflow_program_ids::NETWORK;

// =============================================================================
// Token Programs
// =============================================================================

/// SPL Token program ID (legacy token handling).
pub const SPL_TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// SPL Token-2022 program ID (extended token handling).
pub const SPL_TOKEN_2022_PROGRAM_ID: Pubkey =
    pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

/// Associated Token Account program ID.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// System program ID.
pub const SYSTEM_PROGRAM_ID: Pubkey = pubkey!("11111111111111111111111111111111");

/// Native asset mint (wrapped SOL).
///
/// For this mint the program moves lamports directly, so every party's
/// "token account" is the party's own address.
pub const NATIVE_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

// =============================================================================
// Helper Functions
// =============================================================================

/// Check if a program ID is one of the two supported token programs.
pub fn is_token_program(program_id: &Pubkey) -> bool {
    *program_id == SPL_TOKEN_PROGRAM_ID || *program_id == SPL_TOKEN_2022_PROGRAM_ID
}

/// Check if a mint is the native asset mint.
pub fn is_native_mint(mint: &Pubkey) -> bool {
    *mint == NATIVE_MINT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_programs_are_distinct() {
        assert_ne!(SPL_TOKEN_PROGRAM_ID, SPL_TOKEN_2022_PROGRAM_ID);
        assert!(is_token_program(&SPL_TOKEN_PROGRAM_ID));
        assert!(is_token_program(&SPL_TOKEN_2022_PROGRAM_ID));
        assert!(!is_token_program(&SYSTEM_PROGRAM_ID));
    }

    #[test]
    fn test_well_known_program_ids() {
        assert_eq!(
            SPL_TOKEN_PROGRAM_ID.to_string(),
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
        );
        assert_eq!(
            SPL_TOKEN_2022_PROGRAM_ID.to_string(),
            "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb"
        );
        assert_eq!(
            ASSOCIATED_TOKEN_PROGRAM_ID.to_string(),
            "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL"
        );
        assert_eq!(
            NATIVE_MINT.to_string(),
            "So11111111111111111111111111111111111111112"
        );
    }

    #[test]
    fn test_network_name() {
        assert!(["mainnet", "devnet", "localnet"].contains(&NETWORK));
    }

    #[test]
    fn test_native_mint_detection() {
        assert!(is_native_mint(&NATIVE_MINT));
        assert!(!is_native_mint(&SPL_TOKEN_PROGRAM_ID));
    }

    #[test]
    fn test_staking_program_id_decodes() {
        assert_eq!(
            STAKING_PROGRAM_ID.to_string(),
            stakeflow_program_ids::STAKING_PROGRAM_ID
        );
    }
}
