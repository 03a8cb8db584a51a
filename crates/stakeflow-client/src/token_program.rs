//! Token-program variant detection.
//!
//! A mint is owned by either the legacy token program or the extended one
//! (Token-2022). Every associated token account derived for that mint must
//! use the same program, otherwise the derived address does not exist.

use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address_with_program_id;
use stakeflow_interface::{SPL_TOKEN_2022_PROGRAM_ID, SPL_TOKEN_PROGRAM_ID, is_native_mint};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::rpc::LedgerRpc;

/// Offset of `decimals` in the base mint layout, shared by both programs.
pub const MINT_DECIMALS_OFFSET: usize = 44;

/// Size of the base mint layout.
pub const MINT_BASE_LEN: usize = 82;

/// The token program owning a mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum TokenProgram {
    /// SPL Token
    #[strum(serialize = "spl-token")]
    Legacy,
    /// SPL Token-2022
    #[strum(serialize = "spl-token-2022")]
    Extended,
}

impl TokenProgram {
    /// Variant for a mint's owning program.
    pub fn from_owner(owner: &Pubkey) -> Option<Self> {
        if *owner == SPL_TOKEN_PROGRAM_ID {
            Some(Self::Legacy)
        } else if *owner == SPL_TOKEN_2022_PROGRAM_ID {
            Some(Self::Extended)
        } else {
            None
        }
    }

    /// Program id.
    pub fn id(self) -> Pubkey {
        match self {
            Self::Legacy => SPL_TOKEN_PROGRAM_ID,
            Self::Extended => SPL_TOKEN_2022_PROGRAM_ID,
        }
    }
}

/// A mint with its detected variant and decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintInfo {
    /// Mint address
    pub address: Pubkey,
    /// Owning token program
    pub program: TokenProgram,
    /// Decimal places
    pub decimals: u8,
}

impl MintInfo {
    /// Decode from a fetched mint account.
    pub fn from_account(address: Pubkey, account: &Account) -> Result<Self> {
        let program = TokenProgram::from_owner(&account.owner).ok_or_else(|| {
            ClientError::InvalidInput(format!(
                "{address} is owned by {}, not a token program",
                account.owner
            ))
        })?;
        if account.data.len() < MINT_BASE_LEN {
            return Err(ClientError::InvalidInput(format!(
                "{address} is not a mint ({} bytes)",
                account.data.len()
            )));
        }
        Ok(Self {
            address,
            program,
            decimals: account.data[MINT_DECIMALS_OFFSET],
        })
    }

    /// Whether this is the native-asset mint.
    pub fn is_native(&self) -> bool {
        is_native_mint(&self.address)
    }

    /// Operative token account of `owner` for this mint.
    ///
    /// For the native mint that is the owner's own address.
    pub fn token_account(&self, owner: &Pubkey) -> Pubkey {
        if self.is_native() {
            *owner
        } else {
            get_associated_token_address_with_program_id(owner, &self.address, &self.program.id())
        }
    }
}

/// Fetch a mint once and detect its variant.
pub async fn detect_mint<R: LedgerRpc + ?Sized>(rpc: &R, mint: &Pubkey) -> Result<MintInfo> {
    let account = rpc
        .get_account(mint)
        .await?
        .ok_or(ClientError::NotFound(*mint))?;
    let info = MintInfo::from_account(*mint, &account)?;
    debug!(mint = %mint, program = %info.program, decimals = info.decimals, "mint detected");
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakeflow_interface::NATIVE_MINT;
    use test_case::test_case;

    fn mint_account(owner: Pubkey, decimals: u8) -> Account {
        let mut data = vec![0u8; MINT_BASE_LEN];
        data[MINT_DECIMALS_OFFSET] = decimals;
        data[45] = 1;
        Account {
            lamports: 1_461_600,
            data,
            owner,
            executable: false,
            rent_epoch: 0,
        }
    }

    #[test_case(SPL_TOKEN_PROGRAM_ID, TokenProgram::Legacy ; "legacy")]
    #[test_case(SPL_TOKEN_2022_PROGRAM_ID, TokenProgram::Extended ; "extended")]
    fn test_variant_from_owner(owner: Pubkey, expected: TokenProgram) {
        let info = MintInfo::from_account(Pubkey::new_unique(), &mint_account(owner, 6)).unwrap();
        assert_eq!(info.program, expected);
        assert_eq!(info.program.id(), owner);
        assert_eq!(info.decimals, 6);
    }

    #[test]
    fn test_foreign_owner_rejected() {
        let err = MintInfo::from_account(
            Pubkey::new_unique(),
            &mint_account(Pubkey::new_unique(), 9),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[test]
    fn test_token_account_uses_variant() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let legacy = MintInfo::from_account(mint, &mint_account(SPL_TOKEN_PROGRAM_ID, 6)).unwrap();
        let extended =
            MintInfo::from_account(mint, &mint_account(SPL_TOKEN_2022_PROGRAM_ID, 6)).unwrap();
        assert_ne!(legacy.token_account(&owner), extended.token_account(&owner));
        assert_eq!(
            legacy.token_account(&owner),
            get_associated_token_address_with_program_id(&owner, &mint, &SPL_TOKEN_PROGRAM_ID)
        );
    }

    #[test]
    fn test_native_token_account_is_owner() {
        let owner = Pubkey::new_unique();
        let native = MintInfo::from_account(NATIVE_MINT, &mint_account(SPL_TOKEN_PROGRAM_ID, 9)).unwrap();
        assert!(native.is_native());
        assert_eq!(native.token_account(&owner), owner);
    }
}
