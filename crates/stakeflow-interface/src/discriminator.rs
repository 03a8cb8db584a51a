//! Anchor-compatible discriminators.
//!
//! Accounts start with `sha256("account:<TypeName>")[..8]` and instruction data
//! starts with `sha256("global:<snake_case_name>")[..8]`.

use solana_program::hash::hashv;

/// Discriminator size in bytes.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Compute the 8-byte discriminator for `namespace:name`.
pub fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = hashv(&[namespace.as_bytes(), b":", name.as_bytes()]);
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash.to_bytes()[..DISCRIMINATOR_LEN]);
    out
}

/// Discriminator of an account type.
pub fn account_discriminator(type_name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("account", type_name)
}

/// Discriminator of an instruction.
pub fn instruction_discriminator(ix_name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("global", ix_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_do_not_collide() {
        assert_ne!(
            account_discriminator("deposit"),
            instruction_discriminator("deposit")
        );
    }

    #[test]
    fn test_matches_anchor_sighash() {
        assert_eq!(
            instruction_discriminator("initialize"),
            [175, 175, 109, 31, 13, 152, 155, 237]
        );
    }
}
