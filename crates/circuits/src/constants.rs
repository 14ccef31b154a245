//! Protocol-wide sizes and domain tags.

/// Number of token slots in every wallet.
pub const TOTAL_TOKEN: usize = 10;

/// Number of pending order slots in every wallet.
pub const MAX_PENDING_ORDER: usize = 4;

/// Depth of the global commitment tree.
pub const MERKLE_DEPTH: usize = 16;

/// ASCII "BLINDER", mixed into the blinder seed derivation.
pub const BLINDER_DOMAIN: u64 = 0x424c_494e_4445_52;
