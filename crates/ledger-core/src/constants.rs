use crate::Hash;

pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Header preimage: index, timestamp, previous hash, merkle root, nonce.
pub const HEADER_PREIMAGE_SIZE: usize = 8 + 8 + HASH_SIZE + HASH_SIZE + 8;

pub const DEFAULT_DIFFICULTY: usize = 2;
/// Difficulty counts leading zero hex digits, so a SHA-256 hash caps it at 64.
pub const MAX_DIFFICULTY: usize = HASH_HEX_SIZE;

/// How many nonces are tried between two looks at the cancellation flag.
pub const CANCEL_POLL_INTERVAL: u64 = 1024;

pub const GENESIS_TIMESTAMP: u64 = 0;
pub const ZERO_HASH: Hash = [0u8; HASH_SIZE];

/// SHA-256 of the empty input; the merkle root of a block with no transactions.
pub const EMPTY_MERKLE_ROOT: Hash = [
    0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f, 0xb9, 0x24,
    0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52, 0xb8, 0x55,
];
