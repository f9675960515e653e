//! Board hashing for fast claim comparison.
//!
//! Uses FNV-1a over the board dimensions and every cell. These hashes
//! are not cryptographically secure; they only short-circuit the
//! cell-by-cell comparison when boards are equal.

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_u64(mut hash: u64, v: u64) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

/// Hash a row-major board.
///
/// Each row's length is folded in before its cells, so boards with the
/// same cells in a different shape hash differently.
pub fn board_hash(rows: &[Vec<u64>]) -> u64 {
    let mut hash = fnv1a_u64(FNV_OFFSET, rows.len() as u64);
    for row in rows {
        hash = fnv1a_u64(hash, row.len() as u64);
        for &cell in row {
            hash = fnv1a_u64(hash, cell);
        }
    }
    hash
}
