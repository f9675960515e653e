//! Tile arithmetic for both rulesets.
//!
//! Cell values are plain `u64`s with `0` meaning "empty". Whether two
//! tiles merge, and what they merge into, is decided here so that the
//! engine, the practice-tile validator, and the claim validator all
//! agree on what a legal tile is.

use crate::mode::Ruleset;

/// Tile that ends a `pow2` game in the win-stop state.
pub const CANONICAL_WIN_TILE: u64 = 2048;

/// Returns `true` if `v` appears in the Fibonacci sequence `1, 2, 3, 5, 8, ...`.
pub fn is_fibonacci(v: u64) -> bool {
    if v == 0 {
        return false;
    }
    let (mut a, mut b) = (1u64, 2u64);
    while a < v {
        let Some(next) = a.checked_add(b) else {
            return b == v;
        };
        a = b;
        b = next;
    }
    a == v
}

/// The Fibonacci number following `v`, or `None` if `v` is not one
/// (or the successor overflows).
pub fn fibonacci_successor(v: u64) -> Option<u64> {
    if !is_fibonacci(v) {
        return None;
    }
    let (mut a, mut b) = (1u64, 2u64);
    while a < v {
        let next = a.checked_add(b)?;
        a = b;
        b = next;
    }
    Some(b)
}

/// Result of merging `moving` into `target`, if the pair may merge.
///
/// `pow2` merges equal values into their double. `fibonacci` merges
/// `1 + 1` and any pair of consecutive Fibonacci numbers into their sum.
/// A result above `cap` is not a merge.
pub fn merge_value(ruleset: Ruleset, moving: u64, target: u64, cap: Option<u64>) -> Option<u64> {
    if moving == 0 || target == 0 {
        return None;
    }
    let merged = match ruleset {
        Ruleset::Pow2 => {
            if moving != target {
                return None;
            }
            moving.checked_mul(2)?
        }
        Ruleset::Fibonacci => {
            if moving == 1 && target == 1 {
                2
            } else {
                let (low, high) = if moving < target {
                    (moving, target)
                } else {
                    (target, moving)
                };
                if fibonacci_successor(low) != Some(high) {
                    return None;
                }
                low.checked_add(high)?
            }
        }
    };
    match cap {
        Some(cap) if merged > cap => None,
        _ => Some(merged),
    }
}

/// Returns `true` if `v` may appear on a board of the given ruleset.
///
/// Zero (empty) is always legal. Otherwise `pow2` accepts powers of two
/// and `fibonacci` accepts Fibonacci numbers, both bounded by `cap`.
pub fn is_legal_tile(ruleset: Ruleset, v: u64, cap: Option<u64>) -> bool {
    if v == 0 {
        return true;
    }
    if let Some(cap) = cap {
        if v > cap {
            return false;
        }
    }
    match ruleset {
        Ruleset::Pow2 => v.is_power_of_two(),
        Ruleset::Fibonacci => is_fibonacci(v),
    }
}
