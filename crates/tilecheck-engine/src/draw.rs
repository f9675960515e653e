//! Pure pseudo-random draws keyed by the game seed.
//!
//! Nothing in this module keeps generator state between calls. Every
//! draw re-keys a ChaCha8 generator from the seed's IEEE-754 bits, seeks
//! it past exactly the number of draws that precede this one, and reads
//! the next draw. Seeking is O(1) (the generator is positioned by word
//! offset), but the result is identical to re-seeding and discarding
//! `history_len` draws one by one.
//!
//! Independent concerns use independent ChaCha streams so that they can
//! never observe each other's position:
//!
//! | stream | used for |
//! |--------|----------|
//! | 0 | tile spawns, indexed by history length |
//! | 1 | direction-lock phases, indexed by phase number |
//!
//! Both opening tiles come from `spawn_draw(seed, 0)`. They cannot land
//! on the same cell because the second picks among the cells still empty.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tilecheck_core::{Direction, SpawnEntry};

const SPAWN_STREAM: u64 = 0;
const LOCK_STREAM: u64 = 1;

/// Each draw reads two `u64`s, i.e. four 32-bit generator words.
const WORDS_PER_DRAW: u128 = 4;

/// Raw rolls for one tile spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnDraw {
    /// Selects the spawn value from the weighted spawn table.
    pub value_roll: u64,
    /// Selects the cell among empty, unblocked cells.
    pub cell_roll: u64,
}

impl SpawnDraw {
    /// Weighted choice over `table`. Entries with zero weight are skipped.
    /// Returns `None` if the table has no positive weight.
    pub fn pick_value(&self, table: &[SpawnEntry]) -> Option<u64> {
        let total: u64 = table.iter().map(|e| u64::from(e.weight)).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.value_roll % total;
        for entry in table {
            let w = u64::from(entry.weight);
            if roll < w {
                return Some(entry.value);
            }
            roll -= w;
        }
        None
    }

    /// Uniform choice among `candidates`, or `None` if there are none.
    pub fn pick_cell(&self, candidates: &[usize]) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        let i = (self.cell_roll % candidates.len() as u64) as usize;
        Some(candidates[i])
    }
}

fn positioned(seed: f64, stream: u64, draw_index: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.to_bits());
    rng.set_stream(stream);
    rng.set_word_pos(u128::from(draw_index) * WORDS_PER_DRAW);
    rng
}

fn read_draw(rng: &mut ChaCha8Rng) -> SpawnDraw {
    SpawnDraw {
        value_roll: rng.next_u64(),
        cell_roll: rng.next_u64(),
    }
}

/// The spawn that follows a move made when the history holds
/// `history_len` entries (moves and undos).
pub fn spawn_draw(seed: f64, history_len: u64) -> SpawnDraw {
    read_draw(&mut positioned(seed, SPAWN_STREAM, history_len))
}

/// The direction forbidden during lock phase `phase` (`moves / k`).
pub fn lock_direction(seed: f64, phase: u64) -> Direction {
    let mut rng = positioned(seed, LOCK_STREAM, phase);
    Direction::ALL[rng.random_range(0..Direction::ALL.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_are_pure() {
        for n in [0, 1, 2, 17, 10_000] {
            assert_eq!(spawn_draw(0.123456, n), spawn_draw(0.123456, n));
        }
        assert_eq!(lock_direction(0.5, 3), lock_direction(0.5, 3));
    }

    #[test]
    fn seek_matches_sequential_advance() {
        let mut rng = ChaCha8Rng::seed_from_u64(0.75f64.to_bits());
        rng.set_stream(SPAWN_STREAM);
        let mut sequential = Vec::new();
        for _ in 0..6 {
            sequential.push(read_draw(&mut rng));
        }
        for (n, expected) in sequential.iter().enumerate() {
            assert_eq!(spawn_draw(0.75, n as u64), *expected);
        }
    }

    #[test]
    fn history_length_changes_the_draw() {
        assert_ne!(spawn_draw(0.123456, 1), spawn_draw(0.123456, 2));
        assert_ne!(spawn_draw(0.123456, 0), spawn_draw(0.654321, 0));
    }

    #[test]
    fn streams_are_independent() {
        let mut spawn = positioned(0.25, SPAWN_STREAM, 0);
        let mut lock = positioned(0.25, LOCK_STREAM, 0);
        assert_ne!(read_draw(&mut spawn), read_draw(&mut lock));
    }

    #[test]
    fn weighted_pick_respects_weights() {
        let table = [SpawnEntry::new(2, 9), SpawnEntry::new(4, 1)];
        let at = |roll| {
            SpawnDraw {
                value_roll: roll,
                cell_roll: 0,
            }
            .pick_value(&table)
        };
        assert_eq!(at(0), Some(2));
        assert_eq!(at(8), Some(2));
        assert_eq!(at(9), Some(4));
        assert_eq!(at(10), Some(2));
    }

    #[test]
    fn zero_weight_entries_never_drawn() {
        let table = [SpawnEntry::new(8, 0), SpawnEntry::new(2, 1)];
        for roll in 0..20 {
            let draw = SpawnDraw {
                value_roll: roll,
                cell_roll: 0,
            };
            assert_eq!(draw.pick_value(&table), Some(2));
        }
        let empty = SpawnDraw {
            value_roll: 0,
            cell_roll: 0,
        };
        assert_eq!(empty.pick_value(&[SpawnEntry::new(2, 0)]), None);
    }

    #[test]
    fn cell_pick_is_uniform_index() {
        let draw = SpawnDraw {
            value_roll: 0,
            cell_roll: 7,
        };
        assert_eq!(draw.pick_cell(&[3, 5, 9]), Some(5));
        assert_eq!(draw.pick_cell(&[]), None);
    }

    #[test]
    fn lock_directions_cover_all_four() {
        let mut seen = [false; 4];
        for phase in 0..64 {
            seen[lock_direction(0.9, phase).index() as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "64 phases should hit every direction");
    }
}
