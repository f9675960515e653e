//! Claimed-versus-replayed board comparison.
//!
//! Hash first (fast path); on mismatch, walk both boards cell by cell
//! to report exactly where they differ.

use crate::hash::board_hash;

/// A single cell where the claim and the replay disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellDivergence {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Claimed value; `None` if the claim has no such cell.
    pub claimed: Option<u64>,
    /// Replayed value; `None` if the replayed board has no such cell.
    pub replayed: Option<u64>,
}

/// All differences between a claimed and a replayed board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardDivergence {
    /// [`board_hash`] of the claim.
    pub claimed_hash: u64,
    /// [`board_hash`] of the replayed board.
    pub replayed_hash: u64,
    /// Differing cells, row-major.
    pub cells: Vec<CellDivergence>,
}

/// Compare two row-major boards.
///
/// Returns `None` when they are identical.
pub fn compare_boards(claimed: &[Vec<u64>], replayed: &[Vec<u64>]) -> Option<BoardDivergence> {
    let claimed_hash = board_hash(claimed);
    let replayed_hash = board_hash(replayed);
    if claimed_hash == replayed_hash && claimed == replayed {
        return None;
    }

    let mut cells = Vec::new();
    let height = claimed.len().max(replayed.len());
    for y in 0..height {
        let a = claimed.get(y).map(Vec::as_slice).unwrap_or_default();
        let b = replayed.get(y).map(Vec::as_slice).unwrap_or_default();
        for x in 0..a.len().max(b.len()) {
            let (c, r) = (a.get(x).copied(), b.get(x).copied());
            if c != r {
                cells.push(CellDivergence {
                    x,
                    y,
                    claimed: c,
                    replayed: r,
                });
            }
        }
    }

    Some(BoardDivergence {
        claimed_hash,
        replayed_hash,
        cells,
    })
}
