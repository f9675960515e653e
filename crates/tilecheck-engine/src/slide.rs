//! Single-direction slide-and-merge resolution.

use smallvec::SmallVec;
use tilecheck_core::{merge_value, Direction, Ruleset};

use crate::board::Board;

/// What a slide did to the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SlideOutcome {
    pub moved: bool,
    /// Sum of merged tile values, saturating at `u64::MAX`.
    pub gain: u64,
    pub merges: u32,
}

/// Step one cell along `(dx, dy)`, or `None` at the board edge.
fn step(board: &Board, x: usize, y: usize, dx: isize, dy: isize) -> Option<(usize, usize)> {
    let nx = x.checked_add_signed(dx)?;
    let ny = y.checked_add_signed(dy)?;
    (nx < board.width() && ny < board.height()).then_some((nx, ny))
}

/// Axis visiting order so that the cell nearest the destination wall
/// is processed first.
fn traversal(len: usize, delta: isize) -> SmallVec<[usize; 8]> {
    if delta == 1 {
        (0..len).rev().collect()
    } else {
        (0..len).collect()
    }
}

/// Slide every tile of `board` towards `direction`, in place.
///
/// Blocked cells behave as walls: tiles neither pass through nor merge
/// into them. A cell that received a merge this slide cannot merge again.
pub(crate) fn slide(
    board: &mut Board,
    direction: Direction,
    ruleset: Ruleset,
    cap: Option<u64>,
) -> SlideOutcome {
    let (dx, dy) = direction.vector();
    let xs = traversal(board.width(), dx);
    let ys = traversal(board.height(), dy);
    let mut merged = vec![false; board.cells().len()];
    let mut out = SlideOutcome::default();

    for &y in &ys {
        for &x in &xs {
            let Some(src) = board.index(x, y) else {
                continue;
            };
            let value = board.cells()[src];
            if value == 0 || board.blocked_at(src) {
                continue;
            }

            let (mut fx, mut fy) = (x, y);
            let mut next = step(board, fx, fy, dx, dy);
            while let Some((nx, ny)) = next {
                if board.is_blocked(nx, ny) || board.get(nx, ny) != Some(0) {
                    break;
                }
                (fx, fy) = (nx, ny);
                next = step(board, fx, fy, dx, dy);
            }

            if let Some((nx, ny)) = next {
                if let Some(target) = board.index(nx, ny) {
                    let occupant = board.cells()[target];
                    if !board.blocked_at(target) && occupant != 0 && !merged[target] {
                        if let Some(result) = merge_value(ruleset, value, occupant, cap) {
                            *board.cell_mut(target) = result;
                            *board.cell_mut(src) = 0;
                            merged[target] = true;
                            out.gain = out.gain.saturating_add(result);
                            out.merges += 1;
                            out.moved = true;
                            continue;
                        }
                    }
                }
            }

            if (fx, fy) != (x, y) {
                if let Some(dst) = board.index(fx, fy) {
                    *board.cell_mut(dst) = value;
                    *board.cell_mut(src) = 0;
                    out.moved = true;
                }
            }
        }
    }

    out
}
