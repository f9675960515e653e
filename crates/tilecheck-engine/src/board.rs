//! Row-major game board with a fixed set of blocked cells.

use std::fmt;

/// An `H × W` grid of tile values (`0` = empty) plus impassable cells.
///
/// Blocked cells always hold `0`; every mutation path in the engine
/// goes through [`Board::set`], which refuses to write into them.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<u64>,
    blocked: Vec<bool>,
}

impl Board {
    /// Create an empty board. Dimensions are raised to at least 1;
    /// blocked coordinates outside the board are ignored.
    pub fn new(width: usize, height: usize, blocked_cells: &[(usize, usize)]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut blocked = vec![false; width * height];
        for &(x, y) in blocked_cells {
            if x < width && y < height {
                blocked[y * width + x] = true;
            }
        }
        Self {
            width,
            height,
            cells: vec![0; width * height],
            blocked,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Flat index of `(x, y)`, or `None` if out of bounds.
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Value at `(x, y)`; `None` if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u64> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Write `value` at `(x, y)`. Returns `false` (and writes nothing)
    /// if the cell is out of bounds or blocked.
    pub fn set(&mut self, x: usize, y: usize, value: u64) -> bool {
        match self.index(x, y) {
            Some(i) if !self.blocked[i] => {
                self.cells[i] = value;
                true
            }
            _ => false,
        }
    }

    /// Whether `(x, y)` is a blocked cell. Out-of-bounds cells count as blocked.
    pub fn is_blocked(&self, x: usize, y: usize) -> bool {
        self.index(x, y).is_none_or(|i| self.blocked[i])
    }

    /// Flat indices of empty, unblocked cells in row-major order.
    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .zip(&self.blocked)
            .enumerate()
            .filter(|(_, (&v, &b))| v == 0 && !b)
            .map(|(i, _)| i)
            .collect()
    }

    /// Largest tile on the board (`0` when empty).
    pub fn best_tile(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Flat row-major cell values.
    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    /// Copy of the board as a list of rows.
    pub fn rows(&self) -> Vec<Vec<u64>> {
        self.cells.chunks(self.width).map(<[u64]>::to_vec).collect()
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut u64 {
        &mut self.cells[index]
    }

    pub(crate) fn blocked_at(&self, index: usize) -> bool {
        self.blocked[index]
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {}x{}", self.width, self.height)?;
        for y in 0..self.height {
            for x in 0..self.width {
                let i = y * self.width + x;
                if self.blocked[i] {
                    write!(f, "{:>6}", "#")?;
                } else {
                    write!(f, "{:>6}", self.cells[i])?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
