//! Reusable scratch buffers owned by an aligner handle.
//!
//! Buffers grow to the largest read/band seen and are then reused. Nothing
//! here is shared between handles; every worker thread builds its own
//! handle from the factory.

/// Cost used for unreachable cells.
pub const INF: i32 = i32::MAX / 4;

/// Three-state banded DP matrices, `(rows) x (width)` each, row-major.
#[derive(Debug, Default)]
pub struct BandScratch {
    pub matched: Vec<i32>,
    pub inserted: Vec<i32>,
    pub deleted: Vec<i32>,
    width: usize,
}

impl BandScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size for `rows x width` and fill with `INF`.
    pub fn reset(&mut self, rows: usize, width: usize) {
        let cells = rows * width;
        for m in [&mut self.matched, &mut self.inserted, &mut self.deleted] {
            m.clear();
            m.resize(cells, INF);
        }
        self.width = width;
    }

    #[inline(always)]
    pub fn at(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    pub fn capacity_cells(&self) -> usize {
        self.matched.capacity()
    }
}

/// Prefix/suffix substitution costs per diagonal for the single-indel
/// aligner, `(diagonals) x (read_len + 1)` each.
#[derive(Debug, Default)]
pub struct DiagonalScratch {
    pub prefix: Vec<i32>,
    pub suffix: Vec<i32>,
    stride: usize,
}

impl DiagonalScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, diagonals: usize, read_len: usize) {
        self.stride = read_len + 1;
        let cells = diagonals * self.stride;
        self.prefix.clear();
        self.prefix.resize(cells, 0);
        self.suffix.clear();
        self.suffix.resize(cells, 0);
    }

    #[inline(always)]
    pub fn at(&self, diagonal: usize, pos: usize) -> usize {
        diagonal * self.stride + pos
    }
}
