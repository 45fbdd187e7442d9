use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::Point;
use crate::error::{GoError, IllegalMove};
use crate::stone::Stone;

/// Prisoners indexed by the color that took them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Captures {
    pub black: u32,
    pub white: u32,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stone: Stone) -> u32 {
        match stone {
            Stone::Black => self.black,
            Stone::White => self.white,
        }
    }

    fn add(&mut self, stone: Stone, count: u32) {
        match stone {
            Stone::Black => self.black += count,
            Stone::White => self.white += count,
        }
    }
}

/// Outcome of a successful placement.
#[derive(Debug, Clone)]
pub struct Placement {
    pub goban: Goban,
    pub captured: Vec<Point>,
    /// The placed stone's own group was removed (self-capture).
    pub suicide: bool,
}

/// The grid of cells stored as a flat row-major array, plus prisoner counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goban {
    board: Vec<i8>,
    cols: u8,
    rows: u8,
    captures: Captures,
}

impl Goban {
    /// Create an empty board with the given dimensions.
    pub fn with_dimensions(cols: u8, rows: u8) -> Self {
        Goban {
            board: vec![0i8; cols as usize * rows as usize],
            cols,
            rows,
            captures: Captures::new(),
        }
    }

    /// Build a board from a row matrix of cell values.
    pub fn from_rows(rows: Vec<Vec<i8>>) -> Result<Self, GoError> {
        let row_count = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(GoError::malformed("rows of a board matrix differ in length"));
        }
        if cols > u8::MAX as usize || row_count > u8::MAX as usize {
            return Err(GoError::malformed("board matrix is too large"));
        }

        Ok(Goban {
            board: rows.into_iter().flatten().map(i8::signum).collect(),
            cols: cols as u8,
            rows: row_count as u8,
            captures: Captures::new(),
        })
    }

    /// Restore a board from a stored snapshot.
    pub fn from_state(board: Vec<i8>, cols: u8, rows: u8, captures: Captures) -> Result<Self, GoError> {
        if board.len() != cols as usize * rows as usize {
            return Err(GoError::malformed(format!(
                "snapshot has {} cells, expected {}x{}",
                board.len(),
                cols,
                rows
            )));
        }
        Ok(Goban {
            board,
            cols,
            rows,
            captures,
        })
    }

    // -- Accessors --

    pub fn board(&self) -> &[i8] {
        &self.board
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    pub(crate) fn set_captures(&mut self, captures: Captures) {
        self.captures = captures;
    }

    pub fn stone_at(&self, point: Point) -> Option<Stone> {
        if self.on_board(point) {
            Stone::from_int(self.board[self.idx(point)])
        } else {
            None
        }
    }

    pub fn on_board(&self, (col, row): Point) -> bool {
        col < self.cols && row < self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.board.iter().all(|&s| s == 0)
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| (col, row)))
    }

    pub fn point_of(&self, idx: usize) -> Point {
        ((idx % self.cols as usize) as u8, (idx / self.cols as usize) as u8)
    }

    #[inline]
    pub fn idx(&self, (col, row): Point) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    /// Cells that differ between two boards of the same size.
    pub fn diff(&self, other: &Goban) -> Vec<Point> {
        self.board
            .iter()
            .zip(&other.board)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| self.point_of(i))
            .collect()
    }

    // -- Mutation --

    /// Overwrite cells and prisoners from a snapshot of a board with the
    /// same dimensions.
    pub(crate) fn load(&mut self, board: &[i8], captures: Captures) {
        for (cell, &v) in self.board.iter_mut().zip(board) {
            *cell = v;
        }
        self.captures = captures;
    }

    /// Unconditionally set or clear a cell.
    pub(crate) fn set(&mut self, point: Point, stone: Option<Stone>) {
        if self.on_board(point) {
            let i = self.idx(point);
            self.board[i] = Stone::cell(stone);
        }
    }

    /// Place a stone, resolve captures and self-capture. Returns a new board;
    /// `self` is never touched, so a refused move leaves nothing to undo.
    pub fn place_stone(
        &self,
        point: Point,
        stone: Stone,
        allow_suicide: bool,
    ) -> Result<Placement, IllegalMove> {
        if !self.on_board(point) {
            return Err(IllegalMove::OutOfBounds);
        }
        if self.stone_at(point).is_some() {
            return Err(IllegalMove::Occupied);
        }

        let mut goban = self.clone();
        goban.set(point, Some(stone));

        let mut captured = Vec::new();
        for chain in goban.opponent_neighbor_chains(point) {
            if goban.chain_liberties(&chain).is_empty() {
                captured.extend(chain);
            }
        }
        goban.capture_mut(&captured);

        let mut suicide = false;
        if captured.is_empty() {
            let own = goban.chain(point);
            if goban.chain_liberties(&own).is_empty() {
                if !allow_suicide {
                    return Err(IllegalMove::Suicide);
                }
                goban.capture_mut(&own);
                captured = own;
                suicide = true;
            }
        }

        Ok(Placement {
            goban,
            captured,
            suicide,
        })
    }

    /// Remove a single-colored set of stones and credit the other color.
    fn capture_mut(&mut self, stones: &[Point]) {
        let Some(stone_color) = stones.first().and_then(|&p| self.stone_at(p)) else {
            return;
        };

        for &pt in stones {
            self.set(pt, None);
        }
        self.captures.add(stone_color.opp(), stones.len() as u32);
    }

    // -- Graph algorithms --

    /// Get the 4-connected neighbors that are on the board.
    pub fn neighbors(&self, (col, row): Point) -> ArrayVec<Point, 4> {
        let mut result = ArrayVec::new();
        if col > 0 {
            result.push((col - 1, row));
        }
        if col + 1 < self.cols {
            result.push((col + 1, row));
        }
        if row > 0 {
            result.push((col, row - 1));
        }
        if row + 1 < self.rows {
            result.push((col, row + 1));
        }
        result
    }

    /// Flood-fill the connected region of cells equal to the cell at `point`,
    /// empty regions included.
    pub fn region(&self, point: Point) -> Vec<Point> {
        if !self.on_board(point) {
            return Vec::new();
        }
        let mut visited = vec![false; self.board.len()];
        self.region_from(point, &mut visited)
    }

    /// Flood-fill connected group of same-colored stones.
    pub fn chain(&self, point: Point) -> Vec<Point> {
        match self.stone_at(point) {
            Some(_) => self.region(point),
            None => Vec::new(),
        }
    }

    /// Get the liberties of a single stone's connected group.
    pub fn liberties(&self, point: Point) -> Vec<Point> {
        let chain = self.chain(point);
        self.chain_liberties(&chain)
    }

    /// Get the liberties of a chain (pre-computed group of points).
    pub fn chain_liberties(&self, chain: &[Point]) -> Vec<Point> {
        let mut seen = vec![false; self.board.len()];
        let mut libs = Vec::new();
        for &p in chain {
            for n in self.neighbors(p) {
                let ni = self.idx(n);
                if !seen[ni] && self.board[ni] == 0 {
                    seen[ni] = true;
                    libs.push(n);
                }
            }
        }
        libs
    }

    /// Distinct regions touching `group` whose cells hold `value`.
    pub fn adjacent_regions(&self, group: &[Point], value: i8) -> Vec<Vec<Point>> {
        let mut visited = vec![false; self.board.len()];
        for &p in group {
            visited[self.idx(p)] = true;
        }

        let mut regions = Vec::new();
        for &p in group {
            for n in self.neighbors(p) {
                let ni = self.idx(n);
                if visited[ni] || self.board[ni] != value {
                    continue;
                }
                let region = self.region_from(n, &mut visited);
                if !region.is_empty() {
                    regions.push(region);
                }
            }
        }
        regions
    }

    /// Find all opponent chains neighboring a given point.
    fn opponent_neighbor_chains(&self, point: Point) -> Vec<Vec<Point>> {
        match self.stone_at(point) {
            Some(stone) => self.adjacent_regions(&[point], stone.opp().to_int()),
            None => Vec::new(),
        }
    }

    /// Region flood-fill using a shared visited bitset.
    fn region_from(&self, point: Point, visited: &mut [bool]) -> Vec<Point> {
        let value = self.board[self.idx(point)];
        let mut result = Vec::new();
        let mut stack = vec![point];

        while let Some(p) = stack.pop() {
            let vi = self.idx(p);
            if visited[vi] {
                continue;
            }
            visited[vi] = true;
            result.push(p);
            for n in self.neighbors(p) {
                let ni = self.idx(n);
                if self.board[ni] == value && !visited[ni] {
                    stack.push(n);
                }
            }
        }

        result
    }
}
