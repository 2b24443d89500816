use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Side length of the grid.
pub const SIZE: usize = 4;

const CELLS: usize = SIZE * SIZE;

/// Face value of a tile: 0 for an empty cell, otherwise a power of two.
pub type Tile = u32;

/// Largest tile accepted from outside. A merge never produces more than the
/// board's sum, and 16 cells at this cap total `2^30`, so no merge reachable
/// from a validated board overflows a `Tile`.
pub const MAX_TILE: Tile = 1 << 26;

type Line = [Tile; SIZE];
type Grid = [[Tile; SIZE]; SIZE];

/// Row-major snapshot of every cell. Two boards have equal keys iff they are equal.
pub type BoardKey = [Tile; CELLS];

/// A direction to move/merge tiles.
///
/// Engine order is `Up, Down, Left, Right` (indices 0..=3). Callers that number
/// directions clockwise should go through [`GameDirection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All directions in engine enumeration order. Ties in the search resolve to
    /// the earliest entry.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    #[inline]
    pub fn from_index(idx: usize) -> Option<Move> {
        Move::ALL.get(idx).copied()
    }

    /// Map into the clockwise numbering used by the game controller.
    ///
    /// ```
    /// use ai_2048_expectimax::engine::{GameDirection, Move};
    /// assert_eq!(Move::Down.to_game(), GameDirection::Down);
    /// assert_eq!(Move::Down.to_game().index(), 2);
    /// ```
    #[inline]
    pub fn to_game(self) -> GameDirection {
        match self {
            Move::Up => GameDirection::Up,
            Move::Down => GameDirection::Down,
            Move::Left => GameDirection::Left,
            Move::Right => GameDirection::Right,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(s)
    }
}

/// Direction numbering of the surrounding game controller: `Up, Right, Down, Left`.
///
/// Engine index → game index is the fixed table `0→0, 1→2, 2→3, 3→1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameDirection {
    Up,
    Right,
    Down,
    Left,
}

impl GameDirection {
    pub const ALL: [GameDirection; 4] =
        [GameDirection::Up, GameDirection::Right, GameDirection::Down, GameDirection::Left];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            GameDirection::Up => 0,
            GameDirection::Right => 1,
            GameDirection::Down => 2,
            GameDirection::Left => 3,
        }
    }

    #[inline]
    pub fn from_index(idx: usize) -> Option<GameDirection> {
        GameDirection::ALL.get(idx).copied()
    }

    #[inline]
    pub fn to_engine(self) -> Move {
        match self {
            GameDirection::Up => Move::Up,
            GameDirection::Right => Move::Right,
            GameDirection::Down => Move::Down,
            GameDirection::Left => Move::Left,
        }
    }
}

impl From<Move> for GameDirection {
    fn from(m: Move) -> Self { m.to_game() }
}

impl From<GameDirection> for Move {
    fn from(d: GameDirection) -> Self { d.to_engine() }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("expected {expected} cells, got {got}")]
    WrongCellCount { expected: usize, got: usize },
    #[error("cell ({row}, {col}) holds {value}, which is neither 0 nor a power of two")]
    NotPowerOfTwo { row: usize, col: usize, value: u64 },
    #[error("cell ({row}, {col}) holds {value}, above the largest tile {MAX_TILE}")]
    OutOfRange { row: usize, col: usize, value: u64 },
    #[error("cannot parse cell {0:?}")]
    Parse(String),
}

/// A 4x4 2048 position, row 0 at the top.
///
/// `Board` is `Copy`: every search step works on its own copy and the
/// caller's value is never touched.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(Grid);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board([[0; SIZE]; SIZE]);

    /// Build a board from rows without validation.
    ///
    /// Precondition: every value is 0 or a power of two no larger than
    /// [`MAX_TILE`]. Use
    /// [`Board::try_from_grid`] at untrusted boundaries.
    #[inline]
    pub fn from_grid(grid: Grid) -> Self {
        debug_assert!(grid.iter().flatten().all(|&v| is_tile_value(v as u64) && v <= MAX_TILE));
        Board(grid)
    }

    /// Build a board from rows, rejecting values that are not 0 or a power of
    /// two, and powers of two above [`MAX_TILE`].
    pub fn try_from_grid(grid: [[u64; SIZE]; SIZE]) -> Result<Self, BoardError> {
        let mut out = Board::EMPTY;
        for (row, line) in grid.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if !is_tile_value(value) {
                    return Err(BoardError::NotPowerOfTwo { row, col, value });
                }
                if value > MAX_TILE as u64 {
                    return Err(BoardError::OutOfRange { row, col, value });
                }
                out.set(row, col, value as Tile);
            }
        }
        Ok(out)
    }

    /// Build a board from 16 row-major values.
    pub fn try_from_cells(cells: &[u64]) -> Result<Self, BoardError> {
        if cells.len() != CELLS {
            return Err(BoardError::WrongCellCount { expected: CELLS, got: cells.len() });
        }
        let mut grid = [[0u64; SIZE]; SIZE];
        for (idx, &v) in cells.iter().enumerate() {
            grid[idx / SIZE][idx % SIZE] = v;
        }
        Board::try_from_grid(grid)
    }

    /// Build a board from a controller grid addressed `cells[x][y]`, where `x`
    /// is the horizontal axis. Engine `(row, col)` is `(y, x)`.
    ///
    /// ```
    /// use ai_2048_expectimax::engine::Board;
    /// let mut cells = [[0; 4]; 4];
    /// cells[3][0] = 2; // top-right corner in controller coordinates
    /// let b = Board::from_game_cells(cells);
    /// assert_eq!(b.get(0, 3), 2);
    /// ```
    pub fn from_game_cells(cells: Grid) -> Self {
        let mut out = Board::EMPTY;
        for (x, column) in cells.iter().enumerate() {
            for (y, &value) in column.iter().enumerate() {
                out.set(y, x, value);
            }
        }
        debug_assert!(out.0.iter().flatten().all(|&v| is_tile_value(v as u64) && v <= MAX_TILE));
        out
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Tile { self.0[row][col] }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Tile) { self.0[row][col] = value; }

    /// Rows, top to bottom.
    #[inline]
    pub fn rows(&self) -> &Grid { &self.0 }

    /// Column `col`, top to bottom.
    #[inline]
    pub fn column(&self, col: usize) -> Line {
        [self.0[0][col], self.0[1][col], self.0[2][col], self.0[3][col]]
    }

    /// Slide and merge in `dir`, in place. Returns whether any cell changed.
    pub fn apply(&mut self, dir: Move) -> bool {
        let mut moved = false;
        for idx in 0..SIZE {
            let cells = line_cells(dir, idx);
            let merged = merge_line(cells.map(|(r, c)| self.get(r, c)));
            for (&(r, c), &value) in cells.iter().zip(merged.iter()) {
                if self.get(r, c) != value {
                    self.set(r, c, value);
                    moved = true;
                }
            }
        }
        moved
    }

    #[inline]
    pub fn move_up(&mut self) -> bool { self.apply(Move::Up) }

    #[inline]
    pub fn move_down(&mut self) -> bool { self.apply(Move::Down) }

    #[inline]
    pub fn move_left(&mut self) -> bool { self.apply(Move::Left) }

    #[inline]
    pub fn move_right(&mut self) -> bool { self.apply(Move::Right) }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// ```
    /// use ai_2048_expectimax::engine::{Board, Move};
    /// let b: Board = "0 0 2 2  0 0 0 0  0 0 0 0  0 0 0 0".parse().unwrap();
    /// assert_eq!(b.shift(Move::Left).get(0, 0), 4);
    /// ```
    #[inline]
    pub fn shift(mut self, dir: Move) -> Self {
        self.apply(dir);
        self
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty cell.
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use ai_2048_expectimax::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        let empties = self.empty_positions();
        if empties.is_empty() {
            return self;
        }
        let (row, col) = empties[rng.gen_range(0..empties.len())];
        self.set(row, col, generate_random_tile(rng));
        self
    }

    /// Number of zero cells.
    pub fn count_empty(&self) -> usize {
        self.0.iter().flatten().filter(|&&v| v == 0).count()
    }

    /// Number of non-zero cells.
    #[inline]
    pub fn count_occupied(&self) -> usize { CELLS - self.count_empty() }

    /// Number of distinct non-zero values. Used to scale search depth with game stage.
    pub fn count_distinct_tiles(&self) -> u32 {
        let mut bitset = 0u64;
        for &v in self.0.iter().flatten() {
            if v != 0 {
                bitset |= 1 << v.trailing_zeros();
            }
        }
        bitset.count_ones()
    }

    /// Coordinates of every empty cell in row-major order.
    pub fn empty_positions(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(CELLS);
        for row in 0..SIZE {
            for col in 0..SIZE {
                if self.get(row, col) == 0 {
                    out.push((row, col));
                }
            }
        }
        out
    }

    /// True when no cell is empty and no two neighbours are equal.
    ///
    /// ```
    /// use ai_2048_expectimax::engine::Board;
    /// assert!(!Board::EMPTY.is_game_over());
    /// ```
    pub fn is_game_over(&self) -> bool {
        if self.count_empty() > 0 {
            return false;
        }
        // Right and below neighbours cover every adjacent pair.
        for row in 0..SIZE {
            for col in 0..SIZE {
                let v = self.get(row, col);
                if (col + 1 < SIZE && self.get(row, col + 1) == v)
                    || (row + 1 < SIZE && self.get(row + 1, col) == v)
                {
                    return false;
                }
            }
        }
        true
    }

    /// Structural key for transposition lookups.
    #[inline]
    pub fn hash_key(&self) -> BoardKey {
        let mut key = [0; CELLS];
        for (slot, &v) in key.iter_mut().zip(self.0.iter().flatten()) {
            *slot = v;
        }
        key
    }

    /// Highest tile value on the board (0 for an empty board).
    pub fn max_tile(&self) -> Tile {
        self.0.iter().flatten().copied().max().unwrap_or(0)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = "-".repeat(SIZE * 8 - 1);
        for (idx, row) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f, "{sep}")?;
            }
            let cells: Vec<String> = row.iter().map(format_val).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

impl From<Grid> for Board {
    fn from(grid: Grid) -> Self { Board::from_grid(grid) }
}

impl From<Board> for Grid {
    fn from(b: Board) -> Self { b.0 }
}

/// Parse 16 row-major values separated by whitespace and/or commas.
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cells = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|tok| !tok.is_empty())
            .map(|tok| tok.parse::<u64>().map_err(|_| BoardError::Parse(tok.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Board::try_from_cells(&cells)
    }
}

/// Compress one line toward index 0 and merge equal neighbours once each.
///
/// ```
/// use ai_2048_expectimax::engine::merge_line;
/// assert_eq!(merge_line([2, 2, 4, 4]), [4, 8, 0, 0]);
/// assert_eq!(merge_line([2, 2, 2, 2]), [4, 4, 0, 0]);
/// ```
pub fn merge_line(line: Line) -> Line {
    let mut out = [0; SIZE];
    let mut out_idx = 0;
    let mut pending: Option<Tile> = None;
    for &v in line.iter().filter(|&&v| v != 0) {
        match pending {
            Some(p) if p == v => {
                out[out_idx] = p * 2;
                out_idx += 1;
                pending = None;
            }
            Some(p) => {
                out[out_idx] = p;
                out_idx += 1;
                pending = Some(v);
            }
            None => pending = Some(v),
        }
    }
    if let Some(p) = pending {
        out[out_idx] = p;
    }
    out
}

/// Cells of line `idx` ordered from the edge tiles move toward.
#[inline]
fn line_cells(dir: Move, idx: usize) -> [(usize, usize); SIZE] {
    match dir {
        Move::Left => [(idx, 0), (idx, 1), (idx, 2), (idx, 3)],
        Move::Right => [(idx, 3), (idx, 2), (idx, 1), (idx, 0)],
        Move::Up => [(0, idx), (1, idx), (2, idx), (3, idx)],
        Move::Down => [(3, idx), (2, idx), (1, idx), (0, idx)],
    }
}

#[inline]
fn is_tile_value(v: u64) -> bool { v == 0 || v.is_power_of_two() }

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile { if rng.gen_range(0..10) < 9 { 2 } else { 4 } }

fn format_val(val: &Tile) -> String {
    match val {
        0 => " ".repeat(7),
        &x => format!("{x:^7}"),
    }
}
