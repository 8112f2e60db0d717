//! Board state.
//!
//! The board is replaced as a whole (dimensions and grid together) or
//! updated one cell at a time. Win highlighting is not stored here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque color token assigned to a player by the server.
///
/// The server palette is black, red, blue, purple, brown, dark_green, pink,
/// gray, orange and green, but any token is accepted so new colors don't
/// break older clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorToken(String);

impl ColorToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColorToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Grid position. Serialized as `[row, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<Position> for (usize, usize) {
    fn from(pos: Position) -> Self {
        (pos.row, pos.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Largest board accepted from the server, in cells.
pub const MAX_CELLS: usize = 4096;

/// Row-major cell colors.
pub type Grid = Vec<Vec<Option<ColorToken>>>;

/// Why a board failed its shape check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub rows: usize,
    pub columns: usize,
    pub detail: String,
}

/// Board as the server describes it.
///
/// `grid` always has `row_count` rows of `column_count` cells; the
/// constructors enforce it and the fields are only reachable read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    row_count: usize,
    column_count: usize,
    target_run_length: usize,
    grid: Grid,
}

impl Board {
    /// Create an empty board of server-provided dimensions, refusing sizes
    /// over [`MAX_CELLS`].
    pub fn sized(
        row_count: usize,
        column_count: usize,
        target_run_length: usize,
    ) -> Result<Self, ShapeMismatch> {
        check_cell_count(row_count, column_count)?;
        Ok(Self::empty(row_count, column_count, target_run_length))
    }

    /// Create an empty board.
    pub fn empty(row_count: usize, column_count: usize, target_run_length: usize) -> Self {
        Self {
            row_count,
            column_count,
            target_run_length,
            grid: vec![vec![None; column_count]; row_count],
        }
    }

    /// Create a board from a server-provided grid, checking its shape.
    pub fn from_grid(
        row_count: usize,
        column_count: usize,
        target_run_length: usize,
        grid: Grid,
    ) -> Result<Self, ShapeMismatch> {
        check_cell_count(row_count, column_count)?;
        if grid.len() != row_count {
            return Err(ShapeMismatch {
                rows: row_count,
                columns: column_count,
                detail: format!("grid has {} rows", grid.len()),
            });
        }
        if let Some((i, row)) = grid
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != column_count)
        {
            return Err(ShapeMismatch {
                rows: row_count,
                columns: column_count,
                detail: format!("row {} has {} cells", i, row.len()),
            });
        }

        Ok(Self {
            row_count,
            column_count,
            target_run_length,
            grid,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn target_run_length(&self) -> usize {
        self.target_run_length
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Check if position is within the board.
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.row_count && pos.col < self.column_count
    }

    /// Get cell at position. `None` when out of range.
    pub fn cell(&self, pos: Position) -> Option<&Option<ColorToken>> {
        self.grid.get(pos.row).and_then(|row| row.get(pos.col))
    }

    /// Copy of this board with one cell colored. `None` when out of range.
    /// An already colored cell is overwritten; callers that need
    /// write-once cells check [`Board::cell`] first.
    pub fn with_cell(&self, pos: Position, color: ColorToken) -> Option<Self> {
        if !self.contains(pos) {
            return None;
        }

        let mut grid = self.grid.clone();
        grid[pos.row][pos.col] = Some(color);

        Some(Self {
            grid,
            ..self.clone()
        })
    }

    /// Same dimensions, every cell empty.
    pub fn cleared(&self) -> Self {
        Self::empty(self.row_count, self.column_count, self.target_run_length)
    }

    /// Number of colored cells.
    pub fn filled_count(&self) -> usize {
        self.grid.iter().flatten().filter(|c| c.is_some()).count()
    }
}

fn check_cell_count(row_count: usize, column_count: usize) -> Result<(), ShapeMismatch> {
    match row_count.checked_mul(column_count) {
        Some(cells) if cells <= MAX_CELLS => Ok(()),
        _ => Err(ShapeMismatch {
            rows: row_count,
            columns: column_count,
            detail: format!("more than {} cells", MAX_CELLS),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board_shape() {
        let board = Board::empty(6, 7, 4);
        assert_eq!(board.grid().len(), 6);
        assert!(board.grid().iter().all(|row| row.len() == 7));
        assert_eq!(board.filled_count(), 0);
    }

    #[test]
    fn test_from_grid_rejects_bad_shape() {
        let err = Board::from_grid(2, 2, 2, vec![vec![None, None]]).unwrap_err();
        assert_eq!(err.detail, "grid has 1 rows");

        let err = Board::from_grid(2, 2, 2, vec![vec![None, None], vec![None]]).unwrap_err();
        assert_eq!(err.detail, "row 1 has 1 cells");
    }

    #[test]
    fn test_sized_rejects_oversized_boards() {
        assert_eq!(Board::sized(6, 7, 4), Ok(Board::empty(6, 7, 4)));
        assert!(Board::sized(64, 64, 4).is_ok());

        let err = Board::sized(100_000, 100_000, 4).unwrap_err();
        assert_eq!(err.detail, "more than 4096 cells");
        assert!(Board::sized(2, usize::MAX, 4).is_err());
        assert!(Board::from_grid(1, 4097, 4, vec![vec![None; 4097]]).is_err());
    }

    #[test]
    fn test_with_cell() {
        let board = Board::empty(3, 3, 3);
        let colored = board.with_cell(Position::new(2, 1), "red".into()).unwrap();

        assert_eq!(colored.cell(Position::new(2, 1)), Some(&Some("red".into())));
        assert_eq!(colored.filled_count(), 1);
        // Source board untouched
        assert_eq!(board.filled_count(), 0);

        assert!(board.with_cell(Position::new(3, 0), "red".into()).is_none());
        assert!(board.with_cell(Position::new(0, 3), "red".into()).is_none());
    }

    #[test]
    fn test_cleared_keeps_dimensions() {
        let board = Board::empty(4, 5, 3)
            .with_cell(Position::new(0, 0), "blue".into())
            .unwrap();
        let cleared = board.cleared();

        assert_eq!(cleared.row_count(), 4);
        assert_eq!(cleared.column_count(), 5);
        assert_eq!(cleared.target_run_length(), 3);
        assert_eq!(cleared.filled_count(), 0);
    }

    #[test]
    fn test_position_wire_form() {
        let pos: Position = serde_json::from_str("[5, 3]").unwrap();
        assert_eq!(pos, Position::new(5, 3));
        assert_eq!(serde_json::to_string(&pos).unwrap(), "[5,3]");
        assert_eq!(pos.to_string(), "(5, 3)");
    }
}
