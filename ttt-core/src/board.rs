use crate::{TttGameState, TttOutcome, TttPos, TttSide};

pub const BOARD_SIZE: usize = 3;

/// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
const WIN_LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(2, 0), (1, 1), (0, 2)],
];

/// A 3×3 grid of cells. The sole source of truth for terminal-state
/// detection is [`TttBoard::evaluate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TttBoard {
    cells: [[Option<TttSide>; BOARD_SIZE]; BOARD_SIZE],
}

impl TttBoard {
    pub fn new() -> Self {
        TttBoard::default()
    }

    /// The mark at `pos`, if any. Callers must pass a valid position.
    pub fn get(&self, pos: &TttPos) -> Option<TttSide> {
        debug_assert!(pos.is_valid());
        self.cells[pos.x as usize][pos.y as usize]
    }

    /// Writes `side` into the cell at `pos`. Callers must pass a valid
    /// position; occupancy is checked by the coordinator beforehand.
    pub fn set(&mut self, pos: &TttPos, side: TttSide) {
        debug_assert!(pos.is_valid());
        self.cells[pos.x as usize][pos.y as usize] = Some(side);
    }

    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_some()))
    }

    /// Resets every cell to empty, for a rematch round.
    pub fn clear(&mut self) {
        self.cells = Default::default();
    }

    /// The cells in row-major order (index `3 * x + y`).
    pub fn cells(&self) -> [Option<TttSide>; BOARD_SIZE * BOARD_SIZE] {
        let mut flat = [None; BOARD_SIZE * BOARD_SIZE];
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                flat[BOARD_SIZE * x + y] = self.cells[x][y];
            }
        }
        flat
    }

    /// Checks all 8 lines for three equal marks, then fullness.
    pub fn evaluate(&self) -> TttGameState {
        for line in &WIN_LINES {
            let [a, b, c] = line.map(|(x, y)| self.cells[x][y]);
            if let Some(side) = a
                && b == Some(side)
                && c == Some(side)
            {
                return TttGameState::Over(TttOutcome::Win(side));
            }
        }
        if self.is_full() {
            TttGameState::Over(TttOutcome::Draw)
        } else {
            TttGameState::Ongoing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board_is_ongoing() {
        let board = TttBoard::new();
        assert_eq!(board.evaluate(), TttGameState::Ongoing);
        assert!(!board.is_full());
    }

    #[test]
    fn test_every_win_line_is_detected() {
        for side in TttSide::ALL {
            for line in &WIN_LINES {
                let mut board = TttBoard::new();
                for (x, y) in line {
                    board.set(&TttPos::new(*x as u8, *y as u8), side);
                }
                assert_eq!(
                    board.evaluate(),
                    TttGameState::Over(TttOutcome::Win(side)),
                    "line {:?} should win for {}",
                    line,
                    side
                );
            }
        }
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        // X O X
        // X O O
        // O X X
        let mut board = TttBoard::new();
        let marks = [
            (0, 0, TttSide::X),
            (0, 1, TttSide::O),
            (0, 2, TttSide::X),
            (1, 0, TttSide::X),
            (1, 1, TttSide::O),
            (1, 2, TttSide::O),
            (2, 0, TttSide::O),
            (2, 1, TttSide::X),
            (2, 2, TttSide::X),
        ];
        for (x, y, side) in marks {
            board.set(&TttPos::new(x, y), side);
        }
        assert!(board.is_full());
        assert_eq!(board.evaluate(), TttGameState::Over(TttOutcome::Draw));
    }

    #[test]
    fn test_partial_board_is_ongoing() {
        let mut board = TttBoard::new();
        board.set(&TttPos::new(0, 0), TttSide::X);
        board.set(&TttPos::new(0, 1), TttSide::X);
        board.set(&TttPos::new(1, 1), TttSide::O);
        assert_eq!(board.evaluate(), TttGameState::Ongoing);
    }

    #[test]
    fn test_clear_resets_all_cells() {
        let mut board = TttBoard::new();
        board.set(&TttPos::new(1, 1), TttSide::X);
        board.set(&TttPos::new(2, 0), TttSide::O);
        board.clear();
        assert_eq!(board, TttBoard::new());
        assert!(board.cells().iter().all(|cell| cell.is_none()));
    }

    #[test]
    fn test_cells_are_row_major() {
        let mut board = TttBoard::new();
        board.set(&TttPos::new(1, 1), TttSide::X);
        board.set(&TttPos::new(2, 0), TttSide::O);
        let flat = board.cells();
        assert_eq!(flat[4], Some(TttSide::X));
        assert_eq!(flat[6], Some(TttSide::O));
        assert_eq!(flat.iter().filter(|cell| cell.is_some()).count(), 2);
    }
}
