mod board;

pub use board::{BOARD_SIZE, TttBoard};

/// One of the two fixed roles a participant occupies in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TttSide {
    X,
    O,
}

impl TttSide {
    pub const ALL: [TttSide; 2] = [TttSide::X, TttSide::O];

    pub fn opponent(&self) -> TttSide {
        match self {
            TttSide::X => TttSide::O,
            TttSide::O => TttSide::X,
        }
    }
}

impl std::fmt::Display for TttSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TttSide::X => write!(f, "X"),
            TttSide::O => write!(f, "O"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TttPos {
    pub x: u8,
    pub y: u8,
}

impl TttPos {
    pub fn new(x: u8, y: u8) -> Self {
        TttPos { x, y }
    }

    pub fn is_valid(&self) -> bool {
        (self.x as usize) < BOARD_SIZE && (self.y as usize) < BOARD_SIZE
    }
}

/// Terminal result of a single round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TttOutcome {
    Win(TttSide),
    Draw,
}

/// Result of evaluating a board position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TttGameState {
    Ongoing,
    Over(TttOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(TttSide::X.opponent(), TttSide::O);
        assert_eq!(TttSide::O.opponent(), TttSide::X);
    }

    #[test]
    fn test_side_display() {
        assert_eq!(TttSide::X.to_string(), "X");
        assert_eq!(TttSide::O.to_string(), "O");
    }

    #[test]
    fn test_pos_validation() {
        assert!(TttPos::new(0, 0).is_valid());
        assert!(TttPos::new(2, 2).is_valid());
        assert!(!TttPos::new(3, 0).is_valid());
        assert!(!TttPos::new(0, 3).is_valid());
        assert!(!TttPos::new(255, 255).is_valid());
    }
}
