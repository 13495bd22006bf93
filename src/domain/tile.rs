/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Dirt,     // Solid until dug
    Cleared,  // Tunnel: entities may occupy it
}

impl Tile {
    /// Can an entity occupy this cell?
    pub fn is_passable(self) -> bool {
        matches!(self, Tile::Cleared)
    }

    /// Can this tile be dug (by the player or a multi-fire bullet)?
    pub fn is_diggable(self) -> bool {
        matches!(self, Tile::Dirt)
    }

    /// Glyph used by predefined layouts and debug dumps.
    pub fn glyph(self) -> char {
        match self {
            Tile::Dirt => '#',
            Tile::Cleared => '.',
        }
    }
}

/// A grid coordinate. `row` grows downward, `col` grows rightward.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    pub fn manhattan(self, other: Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Offset by a signed delta. None if it would go negative.
    pub fn offset(self, drow: i32, dcol: i32) -> Option<Cell> {
        let row = self.row as i64 + drow as i64;
        let col = self.col as i64 + dcol as i64;
        if row < 0 || col < 0 {
            return None;
        }
        Some(Cell::new(row as usize, col as usize))
    }
}
