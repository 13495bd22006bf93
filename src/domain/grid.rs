/// TerrainGrid: the mutable dirt map a level is played on.
///
/// Cells are indexed `[row][col]`. World space uses tile units with
/// `x` along columns and `y` along rows, so cell `(row, col)` covers
/// `[col, col + 1) × [row, row + 1)`.
///
/// All tile mutations go through `dig()`, which keeps the dirt
/// counter in sync so `remaining_dirt_count()` is O(1).

use glam::Vec2;
use rand::Rng;

use super::tile::{Cell, Tile};

/// Chance per column that the tunnel walk shifts a row.
pub const TUNNEL_SHIFT_CHANCE: f64 = 0.3;

const DIRS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Clone, Debug)]
pub struct TerrainGrid {
    tiles: Vec<Vec<Tile>>,
    rows: usize,
    cols: usize,
    dirt_remaining: usize,
}

// ── Construction ──

impl TerrainGrid {
    /// A fresh grid with every cell set to Dirt.
    pub fn new(rows: usize, cols: usize) -> Self {
        TerrainGrid {
            tiles: vec![vec![Tile::Dirt; cols]; rows],
            rows,
            cols,
            dirt_remaining: rows * cols,
        }
    }

    /// Build from explicit tiles. Rows must all be the same length.
    pub fn from_tiles(tiles: Vec<Vec<Tile>>) -> Self {
        let rows = tiles.len();
        let cols = tiles.first().map_or(0, |r| r.len());
        let dirt_remaining = tiles
            .iter()
            .flatten()
            .filter(|t| **t == Tile::Dirt)
            .count();
        TerrainGrid { tiles, rows, cols, dirt_remaining }
    }

    /// Randomized horizontal walk from column 0 to `cols - 1`.
    ///
    /// Each column clears the current row. With `TUNNEL_SHIFT_CHANCE`
    /// the walk steps one row up (coin flip, when not on the top row)
    /// or down (when not on the bottom row) and clears that cell too,
    /// so consecutive columns always share a cleared edge.
    ///
    /// Returns the row the walk ended on.
    pub fn carve_tunnel<R: Rng>(&mut self, rng: &mut R, start_row: usize) -> usize {
        if self.rows == 0 || self.cols == 0 {
            return 0;
        }
        let mut row = start_row.min(self.rows - 1);
        for col in 0..self.cols {
            self.dig(Cell::new(row, col));
            if rng.gen_bool(TUNNEL_SHIFT_CHANCE) {
                if row > 0 && rng.gen_bool(0.5) {
                    row -= 1;
                } else if row + 1 < self.rows {
                    row += 1;
                }
                self.dig(Cell::new(row, col));
            }
        }
        row
    }
}

// ── Tile query / mutation API ──

impl TerrainGrid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Tile at `cell`; out of bounds reads as Dirt (a wall).
    #[inline]
    pub fn tile_at(&self, cell: Cell) -> Tile {
        if self.in_bounds(cell) {
            self.tiles[cell.row][cell.col]
        } else {
            Tile::Dirt
        }
    }

    /// In bounds and Cleared.
    #[inline]
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.tile_at(cell).is_passable()
    }

    /// Signed variant for neighbour probing.
    #[inline]
    pub fn is_passable_at(&self, row: i32, col: i32) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        self.is_passable(Cell::new(row as usize, col as usize))
    }

    /// Clear a cell. Idempotent. Returns true only if dirt was removed.
    pub fn dig(&mut self, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        let tile = &mut self.tiles[cell.row][cell.col];
        if tile.is_diggable() {
            *tile = Tile::Cleared;
            self.dirt_remaining -= 1;
            true
        } else {
            false
        }
    }

    pub fn remaining_dirt_count(&self) -> usize {
        self.dirt_remaining
    }

    pub fn all_clear(&self) -> bool {
        self.dirt_remaining == 0
    }

    /// In-bounds 4-neighbours in fixed order: up, down, left, right.
    pub fn neighbours(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        DIRS.iter()
            .filter_map(move |&(dr, dc)| cell.offset(dr, dc))
            .filter(move |c| self.in_bounds(*c))
    }

    pub fn passable_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(move |c| self.is_passable(*c))
    }

    pub fn dirt_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(move |c| !self.is_passable(*c))
    }

    fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Cell::new(row, col)))
    }
}

// ── World-space mapping ──

impl TerrainGrid {
    /// World size in tile units (x = cols, y = rows).
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.cols as f32, self.rows as f32)
    }

    /// The cell containing world point `p`, or None outside the grid.
    pub fn cell_at(&self, p: Vec2) -> Option<Cell> {
        if !p.x.is_finite() || !p.y.is_finite() || p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let cell = Cell::new(p.y.floor() as usize, p.x.floor() as usize);
        self.in_bounds(cell).then_some(cell)
    }

    /// World-space center of a cell.
    pub fn cell_center(cell: Cell) -> Vec2 {
        Vec2::new(cell.col as f32 + 0.5, cell.row as f32 + 0.5)
    }

    /// Text dump using tile glyphs, one line per row.
    pub fn to_rows(&self) -> Vec<String> {
        self.tiles
            .iter()
            .map(|row| row.iter().map(|t| t.glyph()).collect())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    /// Helper: build a grid from a string diagram.
    /// Legend: '#' = Dirt, anything else = Cleared.
    pub(crate) fn grid_from(rows: &[&str]) -> TerrainGrid {
        let tiles = rows
            .iter()
            .map(|r| {
                r.chars()
                    .map(|c| if c == '#' { Tile::Dirt } else { Tile::Cleared })
                    .collect()
            })
            .collect();
        TerrainGrid::from_tiles(tiles)
    }

    /// Number of 4-connected components among passable cells.
    fn passable_components(g: &TerrainGrid) -> usize {
        let mut seen = vec![vec![false; g.cols()]; g.rows()];
        let mut components = 0;
        for start in g.passable_cells() {
            if seen[start.row][start.col] {
                continue;
            }
            components += 1;
            let mut queue = VecDeque::from([start]);
            seen[start.row][start.col] = true;
            while let Some(c) = queue.pop_front() {
                for n in g.neighbours(c) {
                    if g.is_passable(n) && !seen[n.row][n.col] {
                        seen[n.row][n.col] = true;
                        queue.push_back(n);
                    }
                }
            }
        }
        components
    }

    #[test]
    fn new_grid_is_all_dirt() {
        let g = TerrainGrid::new(4, 6);
        assert_eq!(g.remaining_dirt_count(), 24);
        assert!(!g.all_clear());
        assert_eq!(g.passable_cells().count(), 0);
    }

    #[test]
    fn dig_is_idempotent() {
        let mut g = TerrainGrid::new(3, 3);
        let c = Cell::new(1, 2);
        assert!(g.dig(c));
        assert!(!g.dig(c));
        assert_eq!(g.tile_at(c), Tile::Cleared);
        assert!(g.is_passable(c));
        assert!(g.is_passable(c));
        assert_eq!(g.remaining_dirt_count(), 8);
    }

    #[test]
    fn dig_out_of_bounds_is_noop() {
        let mut g = TerrainGrid::new(2, 2);
        assert!(!g.dig(Cell::new(2, 0)));
        assert_eq!(g.remaining_dirt_count(), 4);
    }

    #[test]
    fn out_of_bounds_is_not_passable() {
        let g = grid_from(&["..", ".."]);
        assert!(!g.is_passable(Cell::new(0, 2)));
        assert!(!g.is_passable_at(-1, 0));
        assert!(g.is_passable_at(1, 1));
        assert!(g.all_clear());
    }

    #[test]
    fn tunnel_spans_every_column_and_is_connected() {
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut g = TerrainGrid::new(12, 20);
            let start = (seed as usize) % 12;
            g.carve_tunnel(&mut rng, start);

            for col in 0..g.cols() {
                assert!(
                    (0..g.rows()).any(|row| g.is_passable(Cell::new(row, col))),
                    "seed {seed}: column {col} has no cleared cell"
                );
            }
            assert_eq!(passable_components(&g), 1, "seed {seed}: tunnel split");
        }
    }

    #[test]
    fn tunnel_end_row_is_cleared() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut g = TerrainGrid::new(8, 8);
        let end = g.carve_tunnel(&mut rng, 3);
        assert!(g.is_passable(Cell::new(end, 7)));
        assert!(g.is_passable(Cell::new(3, 0)));
    }

    #[test]
    fn tunnel_in_single_row_grid() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut g = TerrainGrid::new(1, 5);
        assert_eq!(g.carve_tunnel(&mut rng, 0), 0);
        assert!(g.all_clear());
    }

    #[test]
    fn cell_at_maps_world_points() {
        let g = TerrainGrid::new(3, 4);
        assert_eq!(g.cell_at(Vec2::new(0.0, 0.0)), Some(Cell::new(0, 0)));
        assert_eq!(g.cell_at(Vec2::new(3.99, 2.5)), Some(Cell::new(2, 3)));
        assert_eq!(g.cell_at(Vec2::new(4.0, 0.0)), None);
        assert_eq!(g.cell_at(Vec2::new(-0.1, 0.0)), None);
        assert_eq!(TerrainGrid::cell_center(Cell::new(2, 1)), Vec2::new(1.5, 2.5));
    }

    #[test]
    fn neighbours_stay_in_bounds() {
        let g = TerrainGrid::new(3, 3);
        let corner: Vec<Cell> = g.neighbours(Cell::new(0, 0)).collect();
        assert_eq!(corner, vec![Cell::new(1, 0), Cell::new(0, 1)]);
        assert_eq!(g.neighbours(Cell::new(1, 1)).count(), 4);
    }

    #[test]
    fn from_tiles_counts_dirt() {
        let g = grid_from(&["#.#", "..#"]);
        assert_eq!(g.remaining_dirt_count(), 3);
        assert_eq!(g.to_rows(), vec!["#.#".to_string(), "..#".to_string()]);
    }
}
