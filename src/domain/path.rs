/// Shortest-route search through dug tunnels.
///
/// The graph is the 4-connected grid; an edge exists into a cell iff
/// that cell is passable. Two interchangeable searches:
///   1. **Bfs**: uniform-cost breadth-first search.
///   2. **AStar**: binary-heap A* with the Manhattan heuristic
///      (admissible and consistent on a unit-cost 4-grid).
///
/// Goal policy: the goal cell is always traversable, even when it is
/// still dirt. The start cell is always a valid origin.
///
/// The returned path excludes `start` and includes `goal`, so its
/// length is the shortest-path distance. Empty means "already there"
/// or "no route"; the search never panics.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use super::grid::TerrainGrid;
use super::tile::Cell;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PathAlgorithm {
    Bfs,
    #[default]
    AStar,
}

pub fn find_path(grid: &TerrainGrid, start: Cell, goal: Cell, algorithm: PathAlgorithm) -> Vec<Cell> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) || start == goal {
        return Vec::new();
    }
    match algorithm {
        PathAlgorithm::Bfs => bfs(grid, start, goal),
        PathAlgorithm::AStar => astar(grid, start, goal),
    }
}

/// Can the search step into `cell`? Goal-always-reachable.
#[inline]
fn enterable(grid: &TerrainGrid, cell: Cell, goal: Cell) -> bool {
    cell == goal || grid.is_passable(cell)
}

#[inline]
fn index(grid: &TerrainGrid, cell: Cell) -> usize {
    cell.row * grid.cols() + cell.col
}

fn bfs(grid: &TerrainGrid, start: Cell, goal: Cell) -> Vec<Cell> {
    let mut parent: Vec<Option<Cell>> = vec![None; grid.rows() * grid.cols()];
    let mut visited = vec![false; grid.rows() * grid.cols()];
    visited[index(grid, start)] = true;

    let mut queue: VecDeque<Cell> = VecDeque::with_capacity(64);
    queue.push_back(start);

    while let Some(cur) = queue.pop_front() {
        if cur == goal {
            return reconstruct(grid, &parent, start, goal);
        }
        for next in grid.neighbours(cur) {
            let i = index(grid, next);
            if visited[i] || !enterable(grid, next, goal) {
                continue;
            }
            visited[i] = true;
            parent[i] = Some(cur);
            queue.push_back(next);
        }
    }
    Vec::new()
}

fn astar(grid: &TerrainGrid, start: Cell, goal: Cell) -> Vec<Cell> {
    let n = grid.rows() * grid.cols();
    let mut parent: Vec<Option<Cell>> = vec![None; n];
    let mut g_score = vec![usize::MAX; n];
    let mut closed = vec![false; n];

    // (f, insertion seq, cell): seq keeps equal-f pops in insertion order.
    let mut open: BinaryHeap<Reverse<(usize, u64, Cell)>> = BinaryHeap::with_capacity(64);
    let mut seq: u64 = 0;

    g_score[index(grid, start)] = 0;
    open.push(Reverse((start.manhattan(goal), seq, start)));

    while let Some(Reverse((_, _, cur))) = open.pop() {
        let ci = index(grid, cur);
        if closed[ci] {
            continue;
        }
        if cur == goal {
            return reconstruct(grid, &parent, start, goal);
        }
        closed[ci] = true;

        let g_next = g_score[ci] + 1;
        for next in grid.neighbours(cur) {
            let ni = index(grid, next);
            if closed[ni] || !enterable(grid, next, goal) {
                continue;
            }
            if g_next < g_score[ni] {
                g_score[ni] = g_next;
                parent[ni] = Some(cur);
                seq += 1;
                open.push(Reverse((g_next + next.manhattan(goal), seq, next)));
            }
        }
    }
    Vec::new()
}

fn reconstruct(grid: &TerrainGrid, parent: &[Option<Cell>], start: Cell, goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut cur = goal;
    while let Some(prev) = parent[index(grid, cur)] {
        if prev == start {
            break;
        }
        path.push(prev);
        cur = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::tests::grid_from;
    use crate::domain::tile::Tile;

    const BOTH: [PathAlgorithm; 2] = [PathAlgorithm::Bfs, PathAlgorithm::AStar];

    /// Reference distances from `start` by plain flood fill (goal not special).
    fn reference_distance(grid: &TerrainGrid, start: Cell, goal: Cell) -> Option<usize> {
        let mut dist = vec![vec![usize::MAX; grid.cols()]; grid.rows()];
        dist[start.row][start.col] = 0;
        let mut q = VecDeque::from([start]);
        while let Some(c) = q.pop_front() {
            for n in grid.neighbours(c) {
                if grid.is_passable(n) && dist[n.row][n.col] == usize::MAX {
                    dist[n.row][n.col] = dist[c.row][c.col] + 1;
                    q.push_back(n);
                }
            }
        }
        let d = dist[goal.row][goal.col];
        (d != usize::MAX).then_some(d)
    }

    fn assert_valid_walk(grid: &TerrainGrid, start: Cell, path: &[Cell]) {
        let mut prev = start;
        for &c in path {
            assert_eq!(prev.manhattan(c), 1, "path jumps from {prev:?} to {c:?}");
            assert!(grid.is_passable(c), "path enters dirt at {c:?}");
            prev = c;
        }
    }

    /// Deterministic pseudo-random 5×5 layouts (xorshift, no rng crate needed here).
    fn layouts() -> Vec<TerrainGrid> {
        let mut state: u32 = 0x9E37_79B9;
        let mut out = vec![];
        for _ in 0..200 {
            let mut tiles = vec![vec![Tile::Cleared; 5]; 5];
            for row in tiles.iter_mut() {
                for t in row.iter_mut() {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    if state % 100 < 35 {
                        *t = Tile::Dirt;
                    }
                }
            }
            out.push(TerrainGrid::from_tiles(tiles));
        }
        out
    }

    #[test]
    fn path_length_matches_exhaustive_bfs() {
        for grid in layouts() {
            let cells: Vec<Cell> = grid.passable_cells().collect();
            for &s in &cells {
                for &g in &cells {
                    let expected = reference_distance(&grid, s, g);
                    for algo in BOTH {
                        let path = find_path(&grid, s, g, algo);
                        match expected {
                            Some(d) => {
                                assert_eq!(path.len(), d, "{algo:?} {s:?}->{g:?}");
                                assert_valid_walk(&grid, s, &path);
                                if d > 0 {
                                    assert_eq!(path.last(), Some(&g));
                                }
                            }
                            None => assert!(path.is_empty(), "{algo:?} {s:?}->{g:?}"),
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn wall_of_dirt_blocks_route() {
        let grid = grid_from(&[
            "..#..",
            "..#..",
            "..#..",
            "..#..",
            "..#..",
        ]);
        for algo in BOTH {
            assert!(find_path(&grid, Cell::new(2, 0), Cell::new(2, 4), algo).is_empty());
        }
    }

    #[test]
    fn routes_around_obstacles() {
        let grid = grid_from(&[
            ".....",
            ".###.",
            ".#...",
            ".#.##",
            "...##",
        ]);
        for algo in BOTH {
            let path = find_path(&grid, Cell::new(2, 2), Cell::new(4, 0), algo);
            assert_eq!(path.len(), 4, "{algo:?}");
            assert_eq!(path.last(), Some(&Cell::new(4, 0)));
        }
    }

    #[test]
    fn dirt_goal_is_reachable() {
        let grid = grid_from(&[
            "...#",
            "####",
        ]);
        for algo in BOTH {
            let path = find_path(&grid, Cell::new(0, 0), Cell::new(0, 3), algo);
            assert_eq!(path, vec![Cell::new(0, 1), Cell::new(0, 2), Cell::new(0, 3)]);
            // A dirt goal does not open routes through other dirt.
            assert!(find_path(&grid, Cell::new(0, 0), Cell::new(1, 3), algo).is_empty());
        }
    }

    #[test]
    fn start_equals_goal_is_empty() {
        let grid = grid_from(&["..."]);
        for algo in BOTH {
            assert!(find_path(&grid, Cell::new(0, 1), Cell::new(0, 1), algo).is_empty());
        }
    }

    #[test]
    fn out_of_bounds_endpoints_are_empty() {
        let grid = grid_from(&["..."]);
        for algo in BOTH {
            assert!(find_path(&grid, Cell::new(0, 0), Cell::new(3, 3), algo).is_empty());
            assert!(find_path(&grid, Cell::new(5, 0), Cell::new(0, 2), algo).is_empty());
        }
    }
}
