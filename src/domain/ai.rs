/// Enemy AI: decides where each enemy heads this tick.
///
/// Three behaviours, one per level:
///   1. **PathFollowing**: cached shortest path to the player's cell,
///      refreshed every `repath_interval` seconds or when exhausted.
///   2. **DirectChase**: straight at the player; the mover slides along
///      walls axis by axis.
///   3. **RandomWalk**: wander to a random neighbouring tunnel cell.
///
/// Decisions never point into Dirt. A `Waypoint` is always the center of
/// the enemy's own cell or of a passable neighbour, so the straight line
/// to it stays inside those two cells.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;

use super::entity::{Enemy, EnemyBehavior};
use super::grid::TerrainGrid;
use super::path::{find_path, PathAlgorithm};
use super::tile::Cell;

/// Distance at which a waypoint counts as reached.
pub const ARRIVE_EPS: f32 = 1e-3;

#[derive(Clone, Copy, Debug)]
pub struct AiParams {
    pub algorithm: PathAlgorithm,
    pub repath_interval: f32,
}

/// Movement order for one enemy for one tick.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Steer {
    /// No legal move.
    Hold,
    /// Straight line to a point that is safe to reach directly.
    Waypoint(Vec2),
    /// Head for a point, resolving each axis against the terrain.
    Slide(Vec2),
}

pub fn decide<R: Rng>(
    grid: &TerrainGrid,
    enemy: &mut Enemy,
    player_center: Vec2,
    params: &AiParams,
    rng: &mut R,
    dt: f32,
) -> Steer {
    let here = match grid.cell_at(enemy.center()) {
        Some(c) => c,
        None => return Steer::Hold,
    };
    match enemy.behavior {
        EnemyBehavior::PathFollowing => follow_path(grid, enemy, here, player_center, params, dt),
        EnemyBehavior::DirectChase => Steer::Slide(player_center),
        EnemyBehavior::RandomWalk => wander(grid, enemy, here, rng),
    }
}

// ── PathFollowing ──

fn follow_path(
    grid: &TerrainGrid,
    enemy: &mut Enemy,
    here: Cell,
    player_center: Vec2,
    params: &AiParams,
    dt: f32,
) -> Steer {
    enemy.repath_timer -= dt;

    let target = match grid.cell_at(player_center) {
        Some(c) => c,
        None => return Steer::Hold,
    };

    if target == here {
        enemy.path.clear();
        enemy.repath_timer = 0.0;
        return Steer::Waypoint(player_center);
    }

    while let Some(&next) = enemy.path.front() {
        if enemy.center().distance(TerrainGrid::cell_center(next)) > ARRIVE_EPS {
            break;
        }
        enemy.path.pop_front();
        if enemy.path.is_empty() {
            enemy.repath_timer = 0.0;
        }
    }

    // A failed search leaves the cache empty until the timer runs out.
    if enemy.repath_timer <= 0.0 {
        enemy.path = find_path(grid, here, target, params.algorithm).into();
        enemy.repath_timer = params.repath_interval;
        tracing::trace!(id = enemy.id, len = enemy.path.len(), "repath");
    }

    match enemy.path.front() {
        Some(&next) if next == here || is_step(grid, here, next) => {
            Steer::Waypoint(TerrainGrid::cell_center(next))
        }
        Some(_) => {
            // Stale cache (not adjacent any more); rebuild next tick.
            enemy.path.clear();
            enemy.repath_timer = 0.0;
            Steer::Hold
        }
        None => Steer::Hold,
    }
}

/// `next` is a passable 4-neighbour of `here`.
fn is_step(grid: &TerrainGrid, here: Cell, next: Cell) -> bool {
    here.manhattan(next) == 1 && grid.is_passable(next)
}

// ── RandomWalk ──

fn wander<R: Rng>(grid: &TerrainGrid, enemy: &mut Enemy, here: Cell, rng: &mut R) -> Steer {
    if let Some(t) = enemy.wander_target {
        let arrived = enemy.center().distance(TerrainGrid::cell_center(t)) <= ARRIVE_EPS;
        let valid = t == here || is_step(grid, here, t);
        if arrived || !valid {
            enemy.wander_target = None;
        }
    }

    if enemy.wander_target.is_none() {
        let options: Vec<Cell> = grid.neighbours(here).filter(|c| grid.is_passable(*c)).collect();
        enemy.wander_target = options.choose(rng).copied();
    }

    match enemy.wander_target {
        Some(t) => Steer::Waypoint(TerrainGrid::cell_center(t)),
        None => Steer::Hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::tests::grid_from;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params() -> AiParams {
        AiParams { algorithm: PathAlgorithm::AStar, repath_interval: 0.5 }
    }

    #[test]
    fn path_follower_heads_for_next_tunnel_cell() {
        let grid = grid_from(&[
            "#####",
            ".....",
            "#####",
        ]);
        let mut e = Enemy::new(0, Cell::new(1, 4), 1.0, EnemyBehavior::PathFollowing);
        let mut rng = StdRng::seed_from_u64(0);
        let player = TerrainGrid::cell_center(Cell::new(1, 0));
        let steer = decide(&grid, &mut e, player, &params(), &mut rng, 0.016);
        assert_eq!(steer, Steer::Waypoint(Vec2::new(3.5, 1.5)));
        assert_eq!(e.path.len(), 4);
        assert_eq!(e.repath_timer, 0.5);
    }

    #[test]
    fn path_follower_holds_without_route() {
        let grid = grid_from(&[
            "..#..",
        ]);
        let mut e = Enemy::new(0, Cell::new(0, 4), 1.0, EnemyBehavior::PathFollowing);
        let mut rng = StdRng::seed_from_u64(0);
        let player = TerrainGrid::cell_center(Cell::new(0, 0));
        assert_eq!(decide(&grid, &mut e, player, &params(), &mut rng, 0.016), Steer::Hold);
    }

    #[test]
    fn failed_search_waits_for_repath_interval() {
        let grid = grid_from(&["..#.."]);
        let mut e = Enemy::new(0, Cell::new(0, 4), 1.0, EnemyBehavior::PathFollowing);
        let mut rng = StdRng::seed_from_u64(0);
        let player = TerrainGrid::cell_center(Cell::new(0, 0));

        decide(&grid, &mut e, player, &params(), &mut rng, 0.016);
        assert_eq!(e.repath_timer, 0.5);

        // Every search resets the timer, so a steady countdown means none ran.
        for tick in 1..=10 {
            assert_eq!(decide(&grid, &mut e, player, &params(), &mut rng, 0.016), Steer::Hold);
            let expected = 0.5 - 0.016 * tick as f32;
            assert!((e.repath_timer - expected).abs() < 1e-4, "searched again on tick {tick}");
        }

        // Once the interval is up the route is searched again.
        decide(&grid, &mut e, player, &params(), &mut rng, 0.5);
        assert_eq!(e.repath_timer, 0.5);
    }

    #[test]
    fn same_cell_moves_straight_at_player() {
        let grid = grid_from(&["..."]);
        let mut e = Enemy::new(0, Cell::new(0, 1), 1.0, EnemyBehavior::PathFollowing);
        let mut rng = StdRng::seed_from_u64(0);
        let player = Vec2::new(1.2, 0.4);
        assert_eq!(
            decide(&grid, &mut e, player, &params(), &mut rng, 0.016),
            Steer::Waypoint(player)
        );
        assert!(e.path.is_empty());
    }

    #[test]
    fn reached_waypoint_is_popped() {
        let grid = grid_from(&["...."]);
        let mut e = Enemy::new(0, Cell::new(0, 3), 1.0, EnemyBehavior::PathFollowing);
        let mut rng = StdRng::seed_from_u64(0);
        let player = TerrainGrid::cell_center(Cell::new(0, 0));
        decide(&grid, &mut e, player, &params(), &mut rng, 0.016);
        e.set_center(TerrainGrid::cell_center(Cell::new(0, 2)));
        let steer = decide(&grid, &mut e, player, &params(), &mut rng, 0.016);
        assert_eq!(steer, Steer::Waypoint(Vec2::new(1.5, 0.5)));
        assert_eq!(e.path.len(), 2);
    }

    #[test]
    fn direct_chase_slides_toward_player() {
        let grid = grid_from(&["..."]);
        let mut e = Enemy::new(0, Cell::new(0, 0), 1.0, EnemyBehavior::DirectChase);
        let mut rng = StdRng::seed_from_u64(0);
        let player = Vec2::new(2.5, 0.5);
        assert_eq!(
            decide(&grid, &mut e, player, &params(), &mut rng, 0.016),
            Steer::Slide(player)
        );
    }

    #[test]
    fn random_walk_only_picks_tunnel_neighbours() {
        let grid = grid_from(&[
            "#.#",
            "...",
            "###",
        ]);
        let allowed = [Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 2)];
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut e = Enemy::new(0, Cell::new(1, 1), 1.0, EnemyBehavior::RandomWalk);
            let steer = decide(&grid, &mut e, Vec2::ZERO, &params(), &mut rng, 0.016);
            let t = e.wander_target.expect("has a target");
            assert!(allowed.contains(&t), "seed {seed}: {t:?}");
            assert_eq!(steer, Steer::Waypoint(TerrainGrid::cell_center(t)));
        }
    }

    #[test]
    fn walled_in_enemy_holds() {
        let grid = grid_from(&[
            "###",
            "#.#",
            "###",
        ]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut e = Enemy::new(0, Cell::new(1, 1), 1.0, EnemyBehavior::RandomWalk);
        assert_eq!(decide(&grid, &mut e, Vec2::ZERO, &params(), &mut rng, 0.016), Steer::Hold);
    }
}
