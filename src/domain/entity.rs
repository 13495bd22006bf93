/// Entities: Player, Enemy, Bullet, GoldBag, Collectible, PowerUp.
/// Plain data; the sim systems own all behavior.
///
/// Positions are the top-left corner of the bounding box in tile units.
/// An entity's cell is the cell containing its box center.

use std::collections::VecDeque;

use glam::Vec2;

use super::collision::{Aabb, Bounds};
use super::effects::{ActiveEffects, PowerUpKind};
use super::grid::TerrainGrid;
use super::tile::Cell;

pub const PLAYER_SIZE: f32 = 0.75;
pub const ENEMY_SIZE: f32 = 0.75;
pub const BULLET_SIZE: f32 = 0.2;
pub const GEM_SIZE: f32 = 0.5;
pub const BAG_SIZE: f32 = 1.0;
pub const POWER_UP_SIZE: f32 = 0.5;

/// Top-left corner that centers a box of `size` inside `cell`.
pub fn centered_in(cell: Cell, size: f32) -> Vec2 {
    TerrainGrid::cell_center(cell) - Vec2::splat(size * 0.5)
}

/// Per-tick input, captured before the tick and read-only during it.
/// Movement is continuous (held), fire is edge-triggered by the host.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputIntent {
    pub move_x: i8,
    pub move_y: i8,
    pub fire_requested: bool,
}

impl InputIntent {
    pub fn idle() -> Self {
        InputIntent::default()
    }

    /// Unit movement vector; diagonals scaled by 1/√2. Zero when idle.
    pub fn direction(&self) -> Vec2 {
        let v = Vec2::new(self.move_x.clamp(-1, 1) as f32, self.move_y.clamp(-1, 1) as f32);
        v.normalize_or_zero()
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub velocity: Vec2,
    /// Last nonzero movement direction (not normalized). Persists while idle.
    pub facing: Vec2,
    pub base_speed: f32,
    pub effects: ActiveEffects,
    pub fire_cooldown: f32,
    /// Remaining seconds of the post-shot slowdown.
    pub shoot_slow: f32,
    pub spawn: Cell,
}

impl Player {
    pub fn new(spawn: Cell, base_speed: f32) -> Self {
        Player {
            pos: centered_in(spawn, PLAYER_SIZE),
            velocity: Vec2::ZERO,
            facing: Vec2::X,
            base_speed,
            effects: ActiveEffects::default(),
            fire_cooldown: 0.0,
            shoot_slow: 0.0,
            spawn,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(PLAYER_SIZE * 0.5)
    }

    /// Back to the spawn cell, at rest. Effects and score are untouched.
    pub fn respawn(&mut self) {
        self.pos = centered_in(self.spawn, PLAYER_SIZE);
        self.velocity = Vec2::ZERO;
        self.fire_cooldown = 0.0;
        self.shoot_slow = 0.0;
    }
}

/// How an enemy decides where to go. Chosen per level.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum EnemyBehavior {
    /// Straight at the player, sliding along tunnel walls.
    DirectChase,
    /// Wander between random neighbouring tunnel cells.
    RandomWalk,
    /// Follow a cached shortest path to the player's cell.
    #[default]
    PathFollowing,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub speed: f32,
    pub behavior: EnemyBehavior,
    /// Remaining waypoints toward the goal (current cell excluded).
    pub path: VecDeque<Cell>,
    /// Seconds until the cached path is considered stale.
    pub repath_timer: f32,
    /// RandomWalk: cell currently being walked to.
    pub wander_target: Option<Cell>,
}

impl Enemy {
    pub fn new(id: u32, cell: Cell, speed: f32, behavior: EnemyBehavior) -> Self {
        Enemy {
            id,
            pos: centered_in(cell, ENEMY_SIZE),
            speed,
            behavior,
            path: VecDeque::new(),
            repath_timer: 0.0,
            wander_target: None,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(ENEMY_SIZE * 0.5)
    }

    pub fn set_center(&mut self, c: Vec2) {
        self.pos = c - Vec2::splat(ENEMY_SIZE * 0.5);
    }
}

#[derive(Clone, Debug)]
pub struct Bullet {
    pub pos: Vec2,
    pub velocity: Vec2,
    /// Seconds left before the bullet fizzles.
    pub ttl: f32,
    /// Fired under multi-fire: digs through dirt instead of stopping.
    pub digs: bool,
}

impl Bullet {
    /// A bullet whose center starts at `origin`.
    pub fn new(origin: Vec2, velocity: Vec2, ttl: f32, digs: bool) -> Self {
        Bullet {
            pos: origin - Vec2::splat(BULLET_SIZE * 0.5),
            velocity,
            ttl,
            digs,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(BULLET_SIZE * 0.5)
    }
}

#[derive(Clone, Debug)]
pub struct Collectible {
    pub cell: Cell,
    pub collected: bool,
}

impl Collectible {
    pub fn new(cell: Cell) -> Self {
        Collectible { cell, collected: false }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BagState {
    Resting,
    Falling,
}

/// Gold bag lifecycle: Resting → Falling → Resting.
///
/// `fall_origin` is the y the current fall started from; lethality is
/// judged on the distance fallen since then.
#[derive(Clone, Debug)]
pub struct GoldBag {
    pub pos: Vec2,
    pub state: BagState,
    pub vy: f32,
    pub fall_origin: f32,
}

impl GoldBag {
    pub fn new(cell: Cell) -> Self {
        GoldBag {
            pos: centered_in(cell, BAG_SIZE),
            state: BagState::Resting,
            vy: 0.0,
            fall_origin: 0.0,
        }
    }

    /// Column the bag occupies (bags only move vertically).
    pub fn col(&self) -> usize {
        (self.pos.x + BAG_SIZE * 0.5).floor().max(0.0) as usize
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + BAG_SIZE
    }

    pub fn fall_distance(&self) -> f32 {
        match self.state {
            BagState::Falling => self.pos.y - self.fall_origin,
            BagState::Resting => 0.0,
        }
    }

    pub fn is_lethal(&self, threshold: f32) -> bool {
        self.fall_distance() > threshold
    }
}

#[derive(Clone, Debug)]
pub struct PowerUp {
    pub cell: Cell,
    pub kind: PowerUpKind,
    pub consumed: bool,
}

impl PowerUp {
    pub fn new(cell: Cell, kind: PowerUpKind) -> Self {
        PowerUp { cell, kind, consumed: false }
    }
}

// ── Bounds ──

impl Bounds for Player {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::splat(PLAYER_SIZE))
    }
}

impl Bounds for Enemy {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::splat(ENEMY_SIZE))
    }
}

impl Bounds for Bullet {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::splat(BULLET_SIZE))
    }
}

impl Bounds for Collectible {
    fn bounds(&self) -> Aabb {
        Aabb::new(centered_in(self.cell, GEM_SIZE), Vec2::splat(GEM_SIZE))
    }
}

impl Bounds for GoldBag {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::splat(BAG_SIZE))
    }
}

impl Bounds for PowerUp {
    fn bounds(&self) -> Aabb {
        Aabb::new(centered_in(self.cell, POWER_UP_SIZE), Vec2::splat(POWER_UP_SIZE))
    }
}
