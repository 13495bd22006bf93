/// SimulationContext: the complete state of a running game.
///
/// One owned context per run. All systems take `&mut SimulationContext`
/// and run in a fixed order inside `tick()`; the host only reads it back
/// through `snapshot()`.
///
/// ## Tile Architecture
///
/// `grid` is the live terrain. Digging only ever clears cells, so a
/// cached enemy path stays walkable until the level is rebuilt.
///
/// ## Spawns
///
/// `player_spawn` / `enemy_spawn` are fixed per terrain. Enemies always
/// enter at `enemy_spawn`, the player returns to `player_spawn` on a hit.

use rand::rngs::StdRng;

use crate::config::Tuning;
use crate::domain::ai::AiParams;
use crate::domain::entity::{Bullet, Collectible, Enemy, GoldBag, Player, PowerUp};
use crate::domain::grid::TerrainGrid;
use crate::domain::tile::Cell;
use super::event::GameEvent;
use super::level::LevelConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver,
}

pub struct SimulationContext {
    // ── Terrain ──
    pub grid: TerrainGrid,
    pub player_spawn: Cell,
    pub enemy_spawn: Cell,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub bags: Vec<GoldBag>,
    pub collectibles: Vec<Collectible>,
    pub power_ups: Vec<PowerUp>,

    // ── Meta ──
    pub phase: Phase,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    /// Simulated seconds since the run started.
    pub elapsed: f32,

    // ── Timers / counters ──
    pub enemy_spawn_timer: f32,
    pub next_enemy_id: u32,
    /// Set once the player has been hit this tick.
    pub hit_this_tick: bool,

    // ── Config ──
    pub config: LevelConfig,
    pub tuning: Tuning,
    pub rng: StdRng,

    /// Events emitted by the most recent tick.
    pub events: Vec<GameEvent>,
}

// ── Derived level parameters ──

impl SimulationContext {
    /// Zero-based level index used by the per-level scaling rules.
    fn level_offset(&self) -> usize {
        self.level.saturating_sub(1) as usize
    }

    pub fn enemy_speed(&self) -> f32 {
        self.config.enemy_speed + self.tuning.enemy_speed_per_level * self.level_offset() as f32
    }

    /// Concurrent enemy cap for the current level.
    pub fn max_enemies(&self) -> usize {
        self.config.enemy_count + self.level_offset()
    }

    pub fn collectible_target(&self) -> usize {
        self.config.collectible_count + self.tuning.collectibles_per_level * self.level_offset()
    }

    pub fn gold_bag_target(&self) -> usize {
        self.tuning.gold_bag_count + self.level_offset()
    }

    pub fn ai_params(&self) -> AiParams {
        AiParams {
            algorithm: self.tuning.path_algorithm,
            repath_interval: self.tuning.repath_interval,
        }
    }
}

// ── Queries ──

impl SimulationContext {
    /// The cell containing the player's center.
    pub fn player_cell(&self) -> Option<Cell> {
        self.grid.cell_at(self.player.center())
    }

    pub fn gems_remaining(&self) -> usize {
        self.collectibles.iter().filter(|c| !c.collected).count()
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}

// ── Entity spawning ──

impl SimulationContext {
    /// Add one enemy at the enemy spawn if the level cap allows it.
    /// Returns the new enemy's id.
    pub fn spawn_enemy(&mut self, events: &mut Vec<GameEvent>) -> Option<u32> {
        if self.enemies.len() >= self.max_enemies() {
            return None;
        }
        if self.grid.dig(self.enemy_spawn) {
            events.push(GameEvent::Dug { cell: self.enemy_spawn });
        }
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        let speed = self.enemy_speed();
        self.enemies.push(Enemy::new(id, self.enemy_spawn, speed, self.config.enemy_behavior));
        events.push(GameEvent::EnemySpawned { id });
        tracing::debug!(id, cell = ?self.enemy_spawn, speed, "enemy spawned");
        Some(id)
    }
}
