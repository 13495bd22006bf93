/// Level setup: configuration, validation, terrain generation, and the
/// placement of gems, gold bags, and power-ups.
///
/// ## Terrain sources
///   1. `TunnelGenerator::RandomWalk`: all-dirt grid with one carved
///      tunnel spanning every column. Player enters at the tunnel's
///      column-0 cell, enemies at its far end.
///   2. `TunnelGenerator::Predefined`: explicit rows of glyphs.
///
/// ## Layout legend:
///   '#' = Dirt            '.' / ' ' = Cleared
///   'P' = Player spawn    'E' = Enemy spawn      (both Cleared)
///
/// Missing `P` falls back to the first passable cell, missing `E` to the
/// last one (row-major order).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::config::Tuning;
use crate::domain::effects::PowerUpKind;
use crate::domain::entity::{Collectible, EnemyBehavior, GoldBag, Player, PowerUp};
use crate::domain::grid::TerrainGrid;
use crate::domain::tile::{Cell, Tile};
use super::event::GameEvent;
use super::world::{Phase, SimulationContext};

#[derive(Clone, Debug, PartialEq)]
pub enum TunnelGenerator {
    RandomWalk,
    Predefined(Vec<String>),
}

/// What finishes a level.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum WinCondition {
    /// Every gem collected (needs at least one gem).
    #[default]
    AllCollected,
    /// No dirt left anywhere.
    AllClear,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelConfig {
    pub rows: usize,
    pub cols: usize,
    pub enemy_count: usize,
    pub enemy_speed: f32,
    pub collectible_count: usize,
    pub tunnel_generator: TunnelGenerator,
    pub enemy_behavior: EnemyBehavior,
    /// Fixed seed for reproducible runs; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            rows: 15,
            cols: 20,
            enemy_count: 3,
            enemy_speed: 3.75,
            collectible_count: 5,
            tunnel_generator: TunnelGenerator::RandomWalk,
            enemy_behavior: EnemyBehavior::PathFollowing,
            seed: None,
        }
    }
}

/// Rejected level configuration. Raised before any state is built.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelConfigError {
    #[error("grid dimensions must be non-zero (got {rows}x{cols})")]
    ZeroDimensions { rows: usize, cols: usize },

    #[error("enemy count {count} exceeds grid capacity {capacity}")]
    TooManyEnemies { count: usize, capacity: usize },

    #[error("collectible count {count} exceeds grid capacity {capacity}")]
    TooManyCollectibles { count: usize, capacity: usize },

    #[error("grid of {rows}x{cols} exceeds the limit of {} cells", MAX_CELLS)]
    GridTooLarge { rows: usize, cols: usize },

    #[error("enemy speed must be positive and finite (got {0})")]
    InvalidEnemySpeed(f32),

    #[error("tuning value `{field}` is out of range (got {value})")]
    InvalidTuning { field: &'static str, value: f64 },

    #[error("predefined layout is empty")]
    EmptyLayout,

    #[error("layout row {row} has {found} cells, expected {expected}")]
    RaggedLayout { row: usize, expected: usize, found: usize },

    #[error("unknown layout glyph {glyph:?} at row {row}, col {col}")]
    UnknownGlyph { glyph: char, row: usize, col: usize },

    #[error("layout is {found_rows}x{found_cols} but config says {rows}x{cols}")]
    LayoutSizeMismatch { rows: usize, cols: usize, found_rows: usize, found_cols: usize },
}

/// Terrain plus its fixed spawn points.
#[derive(Clone, Debug)]
pub struct Terrain {
    pub grid: TerrainGrid,
    pub player_spawn: Cell,
    pub enemy_spawn: Cell,
}

/// Largest grid a level may allocate.
pub const MAX_CELLS: usize = 1 << 20;

// ══════════════════════════════════════════════════════════════
// Validation
// ══════════════════════════════════════════════════════════════

pub fn validate(config: &LevelConfig) -> Result<(), LevelConfigError> {
    if config.rows == 0 || config.cols == 0 {
        return Err(LevelConfigError::ZeroDimensions { rows: config.rows, cols: config.cols });
    }
    let capacity = match config.rows.checked_mul(config.cols) {
        Some(n) if n <= MAX_CELLS => n,
        _ => return Err(LevelConfigError::GridTooLarge { rows: config.rows, cols: config.cols }),
    };
    if config.enemy_count > capacity {
        return Err(LevelConfigError::TooManyEnemies { count: config.enemy_count, capacity });
    }
    if config.collectible_count > capacity {
        return Err(LevelConfigError::TooManyCollectibles { count: config.collectible_count, capacity });
    }
    if !config.enemy_speed.is_finite() || config.enemy_speed <= 0.0 {
        return Err(LevelConfigError::InvalidEnemySpeed(config.enemy_speed));
    }
    if let TunnelGenerator::Predefined(rows) = &config.tunnel_generator {
        let parsed = parse_layout(rows)?;
        let (found_rows, found_cols) = (parsed.grid.rows(), parsed.grid.cols());
        if found_rows != config.rows || found_cols != config.cols {
            return Err(LevelConfigError::LayoutSizeMismatch {
                rows: config.rows,
                cols: config.cols,
                found_rows,
                found_cols,
            });
        }
    }
    Ok(())
}

/// Reject tuning that would stall the clock or push entities off the grid.
pub fn validate_tuning(tuning: &Tuning) -> Result<(), LevelConfigError> {
    let positive = [
        ("player_speed", tuning.player_speed),
        ("bullet_speed", tuning.bullet_speed),
        ("bullet_lifetime", tuning.bullet_lifetime),
        ("speed_boost", tuning.speed_boost),
        ("multi_fire_bullet_boost", tuning.multi_fire_bullet_boost),
        ("gravity", tuning.gravity),
        ("enemy_spawn_interval", tuning.enemy_spawn_interval),
        ("repath_interval", tuning.repath_interval),
        ("max_dt", tuning.max_dt),
    ];
    let non_negative = [
        ("enemy_speed_per_level", tuning.enemy_speed_per_level),
        ("fire_cooldown", tuning.fire_cooldown),
        ("shoot_slow_duration", tuning.shoot_slow_duration),
        ("fall_threshold", tuning.fall_threshold),
        ("power_up_duration", tuning.power_up_duration),
    ];

    let bad = |field: &'static str, value: f32| LevelConfigError::InvalidTuning { field, value: value.into() };
    for (field, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(bad(field, value));
        }
    }
    for (field, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(bad(field, value));
        }
    }
    let slow = tuning.shoot_slow_factor;
    if !slow.is_finite() || slow <= 0.0 || slow > 1.0 {
        return Err(bad("shoot_slow_factor", slow));
    }
    let chance = tuning.power_up_chance;
    if !(0.0..=1.0).contains(&chance) {
        return Err(LevelConfigError::InvalidTuning { field: "power_up_chance", value: chance });
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Terrain
// ══════════════════════════════════════════════════════════════

/// Parse a predefined layout into terrain and spawn points.
pub fn parse_layout<S: AsRef<str>>(rows: &[S]) -> Result<Terrain, LevelConfigError> {
    let width = match rows.first() {
        Some(r) => r.as_ref().chars().count(),
        None => return Err(LevelConfigError::EmptyLayout),
    };
    if width == 0 {
        return Err(LevelConfigError::EmptyLayout);
    }

    let mut tiles = Vec::with_capacity(rows.len());
    let mut player = None;
    let mut enemy = None;

    for (r, line) in rows.iter().enumerate() {
        let line = line.as_ref();
        let found = line.chars().count();
        if found != width {
            return Err(LevelConfigError::RaggedLayout { row: r, expected: width, found });
        }
        let mut row = Vec::with_capacity(width);
        for (c, ch) in line.chars().enumerate() {
            let tile = match ch {
                '#' => Tile::Dirt,
                '.' | ' ' => Tile::Cleared,
                'P' => {
                    player.get_or_insert(Cell::new(r, c));
                    Tile::Cleared
                }
                'E' => {
                    enemy.get_or_insert(Cell::new(r, c));
                    Tile::Cleared
                }
                other => return Err(LevelConfigError::UnknownGlyph { glyph: other, row: r, col: c }),
            };
            row.push(tile);
        }
        tiles.push(row);
    }

    let mut grid = TerrainGrid::from_tiles(tiles);
    let player_spawn = player
        .or_else(|| grid.passable_cells().next())
        .unwrap_or(Cell::new(0, 0));
    let enemy_spawn = enemy
        .or_else(|| grid.passable_cells().last())
        .unwrap_or(Cell::new(grid.rows() - 1, grid.cols() - 1));
    grid.dig(player_spawn);
    grid.dig(enemy_spawn);

    Ok(Terrain { grid, player_spawn, enemy_spawn })
}

/// Build fresh terrain for `config`. Expects a validated config.
pub fn build_terrain(config: &LevelConfig, rng: &mut StdRng) -> Result<Terrain, LevelConfigError> {
    match &config.tunnel_generator {
        TunnelGenerator::Predefined(rows) => parse_layout(rows),
        TunnelGenerator::RandomWalk => {
            let mut grid = TerrainGrid::new(config.rows, config.cols);
            let start_row = rng.gen_range(0..config.rows);
            let end_row = grid.carve_tunnel(rng, start_row);
            Ok(Terrain {
                grid,
                player_spawn: Cell::new(start_row, 0),
                enemy_spawn: Cell::new(end_row, config.cols - 1),
            })
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

impl SimulationContext {
    /// Validate `config` and `tuning`, generate level 1, and spawn the first enemy.
    pub fn initialize_level(config: LevelConfig, tuning: Tuning) -> Result<Self, LevelConfigError> {
        validate(&config)?;
        validate_tuning(&tuning)?;
        let mut rng = seeded_rng(config.seed);
        let terrain = build_terrain(&config, &mut rng)?;

        let mut ctx = SimulationContext {
            player: Player::new(terrain.player_spawn, tuning.player_speed),
            grid: terrain.grid,
            player_spawn: terrain.player_spawn,
            enemy_spawn: terrain.enemy_spawn,
            enemies: vec![],
            bullets: vec![],
            bags: vec![],
            collectibles: vec![],
            power_ups: vec![],
            phase: Phase::Playing,
            score: 0,
            lives: tuning.lives,
            level: 1,
            elapsed: 0.0,
            enemy_spawn_timer: 0.0,
            next_enemy_id: 0,
            hit_this_tick: false,
            config,
            tuning,
            rng,
            events: vec![],
        };

        let mut events = vec![];
        ctx.populate_level();
        ctx.spawn_enemy(&mut events);
        ctx.events = events;

        tracing::debug!(
            rows = ctx.grid.rows(),
            cols = ctx.grid.cols(),
            player = ?ctx.player_spawn,
            enemy = ?ctx.enemy_spawn,
            gems = ctx.collectibles.len(),
            bags = ctx.bags.len(),
            power_ups = ctx.power_ups.len(),
            "level initialized"
        );
        Ok(ctx)
    }

    /// Start over from level 1 with the stored config. Score and lives reset.
    pub fn restart(&mut self) -> Result<(), LevelConfigError> {
        *self = SimulationContext::initialize_level(self.config.clone(), self.tuning.clone())?;
        tracing::info!("game restarted");
        Ok(())
    }

    /// Move on to the next level. Terrain is kept unless the level was
    /// won by clearing it, in which case a fresh one is generated.
    pub fn advance_level(&mut self, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::LevelComplete { level: self.level });
        tracing::info!(level = self.level, score = self.score, "level complete");
        self.level += 1;
        self.bullets.clear();
        self.enemy_spawn_timer = 0.0;

        if self.tuning.win_condition == WinCondition::AllClear {
            match build_terrain(&self.config, &mut self.rng) {
                Ok(terrain) => {
                    self.grid = terrain.grid;
                    self.player_spawn = terrain.player_spawn;
                    self.enemy_spawn = terrain.enemy_spawn;
                    self.enemies.clear();
                    self.player.spawn = terrain.player_spawn;
                    self.player.respawn();
                }
                Err(e) => tracing::warn!("could not rebuild terrain: {e}"),
            }
        }

        self.populate_level();
        self.spawn_enemy(events);
    }

    /// Is the current level finished?
    pub fn level_complete(&self) -> bool {
        match self.tuning.win_condition {
            WinCondition::AllCollected => {
                !self.collectibles.is_empty() && self.collectibles.iter().all(|c| c.collected)
            }
            WinCondition::AllClear => self.grid.all_clear(),
        }
    }

    /// Replace gems, gold bags, and power-ups for the current level.
    fn populate_level(&mut self) {
        let reserved = [self.player_spawn, self.enemy_spawn];

        let mut dirt: Vec<Cell> = self.grid.dirt_cells().filter(|c| !reserved.contains(c)).collect();
        dirt.shuffle(&mut self.rng);

        // Gems go into dirt; top up from open ground when dirt runs out.
        let gem_target = self.collectible_target();
        let mut gem_cells: Vec<Cell> = dirt.iter().copied().take(gem_target).collect();
        if gem_cells.len() < gem_target {
            let mut open: Vec<Cell> = self.grid.passable_cells().filter(|c| !reserved.contains(c)).collect();
            open.shuffle(&mut self.rng);
            let missing = gem_target - gem_cells.len();
            gem_cells.extend(open.into_iter().take(missing));
        }

        let last_row = self.grid.rows().saturating_sub(1);
        let bag_cells: Vec<Cell> = dirt
            .iter()
            .copied()
            .filter(|c| c.row < last_row && !gem_cells.contains(c))
            .take(self.gold_bag_target())
            .collect();

        self.collectibles = gem_cells.into_iter().map(Collectible::new).collect();
        self.bags = bag_cells.into_iter().map(GoldBag::new).collect();

        self.power_ups.clear();
        if self.rng.gen_bool(self.tuning.power_up_chance.clamp(0.0, 1.0)) {
            let cell = Cell::new(
                self.rng.gen_range(0..self.grid.rows()),
                self.rng.gen_range(0..self.grid.cols()),
            );
            let kind = PowerUpKind::ALL[self.rng.gen_range(0..PowerUpKind::ALL.len())];
            self.power_ups.push(PowerUp::new(cell, kind));
        }
    }
}
