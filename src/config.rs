/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// All durations are seconds, distances are tiles, speeds are tiles/s.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::entity::EnemyBehavior;
use crate::domain::path::PathAlgorithm;
use crate::sim::level::{LevelConfig, TunnelGenerator, WinCondition};

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub level: LevelConfig,
    pub tick_rate_ms: u64,
}

/// Gameplay constants shared by every level of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuning {
    pub player_speed: f32,
    pub enemy_speed_per_level: f32,
    pub bullet_speed: f32,
    pub bullet_lifetime: f32,
    pub fire_cooldown: f32,
    pub shoot_slow_duration: f32,
    pub shoot_slow_factor: f32,
    pub speed_boost: f32,
    pub multi_fire_bullet_boost: f32,
    pub gravity: f32,
    pub fall_threshold: f32,
    pub power_up_duration: f32,
    pub power_up_chance: f64,
    pub enemy_spawn_interval: f32,
    pub repath_interval: f32,
    pub max_dt: f32,
    pub gem_score: u32,
    pub bullet_kill_score: u32,
    pub bag_kill_score: u32,
    pub lives: u32,
    pub gold_bag_count: usize,
    pub collectibles_per_level: usize,
    pub path_algorithm: PathAlgorithm,
    pub win_condition: WinCondition,
}

impl Default for Tuning {
    fn default() -> Self {
        TomlTuning::default().into_tuning()
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into_config()
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    tuning: TomlTuning,
    #[serde(default)]
    level: TomlLevel,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTuning {
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_enemy_speed_per_level")]
    enemy_speed_per_level: f32,
    #[serde(default = "default_bullet_speed")]
    bullet_speed: f32,
    #[serde(default = "default_bullet_lifetime")]
    bullet_lifetime: f32,
    #[serde(default = "default_fire_cooldown")]
    fire_cooldown: f32,
    #[serde(default = "default_shoot_slow_duration")]
    shoot_slow_duration: f32,
    #[serde(default = "default_shoot_slow_factor")]
    shoot_slow_factor: f32,
    #[serde(default = "default_speed_boost")]
    speed_boost: f32,
    #[serde(default = "default_multi_fire_bullet_boost")]
    multi_fire_bullet_boost: f32,
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_fall_threshold")]
    fall_threshold: f32,
    #[serde(default = "default_power_up_duration")]
    power_up_duration: f32,
    #[serde(default = "default_power_up_chance")]
    power_up_chance: f64,
    #[serde(default = "default_enemy_spawn_interval")]
    enemy_spawn_interval: f32,
    #[serde(default = "default_repath_interval")]
    repath_interval: f32,
    #[serde(default = "default_max_dt")]
    max_dt: f32,
    #[serde(default = "default_gem_score")]
    gem_score: u32,
    #[serde(default = "default_bullet_kill_score")]
    bullet_kill_score: u32,
    #[serde(default = "default_bag_kill_score")]
    bag_kill_score: u32,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_gold_bag_count")]
    gold_bag_count: usize,
    #[serde(default = "default_collectibles_per_level")]
    collectibles_per_level: usize,
    #[serde(default = "default_path_algorithm")]
    path_algorithm: String,
    #[serde(default = "default_win_condition")]
    win_condition: String,
}

#[derive(Deserialize, Debug)]
struct TomlLevel {
    #[serde(default = "default_rows")]
    rows: usize,
    #[serde(default = "default_cols")]
    cols: usize,
    #[serde(default = "default_enemy_count")]
    enemy_count: usize,
    #[serde(default = "default_enemy_speed")]
    enemy_speed: f32,
    #[serde(default = "default_collectible_count")]
    collectible_count: usize,
    #[serde(default = "default_enemy_behavior")]
    enemy_behavior: String,
    #[serde(default)]
    seed: Option<u64>,
    /// Predefined layout rows. When present, replaces the random tunnel.
    #[serde(default)]
    layout: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

// ── Defaults ──

fn default_player_speed() -> f32 { 7.5 }
fn default_enemy_speed_per_level() -> f32 { 0.3 }
fn default_bullet_speed() -> f32 { 15.0 }
fn default_bullet_lifetime() -> f32 { 3.0 }
fn default_fire_cooldown() -> f32 { 0.5 }
fn default_shoot_slow_duration() -> f32 { 0.2 }
fn default_shoot_slow_factor() -> f32 { 0.5 }
fn default_speed_boost() -> f32 { 1.5 }
fn default_multi_fire_bullet_boost() -> f32 { 1.5 }
fn default_gravity() -> f32 { 45.0 }
fn default_fall_threshold() -> f32 { 2.0 }
fn default_power_up_duration() -> f32 { 5.0 }
fn default_power_up_chance() -> f64 { 0.3 }
fn default_enemy_spawn_interval() -> f32 { 2.5 }
fn default_repath_interval() -> f32 { 0.5 }
fn default_max_dt() -> f32 { 0.1 }
fn default_gem_score() -> u32 { 10 }
fn default_bullet_kill_score() -> u32 { 20 }
fn default_bag_kill_score() -> u32 { 25 }
fn default_lives() -> u32 { 3 }
fn default_gold_bag_count() -> usize { 3 }
fn default_collectibles_per_level() -> usize { 2 }
fn default_path_algorithm() -> String { "astar".into() }
fn default_win_condition() -> String { "all_collected".into() }

fn default_rows() -> usize { 15 }
fn default_cols() -> usize { 20 }
fn default_enemy_count() -> usize { 3 }
fn default_enemy_speed() -> f32 { 3.75 }
fn default_collectible_count() -> usize { 5 }
fn default_enemy_behavior() -> String { "path_following".into() }

fn default_tick_rate() -> u64 { 16 }   // ~60 ticks per second

impl Default for TomlTuning {
    fn default() -> Self {
        TomlTuning {
            player_speed: default_player_speed(),
            enemy_speed_per_level: default_enemy_speed_per_level(),
            bullet_speed: default_bullet_speed(),
            bullet_lifetime: default_bullet_lifetime(),
            fire_cooldown: default_fire_cooldown(),
            shoot_slow_duration: default_shoot_slow_duration(),
            shoot_slow_factor: default_shoot_slow_factor(),
            speed_boost: default_speed_boost(),
            multi_fire_bullet_boost: default_multi_fire_bullet_boost(),
            gravity: default_gravity(),
            fall_threshold: default_fall_threshold(),
            power_up_duration: default_power_up_duration(),
            power_up_chance: default_power_up_chance(),
            enemy_spawn_interval: default_enemy_spawn_interval(),
            repath_interval: default_repath_interval(),
            max_dt: default_max_dt(),
            gem_score: default_gem_score(),
            bullet_kill_score: default_bullet_kill_score(),
            bag_kill_score: default_bag_kill_score(),
            lives: default_lives(),
            gold_bag_count: default_gold_bag_count(),
            collectibles_per_level: default_collectibles_per_level(),
            path_algorithm: default_path_algorithm(),
            win_condition: default_win_condition(),
        }
    }
}

impl Default for TomlLevel {
    fn default() -> Self {
        TomlLevel {
            rows: default_rows(),
            cols: default_cols(),
            enemy_count: default_enemy_count(),
            enemy_speed: default_enemy_speed(),
            collectible_count: default_collectible_count(),
            enemy_behavior: default_enemy_behavior(),
            seed: None,
            layout: None,
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

// ── Conversion ──

impl TomlTuning {
    fn into_tuning(self) -> Tuning {
        Tuning {
            player_speed: self.player_speed,
            enemy_speed_per_level: self.enemy_speed_per_level,
            bullet_speed: self.bullet_speed,
            bullet_lifetime: self.bullet_lifetime,
            fire_cooldown: self.fire_cooldown,
            shoot_slow_duration: self.shoot_slow_duration,
            shoot_slow_factor: self.shoot_slow_factor,
            speed_boost: self.speed_boost,
            multi_fire_bullet_boost: self.multi_fire_bullet_boost,
            gravity: self.gravity,
            fall_threshold: self.fall_threshold,
            power_up_duration: self.power_up_duration,
            power_up_chance: self.power_up_chance.clamp(0.0, 1.0),
            enemy_spawn_interval: self.enemy_spawn_interval,
            repath_interval: self.repath_interval,
            max_dt: self.max_dt,
            gem_score: self.gem_score,
            bullet_kill_score: self.bullet_kill_score,
            bag_kill_score: self.bag_kill_score,
            lives: self.lives,
            gold_bag_count: self.gold_bag_count,
            collectibles_per_level: self.collectibles_per_level,
            path_algorithm: parse_algorithm(&self.path_algorithm),
            win_condition: parse_win_condition(&self.win_condition),
        }
    }
}

impl TomlLevel {
    fn into_level(self) -> LevelConfig {
        // A layout carries its own dimensions.
        let (rows, cols) = match &self.layout {
            Some(layout) => (layout.len(), layout.first().map_or(0, |r| r.chars().count())),
            None => (self.rows, self.cols),
        };
        let tunnel_generator = match self.layout {
            Some(layout) => TunnelGenerator::Predefined(layout),
            None => TunnelGenerator::RandomWalk,
        };
        LevelConfig {
            rows,
            cols,
            enemy_count: self.enemy_count,
            enemy_speed: self.enemy_speed,
            collectible_count: self.collectible_count,
            tunnel_generator,
            enemy_behavior: parse_behavior(&self.enemy_behavior),
            seed: self.seed,
        }
    }
}

impl TomlConfig {
    fn into_config(self) -> GameConfig {
        GameConfig {
            tuning: self.tuning.into_tuning(),
            level: self.level.into_level(),
            tick_rate_ms: self.general.tick_rate_ms.max(1),
        }
    }
}

fn parse_behavior(s: &str) -> EnemyBehavior {
    match s.to_ascii_lowercase().as_str() {
        "path_following" | "path" => EnemyBehavior::PathFollowing,
        "direct_chase" | "chase" => EnemyBehavior::DirectChase,
        "random_walk" | "random" => EnemyBehavior::RandomWalk,
        other => {
            tracing::warn!(value = other, "unknown enemy_behavior, using path_following");
            EnemyBehavior::PathFollowing
        }
    }
}

fn parse_algorithm(s: &str) -> PathAlgorithm {
    match s.to_ascii_lowercase().as_str() {
        "astar" | "a*" => PathAlgorithm::AStar,
        "bfs" => PathAlgorithm::Bfs,
        other => {
            tracing::warn!(value = other, "unknown path_algorithm, using astar");
            PathAlgorithm::AStar
        }
    }
}

fn parse_win_condition(s: &str) -> WinCondition {
    match s.to_ascii_lowercase().as_str() {
        "all_collected" => WinCondition::AllCollected,
        "all_clear" => WinCondition::AllClear,
        other => {
            tracing::warn!(value = other, "unknown win_condition, using all_collected");
            WinCondition::AllCollected
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        load_toml(&candidate_dirs()).into_config()
    }

    /// Parse config text. Errors fall back to defaults with a warning.
    pub fn from_toml_str(text: &str) -> Self {
        parse_toml(text).into_config()
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("config.toml parse error: {e}; using default settings");
            TomlConfig::default()
        }
    }
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    tracing::debug!(path = %path.display(), "loading config");
                    return parse_toml(&text);
                }
                Err(e) => {
                    tracing::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("");
        assert_eq!(cfg.tuning, Tuning::default());
        assert_eq!(cfg.tuning.player_speed, 7.5);
        assert_eq!(cfg.tuning.lives, 3);
        assert_eq!(cfg.level.rows, 15);
        assert_eq!(cfg.level.cols, 20);
        assert_eq!(cfg.level.enemy_behavior, EnemyBehavior::PathFollowing);
        assert_eq!(cfg.level.tunnel_generator, TunnelGenerator::RandomWalk);
        assert_eq!(cfg.tick_rate_ms, 16);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [tuning]
            gravity = 30.0
            path_algorithm = "bfs"
            win_condition = "all_clear"

            [level]
            rows = 8
            enemy_behavior = "random_walk"
            seed = 42
            "#,
        );
        assert_eq!(cfg.tuning.gravity, 30.0);
        assert_eq!(cfg.tuning.path_algorithm, PathAlgorithm::Bfs);
        assert_eq!(cfg.tuning.win_condition, WinCondition::AllClear);
        assert_eq!(cfg.tuning.bullet_speed, 15.0);
        assert_eq!(cfg.level.rows, 8);
        assert_eq!(cfg.level.cols, 20);
        assert_eq!(cfg.level.enemy_behavior, EnemyBehavior::RandomWalk);
        assert_eq!(cfg.level.seed, Some(42));
    }

    #[test]
    fn layout_selects_predefined_generator() {
        let cfg = GameConfig::from_toml_str("[level]\nlayout = [\"P..E\", \"####\"]\n");
        assert_eq!(
            cfg.level.tunnel_generator,
            TunnelGenerator::Predefined(vec!["P..E".into(), "####".into()])
        );
        assert_eq!((cfg.level.rows, cfg.level.cols), (2, 4));
    }

    #[test]
    fn unknown_names_fall_back() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [tuning]
            path_algorithm = "dijkstra"
            [level]
            enemy_behavior = "teleport"
            "#,
        );
        assert_eq!(cfg.tuning.path_algorithm, PathAlgorithm::AStar);
        assert_eq!(cfg.level.enemy_behavior, EnemyBehavior::PathFollowing);
    }

    #[test]
    fn malformed_toml_uses_defaults() {
        let cfg = GameConfig::from_toml_str("[tuning\nplayer_speed = ");
        assert_eq!(cfg.tuning, Tuning::default());
    }
}
