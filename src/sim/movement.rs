/// Movement: player stepping and digging, firing, enemy stepping, and
/// bullet integration.
///
/// Enemies only ever move through cleared cells. Waypoint moves are
/// straight lines inside two adjacent passable cells; slide moves are
/// resolved one axis at a time and rejected per axis when the center
/// would land in Dirt.

use glam::Vec2;

use crate::domain::ai::{self, Steer};
use crate::domain::entity::{Bullet, Enemy, InputIntent, PLAYER_SIZE};
use crate::domain::grid::TerrainGrid;
use super::event::GameEvent;
use super::world::SimulationContext;

/// Largest single slide increment, in tiles.
const SLIDE_SUBSTEP: f32 = 0.25;

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

pub fn resolve_player_movement(
    world: &mut SimulationContext,
    intent: InputIntent,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let tuning = &world.tuning;
    let p = &mut world.player;

    let dir = intent.direction();
    if dir != Vec2::ZERO {
        p.facing = Vec2::new(intent.move_x.clamp(-1, 1) as f32, intent.move_y.clamp(-1, 1) as f32);
    }

    let slow = if p.shoot_slow > 0.0 { tuning.shoot_slow_factor } else { 1.0 };
    let speed = p.base_speed * p.effects.speed_multiplier(tuning.speed_boost) * slow;
    p.velocity = dir * speed;
    p.pos += p.velocity * dt;

    let max = (world.grid.world_size() - Vec2::splat(PLAYER_SIZE)).max(Vec2::ZERO);
    p.pos = p.pos.clamp(Vec2::ZERO, max);

    if let Some(cell) = world.grid.cell_at(p.center()) {
        if world.grid.dig(cell) {
            events.push(GameEvent::Dug { cell });
        }
    }
}

/// Tick the fire timers, then shoot along the facing if allowed.
pub fn resolve_fire(
    world: &mut SimulationContext,
    intent: InputIntent,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let tuning = &world.tuning;
    let p = &mut world.player;

    p.fire_cooldown = (p.fire_cooldown - dt).max(0.0);
    p.shoot_slow = (p.shoot_slow - dt).max(0.0);

    if !intent.fire_requested || p.fire_cooldown > 0.0 {
        return;
    }

    let multi = p.effects.multi_fire();
    let speed = if multi { tuning.bullet_speed * tuning.multi_fire_bullet_boost } else { tuning.bullet_speed };
    let mut dir = p.facing.normalize_or_zero();
    if dir == Vec2::ZERO {
        dir = Vec2::X;
    }

    world.bullets.push(Bullet::new(p.center(), dir * speed, tuning.bullet_lifetime, multi));
    p.fire_cooldown = if multi { tuning.fire_cooldown * 0.5 } else { tuning.fire_cooldown };
    p.shoot_slow = tuning.shoot_slow_duration;
    events.push(GameEvent::BulletFired);
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

pub fn resolve_enemy_movement(world: &mut SimulationContext, dt: f32) {
    let params = world.ai_params();
    let player_center = world.player.center();
    let grid = &world.grid;
    let rng = &mut world.rng;

    for enemy in world.enemies.iter_mut() {
        let steer = ai::decide(grid, enemy, player_center, &params, rng, dt);
        apply_steer(grid, enemy, steer, dt);
    }
}

pub fn apply_steer(grid: &TerrainGrid, enemy: &mut Enemy, steer: Steer, dt: f32) {
    let budget = enemy.speed * dt;
    if budget <= 0.0 {
        return;
    }
    match steer {
        Steer::Hold => {}
        Steer::Waypoint(target) => {
            let c = enemy.center();
            let d = target - c;
            let len = d.length();
            if len <= budget {
                enemy.set_center(target);
            } else {
                enemy.set_center(c + d / len * budget);
            }
        }
        Steer::Slide(target) => {
            let c = enemy.center();
            let d = target - c;
            let len = d.length();
            if len <= f32::EPSILON {
                return;
            }
            let delta = d / len * budget.min(len);
            enemy.set_center(slide(grid, c, delta));
        }
    }
}

/// Move `from` by `delta`, x then y, in small increments. An axis step
/// whose end point sits in Dirt (or off the grid) is dropped.
fn slide(grid: &TerrainGrid, from: Vec2, delta: Vec2) -> Vec2 {
    let steps = (delta.abs().max_element() / SLIDE_SUBSTEP).ceil().max(1.0) as u32;
    let inc = delta / steps as f32;
    let open = |p: Vec2| grid.cell_at(p).is_some_and(|c| grid.is_passable(c));

    let mut c = from;
    for _ in 0..steps {
        let nx = Vec2::new(c.x + inc.x, c.y);
        if inc.x != 0.0 && open(nx) {
            c = nx;
        }
        let ny = Vec2::new(c.x, c.y + inc.y);
        if inc.y != 0.0 && open(ny) {
            c = ny;
        }
    }
    c
}

// ══════════════════════════════════════════════════════════════
// Bullets
// ══════════════════════════════════════════════════════════════

pub fn resolve_bullet_movement(world: &mut SimulationContext, dt: f32) {
    for b in world.bullets.iter_mut() {
        b.pos += b.velocity * dt;
        b.ttl -= dt;
    }
}
