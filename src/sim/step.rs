/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Player movement + digging
///   2. Fire
///   3. Enemy movement (AI decisions)
///   4. Bullet integration
///   5. Collisions (bullet/terrain, bullet/enemy, player/enemy, pickups)
///   6. Gold bag hazard
///   7. Power-up decay
///   8. Enemy spawn timer
///   9. Level completion
///
/// A tick that ends the game stops right there. Ticks after game over
/// are no-ops until `restart()`.

use crate::domain::entity::InputIntent;
use super::collision;
use super::event::GameEvent;
use super::hazard;
use super::movement;
use super::snapshot::SimulationSnapshot;
use super::world::{Phase, SimulationContext};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut SimulationContext, intent: InputIntent, dt: f32) -> Vec<GameEvent> {
    if world.phase != Phase::Playing {
        return vec![];
    }

    let dt = sanitize_dt(dt, world.tuning.max_dt);
    let mut events: Vec<GameEvent> = Vec::new();
    world.hit_this_tick = false;
    world.elapsed += dt;

    movement::resolve_player_movement(world, intent, dt, &mut events);
    movement::resolve_fire(world, intent, dt, &mut events);
    movement::resolve_enemy_movement(world, dt);
    movement::resolve_bullet_movement(world, dt);

    collision::resolve_bullet_terrain(world, dt, &mut events);
    collision::resolve_bullet_enemy(world, &mut events);
    collision::resolve_player_enemy(world, &mut events);
    collision::resolve_pickups(world, &mut events);
    if world.is_over() {
        return events;
    }

    hazard::resolve_bags(world, dt, &mut events);
    if world.is_over() {
        return events;
    }

    resolve_power_ups(world, dt, &mut events);
    resolve_spawn_timer(world, dt, &mut events);
    resolve_win(world, &mut events);

    events
}

impl SimulationContext {
    /// Advance one tick and return a view of the result.
    pub fn tick(&mut self, intent: InputIntent, dt: f32) -> SimulationSnapshot<'_> {
        self.events = step(self, intent, dt);
        self.snapshot()
    }
}

/// Negative or NaN → 0, anything above `max_dt` → `max_dt`.
fn sanitize_dt(dt: f32, max_dt: f32) -> f32 {
    if dt.is_nan() || dt <= 0.0 {
        0.0
    } else {
        dt.min(max_dt.max(0.0))
    }
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

fn resolve_power_ups(world: &mut SimulationContext, dt: f32, events: &mut Vec<GameEvent>) {
    for kind in world.player.effects.decay(dt) {
        events.push(GameEvent::PowerUpExpired { kind });
    }
}

fn resolve_spawn_timer(world: &mut SimulationContext, dt: f32, events: &mut Vec<GameEvent>) {
    world.enemy_spawn_timer += dt;
    if world.enemy_spawn_timer >= world.tuning.enemy_spawn_interval {
        world.enemy_spawn_timer = 0.0;
        world.spawn_enemy(events);
    }
}

// ══════════════════════════════════════════════════════════════
// Win check
// ══════════════════════════════════════════════════════════════

fn resolve_win(world: &mut SimulationContext, events: &mut Vec<GameEvent>) {
    if world.level_complete() {
        world.advance_level(events);
    }
}
