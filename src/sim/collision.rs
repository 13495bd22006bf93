/// Collision resolution on post-move positions.
///
/// Order: bullet vs terrain, bullet vs enemy, player vs enemy, pickups.
/// Destroyed entities are marked first and compacted at the end of each
/// pass, so an index never shifts while a pass is running.

use crate::domain::collision::overlap;
use super::event::{EnemyDestroyCause, GameEvent, PickupKind};
use super::world::{Phase, SimulationContext};

/// Sampling step along a bullet's swept segment, in tiles.
const SWEEP_STEP: f32 = 0.25;

/// Drop every element whose flag is set.
pub(crate) fn remove_marked<T>(items: &mut Vec<T>, dead: &[bool]) {
    let mut i = 0;
    items.retain(|_| {
        let keep = !dead[i];
        i += 1;
        keep
    });
}

/// Apply one unshielded hit to the player. Returns false if the player
/// was already hit this tick.
pub(crate) fn player_hit(world: &mut SimulationContext, events: &mut Vec<GameEvent>) -> bool {
    if world.hit_this_tick {
        return false;
    }
    world.hit_this_tick = true;
    world.lives = world.lives.saturating_sub(1);
    events.push(GameEvent::PlayerHit);

    if world.lives == 0 {
        world.phase = Phase::GameOver;
        events.push(GameEvent::GameOver);
        tracing::info!(score = world.score, level = world.level, "game over");
    } else {
        world.player.respawn();
        tracing::debug!(lives = world.lives, "player hit");
    }
    true
}

// ══════════════════════════════════════════════════════════════
// Bullets
// ══════════════════════════════════════════════════════════════

/// Walk each bullet's path for this tick. Plain bullets die in the first
/// Dirt cell they touch, digging bullets clear it and keep going. Bullets
/// that left the grid or ran out of lifetime are removed.
pub fn resolve_bullet_terrain(world: &mut SimulationContext, dt: f32, events: &mut Vec<GameEvent>) {
    let grid = &mut world.grid;

    world.bullets.retain(|b| {
        if b.ttl <= 0.0 {
            return false;
        }
        let end = b.center();
        let start = end - b.velocity * dt;
        let span = end - start;
        let samples = (span.length() / SWEEP_STEP).ceil().max(1.0) as u32;

        for i in 1..=samples {
            let p = start + span * (i as f32 / samples as f32);
            let Some(cell) = grid.cell_at(p) else {
                return false;
            };
            if grid.is_passable(cell) {
                continue;
            }
            if !b.digs {
                return false;
            }
            if grid.dig(cell) {
                events.push(GameEvent::Dug { cell });
            }
        }
        true
    });
}

/// A bullet touching an enemy destroys both. One bullet, one enemy.
pub fn resolve_bullet_enemy(world: &mut SimulationContext, events: &mut Vec<GameEvent>) {
    let mut dead = vec![false; world.enemies.len()];
    let mut kills = 0u32;

    world.bullets.retain(|b| {
        let hit = world
            .enemies
            .iter()
            .enumerate()
            .position(|(i, e)| !dead[i] && overlap(b, e));
        match hit {
            Some(i) => {
                dead[i] = true;
                kills += 1;
                false
            }
            None => true,
        }
    });

    for _ in 0..kills {
        world.score += world.tuning.bullet_kill_score;
        events.push(GameEvent::EnemyDestroyed { cause: EnemyDestroyCause::Bullet });
    }
    remove_marked(&mut world.enemies, &dead);
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// Enemies touching the player are removed. A shield destroys them
/// for free; otherwise the contact costs one life.
pub fn resolve_player_enemy(world: &mut SimulationContext, events: &mut Vec<GameEvent>) {
    let shielded = world.player.effects.shielded();
    if !shielded && world.hit_this_tick {
        return;
    }

    let dead: Vec<bool> = world.enemies.iter().map(|e| overlap(&world.player, e)).collect();
    let touching = dead.iter().filter(|d| **d).count();
    if touching == 0 {
        return;
    }

    if shielded {
        for _ in 0..touching {
            events.push(GameEvent::EnemyDestroyed { cause: EnemyDestroyCause::Shield });
        }
    }
    remove_marked(&mut world.enemies, &dead);

    if !shielded {
        player_hit(world, events);
    }
}

/// Gems and power-ups under the player are picked up.
pub fn resolve_pickups(world: &mut SimulationContext, events: &mut Vec<GameEvent>) {
    let player = &mut world.player;

    for gem in world.collectibles.iter_mut().filter(|g| !g.collected) {
        if overlap(&*player, &*gem) {
            gem.collected = true;
            world.score += world.tuning.gem_score;
            events.push(GameEvent::Collected { kind: PickupKind::Gem, cell: gem.cell });
        }
    }

    for pu in world.power_ups.iter_mut().filter(|p| !p.consumed) {
        if overlap(&*player, &*pu) {
            pu.consumed = true;
            player.effects.activate(pu.kind, world.tuning.power_up_duration);
            events.push(GameEvent::Collected { kind: PickupKind::PowerUp(pu.kind), cell: pu.cell });
            events.push(GameEvent::PowerUpActivated { kind: pu.kind });
        }
    }
    world.power_ups.retain(|p| !p.consumed);
}
