/// Gold bags: gravity, landing, and the lethal window.
///
/// State machine per bag:
///   Resting ──(cell below is open)──▶ Falling ──(hits Dirt / floor)──▶ Resting
///
/// While falling the bag accelerates at `gravity` and sweeps every row
/// its bottom edge crosses this tick; the first Dirt row (or the floor)
/// stops it with the bottom snapped to that row's top.
///
/// A bag is lethal once it has dropped more than `fall_threshold` tiles
/// since its fall began, including on the tick it lands. A lethal bag
/// that touches enemies or an unshielded player is spent.

use crate::domain::collision::overlap;
use crate::domain::entity::{BagState, BAG_SIZE};
use crate::domain::tile::Cell;
use super::collision::{player_hit, remove_marked};
use super::event::{EnemyDestroyCause, GameEvent};
use super::world::SimulationContext;

pub fn resolve_bags(world: &mut SimulationContext, dt: f32, events: &mut Vec<GameEvent>) {
    let gravity = world.tuning.gravity;
    let threshold = world.tuning.fall_threshold;
    let rows = world.grid.rows();
    let shielded = world.player.effects.shielded();

    let mut spent = vec![false; world.bags.len()];
    let mut dead = vec![false; world.enemies.len()];
    let mut kills = 0u32;
    let mut struck = false;

    for (i, bag) in world.bags.iter_mut().enumerate() {
        let col = bag.col();

        if bag.state == BagState::Resting {
            let below = bag.bottom().round() as usize;
            if below >= rows || !world.grid.is_passable(Cell::new(below, col)) {
                continue;
            }
            bag.state = BagState::Falling;
            bag.fall_origin = bag.pos.y;
            bag.vy = 0.0;
            events.push(GameEvent::BagFalling { cell: Cell::new(below.saturating_sub(1), col) });
        }

        bag.vy += gravity * dt;
        let old_bottom = bag.bottom();
        let mut new_bottom = old_bottom + bag.vy * dt;
        let mut landed = false;

        let mut row = old_bottom.ceil().max(0.0) as usize;
        while (row as f32) < new_bottom {
            if row >= rows || !world.grid.is_passable(Cell::new(row, col)) {
                new_bottom = row as f32;
                landed = true;
                break;
            }
            row += 1;
        }

        bag.pos.y = new_bottom - BAG_SIZE;
        let lethal = bag.is_lethal(threshold);
        if landed {
            bag.state = BagState::Resting;
            bag.vy = 0.0;
        }
        if !lethal {
            continue;
        }

        for (j, enemy) in world.enemies.iter().enumerate() {
            if !dead[j] && overlap(&*bag, enemy) {
                dead[j] = true;
                kills += 1;
                spent[i] = true;
                events.push(GameEvent::EnemyDestroyed { cause: EnemyDestroyCause::GoldBag });
            }
        }
        if !shielded && overlap(&*bag, &world.player) {
            struck = true;
            spent[i] = true;
        }
    }

    world.score += kills * world.tuning.bag_kill_score;
    remove_marked(&mut world.enemies, &dead);
    remove_marked(&mut world.bags, &spent);
    if struck {
        player_hit(world, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::effects::PowerUpKind;
    use crate::domain::entity::{Enemy, EnemyBehavior, GoldBag};
    use crate::sim::level::tests::ctx_from;
    use crate::sim::world::{Phase, SimulationContext};

    const DT: f32 = 1.0 / 60.0;

    fn run(ctx: &mut SimulationContext, ticks: usize) -> Vec<GameEvent> {
        let mut events = vec![];
        for _ in 0..ticks {
            resolve_bags(ctx, DT, &mut events);
        }
        events
    }

    #[test]
    fn bag_over_dirt_stays_put() {
        let mut ctx = ctx_from(&[
            "P#...E",
            "######",
        ]);
        ctx.bags = vec![GoldBag::new(Cell::new(0, 1))];
        let events = run(&mut ctx, 30);
        assert!(events.is_empty());
        assert_eq!(ctx.bags[0].state, BagState::Resting);
        assert_eq!(ctx.bags[0].pos.y, 0.0);
    }

    #[test]
    fn one_tile_fall_is_not_lethal() {
        let mut ctx = ctx_from(&[
            "P#...E",
            "#.####",
            "######",
        ]);
        ctx.bags = vec![GoldBag::new(Cell::new(0, 1))];
        ctx.enemies = vec![Enemy::new(7, Cell::new(1, 1), 1.0, EnemyBehavior::PathFollowing)];

        let events = run(&mut ctx, 60);
        assert_eq!(events, vec![GameEvent::BagFalling { cell: Cell::new(0, 1) }]);
        assert_eq!(ctx.bags.len(), 1);
        assert_eq!(ctx.bags[0].state, BagState::Resting);
        assert_eq!(ctx.bags[0].pos.y, 1.0);
        assert_eq!(ctx.enemies.len(), 1);
        assert_eq!(ctx.score, 0);
    }

    #[test]
    fn long_fall_kills_enemy_below() {
        let mut ctx = ctx_from(&[
            "P#...E",
            "#.####",
            "#.####",
            "#.####",
            "#.####",
            "######",
        ]);
        ctx.bags = vec![GoldBag::new(Cell::new(0, 1))];
        ctx.enemies = vec![Enemy::new(7, Cell::new(4, 1), 1.0, EnemyBehavior::PathFollowing)];

        let events = run(&mut ctx, 60);
        assert!(events.contains(&GameEvent::EnemyDestroyed { cause: EnemyDestroyCause::GoldBag }));
        assert!(ctx.enemies.is_empty());
        assert!(ctx.bags.is_empty());
        assert_eq!(ctx.score, 25);
    }

    #[test]
    fn bag_lands_on_dirt_and_can_fall_again() {
        let mut ctx = ctx_from(&[
            "P#...E",
            "#.####",
            "#####.",
            "#.####",
            "#.####",
        ]);
        ctx.bags = vec![GoldBag::new(Cell::new(0, 1))];
        run(&mut ctx, 60);
        assert_eq!(ctx.bags[0].pos.y, 1.0);
        assert_eq!(ctx.bags[0].state, BagState::Resting);

        // Dig out the supporting cell: the bag resumes falling to the floor.
        ctx.grid.dig(Cell::new(2, 1));
        run(&mut ctx, 60);
        assert_eq!(ctx.bags[0].pos.y, 4.0);
        assert_eq!(ctx.bags[0].state, BagState::Resting);
    }

    #[test]
    fn lethal_bag_hits_unshielded_player() {
        let mut ctx = ctx_from(&[
            "#P...E",
            "#.####",
            "#.####",
            "#.####",
            "######",
        ]);
        ctx.enemies.clear();
        // Player waits at the bottom of the shaft.
        ctx.player.pos.y += 3.0;
        ctx.bags = vec![GoldBag::new(Cell::new(0, 1))];

        let events = run(&mut ctx, 60);
        assert!(events.contains(&GameEvent::PlayerHit));
        assert_eq!(ctx.lives, 2);
        assert!(ctx.bags.is_empty());
        assert_eq!(ctx.phase, Phase::Playing);
    }

    #[test]
    fn shield_ignores_falling_bag() {
        let mut ctx = ctx_from(&[
            "#P...E",
            "#.####",
            "#.####",
            "#.####",
            "######",
        ]);
        ctx.enemies.clear();
        ctx.player.pos.y += 3.0;
        ctx.player.effects.activate(PowerUpKind::Shield, 5.0);
        ctx.bags = vec![GoldBag::new(Cell::new(0, 1))];

        let events = run(&mut ctx, 60);
        assert!(!events.contains(&GameEvent::PlayerHit));
        assert_eq!(ctx.lives, 3);
        assert_eq!(ctx.bags.len(), 1);
        assert_eq!(ctx.bags[0].pos.y, 3.0);
    }
}
