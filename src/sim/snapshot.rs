/// Read-only view of the simulation after a tick.
///
/// Borrowed from the context, so it cannot outlive the next `tick()`.
/// Renderers and tests read everything through this.

use crate::domain::effects::{ActiveEffects, PowerUpKind};
use crate::domain::entity::{Bullet, Collectible, Enemy, GoldBag, Player, PowerUp};
use crate::domain::grid::TerrainGrid;
use super::event::GameEvent;
use super::world::{Phase, SimulationContext};

#[derive(Clone, Copy, Debug)]
pub struct SimulationSnapshot<'a> {
    pub grid: &'a TerrainGrid,
    pub player: &'a Player,
    pub enemies: &'a [Enemy],
    pub bullets: &'a [Bullet],
    pub bags: &'a [GoldBag],
    pub collectibles: &'a [Collectible],
    pub power_ups: &'a [PowerUp],
    pub effects: &'a ActiveEffects,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    pub phase: Phase,
    /// Events emitted by the tick that produced this view.
    pub events: &'a [GameEvent],
}

impl<'a> SimulationSnapshot<'a> {
    /// Running effects with remaining seconds.
    pub fn active_effects(&self) -> Vec<(PowerUpKind, f32)> {
        self.effects.active()
    }

    pub fn gems_remaining(&self) -> usize {
        self.collectibles.iter().filter(|c| !c.collected).count()
    }
}

impl SimulationContext {
    pub fn snapshot(&self) -> SimulationSnapshot<'_> {
        SimulationSnapshot {
            grid: &self.grid,
            player: &self.player,
            enemies: &self.enemies,
            bullets: &self.bullets,
            bags: &self.bags,
            collectibles: &self.collectibles,
            power_ups: &self.power_ups,
            effects: &self.player.effects,
            score: self.score,
            lives: self.lives,
            level: self.level,
            phase: self.phase,
            events: &self.events,
        }
    }
}
