/// Events emitted during a simulation tick.
/// The presentation layer consumes these for HUD messages and effects.

use crate::domain::effects::PowerUpKind;
use crate::domain::tile::Cell;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickupKind {
    Gem,
    PowerUp(PowerUpKind),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyDestroyCause {
    Bullet,
    Shield,
    GoldBag,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Dug { cell: Cell },
    Collected { kind: PickupKind, cell: Cell },
    EnemyDestroyed { cause: EnemyDestroyCause },
    EnemySpawned { id: u32 },
    BulletFired,
    PlayerHit,
    PowerUpActivated { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    BagFalling { cell: Cell },
    LevelComplete { level: u32 },
    GameOver,
}
