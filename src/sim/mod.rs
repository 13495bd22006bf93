pub mod collision;
pub mod event;
pub mod hazard;
pub mod level;
pub mod movement;
pub mod snapshot;
pub mod step;
pub mod world;

pub use event::{EnemyDestroyCause, GameEvent, PickupKind};
pub use level::{LevelConfig, LevelConfigError, TunnelGenerator, WinCondition};
pub use snapshot::SimulationSnapshot;
pub use world::{Phase, SimulationContext};
