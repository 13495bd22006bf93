//! Burrower: a tile-digging arcade simulation.
//!
//! `domain` holds the terrain, entities, pathfinding, and AI decisions;
//! `sim` owns the per-tick systems and the `SimulationContext`. The
//! terminal host in `main.rs` only feeds intents in and draws snapshots.

pub mod config;
pub mod domain;
pub mod sim;
