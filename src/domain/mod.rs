pub mod ai;
pub mod collision;
pub mod effects;
pub mod entity;
pub mod grid;
pub mod path;
pub mod tile;
