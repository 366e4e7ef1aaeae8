pub mod geometry;
pub mod pathfinding;
pub mod steering;
pub mod zone_builder;
