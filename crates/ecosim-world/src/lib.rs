//! World simulation engine.
//!
//! This crate implements the bounded 2D map where animals move, eat plants,
//! and reproduce, together with the day-by-day driver that advances it.

pub mod borders;
pub mod configuration;
pub mod element;
pub mod genome;
pub mod map;
pub mod observer;
pub mod simulation;

pub use borders::{MapBorders, MapBounds};
pub use configuration::WorldConfiguration;
pub use element::{Animal, ElementType, Plant, WorldElement};
pub use genome::{Crossover, Genome, GenomeCombiner};
pub use map::WorldMap;
pub use observer::SimulationObserver;
pub use simulation::{Simulation, SimulationStats};
