//! Hooks for anything that wants to follow a running simulation.

use crate::simulation::SimulationStats;
use ecosim_core::Vector2D;

/// Receives simulation events. Every hook defaults to doing nothing.
pub trait SimulationObserver {
    fn on_animal_summoned(&mut self, _position: Vector2D) {}

    fn on_position_changed(&mut self, _old_position: Vector2D, _new_position: Vector2D) {}

    fn on_plant_summoned(&mut self, _position: Vector2D) {}

    fn on_plant_eaten(&mut self, _position: Vector2D) {}

    /// Called once per simulated day, after plants have grown.
    fn on_day_end(&mut self, _stats: &SimulationStats) {}
}
