//! Collaborators and constants a [`WorldMap`](crate::WorldMap) is built with.

use crate::borders::{self, MapBorders};
use crate::genome::{Crossover, GenomeCombiner};
use ecosim_core::{Result, SimulationConfig};

pub struct WorldConfiguration {
    settings: SimulationConfig,
    map_borders: Box<dyn MapBorders>,
    combiner: Box<dyn GenomeCombiner>,
}

impl WorldConfiguration {
    pub fn new(
        settings: SimulationConfig,
        map_borders: Box<dyn MapBorders>,
        combiner: Box<dyn GenomeCombiner>,
    ) -> Self {
        Self {
            settings,
            map_borders,
            combiner,
        }
    }

    /// Validate `settings` and wire up the border policy it names together
    /// with the default crossover.
    pub fn from_settings(settings: SimulationConfig) -> Result<Self> {
        settings.validate()?;
        let map_borders = borders::for_kind(settings.world.border, &settings.energy);
        let combiner = Box::new(Crossover::new(settings.genetics.clone()));
        Ok(Self::new(settings, map_borders, combiner))
    }

    pub fn settings(&self) -> &SimulationConfig {
        &self.settings
    }

    pub fn map_borders(&self) -> &dyn MapBorders {
        self.map_borders.as_ref()
    }

    pub fn combiner(&self) -> &dyn GenomeCombiner {
        self.combiner.as_ref()
    }
}

impl std::fmt::Debug for WorldConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldConfiguration")
            .field("settings", &self.settings)
            .field("map_borders", &self.map_borders.kind())
            .finish_non_exhaustive()
    }
}
