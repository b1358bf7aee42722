//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Edge behaviour applied when a move would leave the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderKind {
    /// Leaving one edge re-enters from the opposite one on both axes
    WrapAround,
    /// The offending axis is reflected back inside and the facing mirrored
    Bounce,
    /// Wraps horizontally; the poles turn the animal around in place
    Globe,
    /// Teleports the animal to a random cell for an energy fee
    HellPortal,
}

/// Where new plants prefer to grow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantGrowth {
    /// Most plants grow on a horizontal band around the middle row
    ForestedEquator,
    /// Every free cell is equally likely
    Uniform,
}

/// How a mutated gene changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStyle {
    /// The gene is replaced by a fresh random value
    FullRandom,
    /// The gene moves one step up or down
    SlightCorrection,
}

/// World configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Number of columns
    pub width: i32,
    /// Number of rows
    pub height: i32,
    /// Edge behaviour
    pub border: BorderKind,
    /// Animals placed when the world is seeded
    pub initial_animals: usize,
    /// Plants placed when the world is seeded
    pub initial_plants: usize,
    /// Plants grown at the end of every day
    pub plants_per_day: usize,
    /// Plant placement preference
    pub plant_growth: PlantGrowth,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 30,
            border: BorderKind::Globe,
            initial_animals: 40,
            initial_plants: 60,
            plants_per_day: 12,
            plant_growth: PlantGrowth::ForestedEquator,
        }
    }
}

/// Energy and cost configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Energy of animals placed at seeding time
    pub start_energy: i32,
    /// Energy spent on every move
    pub move_energy_cost: i32,
    /// Energy gained from eating one plant
    pub plant_energy: i32,
    /// Minimum energy an animal needs to become a parent
    pub reproduction_energy_threshold: i32,
    /// Energy each parent hands over to a child
    pub multiplication_energy_lose: i32,
    /// Energy paid for a trip through the hell portal
    pub portal_energy_cost: i32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            start_energy: 60,
            move_energy_cost: 1,
            plant_energy: 15,
            reproduction_energy_threshold: 30,
            multiplication_energy_lose: 12,
            portal_energy_cost: 10,
        }
    }
}

/// Genome configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticsConfig {
    /// Number of genes in every genome
    pub genome_length: usize,
    /// Fewest genes mutated in a child
    pub min_mutations: usize,
    /// Most genes mutated in a child
    pub max_mutations: usize,
    /// How a mutated gene changes
    pub mutation_style: MutationStyle,
}

impl Default for GeneticsConfig {
    fn default() -> Self {
        Self {
            genome_length: 32,
            min_mutations: 0,
            max_mutations: 3,
            mutation_style: MutationStyle::FullRandom,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of days `Simulation::run` advances
    pub num_days: u64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Movement follows the genome strictly, with no random gene jumps
    pub full_predestination: bool,
    /// Emit population metrics every this many days
    pub metrics_interval: u64,
    /// World configuration
    pub world: WorldConfig,
    /// Energy configuration
    pub energy: EnergyConfig,
    /// Genome configuration
    pub genetics: GeneticsConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_days: 1_000,
            seed: 0,
            full_predestination: false,
            metrics_interval: 100,
            world: WorldConfig::default(),
            energy: EnergyConfig::default(),
            genetics: GeneticsConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), seed = config.seed, "Loaded simulation config");
        config.validate()?;
        Ok(config)
    }

    pub fn genome_length(&self) -> usize {
        self.genetics.genome_length
    }

    pub fn multiplication_energy_lose(&self) -> i32 {
        self.energy.multiplication_energy_lose
    }

    /// Reject combinations the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if world.width <= 0 || world.height <= 0 {
            return Err(Error::Validation(format!(
                "map size must be positive, got {}x{}",
                world.width, world.height
            )));
        }

        let energy = &self.energy;
        if energy.move_energy_cost < 0
            || energy.plant_energy < 0
            || energy.portal_energy_cost < 0
            || energy.start_energy < 0
        {
            return Err(Error::Validation("energy values must not be negative".to_string()));
        }
        if energy.multiplication_energy_lose <= 0 {
            return Err(Error::Validation(
                "multiplication_energy_lose must be positive".to_string(),
            ));
        }
        // Parents are debited without going below zero
        if energy.reproduction_energy_threshold < energy.multiplication_energy_lose {
            return Err(Error::Validation(format!(
                "reproduction_energy_threshold ({}) is below multiplication_energy_lose ({})",
                energy.reproduction_energy_threshold, energy.multiplication_energy_lose
            )));
        }

        let genetics = &self.genetics;
        if genetics.genome_length < 2 {
            return Err(Error::Validation(format!(
                "genome_length must be at least 2, got {}",
                genetics.genome_length
            )));
        }
        if genetics.min_mutations > genetics.max_mutations {
            return Err(Error::Validation(format!(
                "min_mutations ({}) exceeds max_mutations ({})",
                genetics.min_mutations, genetics.max_mutations
            )));
        }
        if genetics.max_mutations > genetics.genome_length {
            return Err(Error::Validation(format!(
                "max_mutations ({}) exceeds genome_length ({})",
                genetics.max_mutations, genetics.genome_length
            )));
        }

        if self.metrics_interval == 0 {
            return Err(Error::Validation("metrics_interval must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.width, 50);
        assert_eq!(config.world.height, 30);
        assert_eq!(config.genome_length(), 32);
        assert_eq!(config.multiplication_energy_lose(), 12);
        assert!(!config.full_predestination);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_below_multiplication_loss_is_rejected() {
        let mut config = SimulationConfig::default();
        config.energy.reproduction_energy_threshold = 5;
        config.energy.multiplication_energy_lose = 10;
        assert!(matches!(config.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_bad_genetics_are_rejected() {
        let mut config = SimulationConfig::default();
        config.genetics.genome_length = 1;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.genetics.min_mutations = 4;
        config.genetics.max_mutations = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_map_is_rejected() {
        let mut config = SimulationConfig::default();
        config.world.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = SimulationConfig::default();
        config.world.border = BorderKind::HellPortal;
        config.genetics.mutation_style = MutationStyle::SlightCorrection;

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"hell_portal\""));
        assert!(json.contains("\"slight_correction\""));

        let deserialized: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.world.border, BorderKind::HellPortal);
        assert_eq!(deserialized.genetics.mutation_style, MutationStyle::SlightCorrection);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SimulationConfig::from_json_file("/nonexistent/ecosim.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
