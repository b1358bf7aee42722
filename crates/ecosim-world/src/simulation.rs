//! Day-by-day driver for a single world.

use crate::borders::MapBounds;
use crate::configuration::WorldConfiguration;
use crate::element::{Animal, Plant};
use crate::genome::Genome;
use crate::map::WorldMap;
use crate::observer::SimulationObserver;
use ecosim_core::{
    ElementId, PlantGrowth, RandomSource, Result, Rotation, SimulationConfig, Vector2D,
    DIRECTION_COUNT,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Chance, in percent, that a new plant grows on the equator.
const EQUATOR_PREFERENCE_PERCENT: u32 = 80;

pub struct Simulation {
    map: WorldMap,
    rng: ChaCha8Rng,
    day: u64,
    observers: Vec<Box<dyn SimulationObserver>>,
    births: u64,
    deaths: u64,
    dead_lifetime_total: u64,
}

impl Simulation {
    /// Build a world from `settings` and seed it with the configured number
    /// of animals and plants.
    pub fn new(settings: SimulationConfig) -> Result<Self> {
        let configuration = WorldConfiguration::from_settings(settings)?;
        let mut sim = Self::with_configuration(configuration);
        sim.seed_world()?;
        Ok(sim)
    }

    /// Build an empty world around an existing configuration.
    pub fn with_configuration(configuration: WorldConfiguration) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(configuration.settings().seed);
        Self {
            map: WorldMap::new(configuration),
            rng,
            day: 0,
            observers: Vec::new(),
            births: 0,
            deaths: 0,
            dead_lifetime_total: 0,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut WorldMap {
        &mut self.map
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    fn settings(&self) -> &SimulationConfig {
        self.map.configuration().settings()
    }

    /// Place the initial animals at random cells and grow the initial plants.
    pub fn seed_world(&mut self) -> Result<()> {
        let settings = self.settings().clone();
        let bounds = *self.map.bounds();

        for _ in 0..settings.world.initial_animals {
            let position = random_position(&bounds, &mut self.rng);
            let genome = Genome::random(settings.genome_length(), &mut self.rng);
            let rotation = Rotation::new(self.rng.random_int(0, DIRECTION_COUNT as i32) as u32);
            let active_gene = self.rng.random_int(0, settings.genome_length() as i32) as usize;
            let animal = Animal::new(position, settings.energy.start_energy, genome)
                .with_rotation(rotation)
                .with_active_gene(active_gene);

            self.map.place_object(animal.into());
            for observer in &mut self.observers {
                observer.on_animal_summoned(position);
            }
        }

        self.grow_plants(settings.world.initial_plants);

        info!(
            event = "world_seeded",
            animals = settings.world.initial_animals,
            plants = self.map.all_plants().len(),
            width = bounds.width(),
            height = bounds.height(),
            border = ?settings.world.border,
            "World seeded"
        );
        Ok(())
    }

    /// Run until `num_days` have passed or every animal has died.
    #[instrument(skip(self), fields(num_days = self.settings().num_days))]
    pub fn run(&mut self) -> Result<SimulationStats> {
        let num_days = self.settings().num_days;
        info!("Starting simulation for {} days", num_days);

        for _ in 0..num_days {
            self.step()?;

            if self.map.all_animals().is_empty() {
                info!(event = "extinction", day = self.day, "All animals died");
                break;
            }
        }

        let stats = self.stats();
        info!(
            event = "simulation_summary",
            days = stats.day,
            animals = stats.animals,
            plants = stats.plants,
            births = stats.births,
            deaths = stats.deaths,
            average_lifetime = format!("{:.2}", stats.average_lifetime),
            dominant_genome = stats.dominant_genome.as_deref().unwrap_or("-"),
            "Simulation complete"
        );
        Ok(stats)
    }

    /// Advance the world by one day.
    pub fn step(&mut self) -> Result<()> {
        self.day += 1;

        self.remove_dead_animals()?;
        self.move_animals()?;
        self.eat_plants()?;
        self.reproduce_animals()?;
        let plants_per_day = self.settings().world.plants_per_day;
        self.grow_plants(plants_per_day);
        self.map.age_animals();

        let stats = self.stats();
        for observer in &mut self.observers {
            observer.on_day_end(&stats);
        }
        if self.day % self.settings().metrics_interval == 0 {
            emit_population_metrics(&stats);
        }

        Ok(())
    }

    fn remove_dead_animals(&mut self) -> Result<()> {
        let dead: Vec<ElementId> = self
            .map
            .all_animals()
            .iter()
            .filter(|animal| !animal.is_alive())
            .map(|animal| animal.id)
            .collect();

        for id in dead {
            if let Some(animal) = self.map.remove_object(id)?.as_animal() {
                self.deaths += 1;
                self.dead_lifetime_total += animal.age;
                debug!(
                    event = "animal_death",
                    animal_id = %id,
                    day = self.day,
                    age = animal.age,
                    children = animal.children,
                    plants_eaten = animal.plants_eaten,
                    "Animal died"
                );
            }
        }
        Ok(())
    }

    fn move_animals(&mut self) -> Result<()> {
        for id in self.map.animal_ids() {
            let Some(old_position) = self.map.animal(id).map(Animal::position) else {
                continue;
            };
            let new_position = self.map.rotate_and_move(id, &mut self.rng)?;
            if old_position != new_position {
                for observer in &mut self.observers {
                    observer.on_position_changed(old_position, new_position);
                }
            }
        }
        Ok(())
    }

    /// On every cell holding a plant, the strongest animal there eats it.
    fn eat_plants(&mut self) -> Result<()> {
        let plant_energy = self.settings().energy.plant_energy;

        for position in self.map.occupied_positions() {
            let Some(plant_id) = self.map.plant_at(&position).map(|plant| plant.id) else {
                continue;
            };
            let Some(animal_id) = self.map.strongest_animal_at(&position).map(|a| a.id) else {
                continue;
            };

            self.map.remove_object(plant_id)?;
            self.map.feed_animal(animal_id, plant_energy)?;
            for observer in &mut self.observers {
                observer.on_plant_eaten(position);
            }
        }
        Ok(())
    }

    fn reproduce_animals(&mut self) -> Result<()> {
        for position in self.map.occupied_positions() {
            if self.map.animals_reproduction(position, &mut self.rng)?.is_some() {
                self.births += 1;
                for observer in &mut self.observers {
                    observer.on_animal_summoned(position);
                }
            }
        }
        Ok(())
    }

    /// Grow up to `count` plants on cells that have none yet.
    fn grow_plants(&mut self, count: usize) {
        let bounds = *self.map.bounds();
        let growth = self.settings().world.plant_growth;

        let free = bounds
            .positions()
            .filter(|position| self.map.plant_at(position).is_none());
        let (mut preferred, mut other): (Vec<Vector2D>, Vec<Vector2D>) = match growth {
            PlantGrowth::ForestedEquator => free.partition(|position| is_equator(&bounds, position)),
            PlantGrowth::Uniform => (Vec::new(), free.collect()),
        };

        for _ in 0..count {
            let wants_preferred =
                growth == PlantGrowth::ForestedEquator && self.rng.is_true(EQUATOR_PREFERENCE_PERCENT);
            let pool = match (wants_preferred, preferred.is_empty(), other.is_empty()) {
                (_, true, true) => break,
                (true, false, _) | (false, false, true) => &mut preferred,
                _ => &mut other,
            };

            let index = self.rng.random_int(0, pool.len() as i32) as usize;
            let position = pool.swap_remove(index);
            self.map.place_object(Plant::new(position).into());
            for observer in &mut self.observers {
                observer.on_plant_summoned(position);
            }
        }
    }

    pub fn stats(&self) -> SimulationStats {
        let animals = self.map.all_animals();
        let animal_count = animals.len();
        let mean = |total: f64, count: usize| if count > 0 { total / count as f64 } else { 0.0 };

        let mut genome_counts: BTreeMap<String, usize> = BTreeMap::new();
        for animal in &animals {
            *genome_counts.entry(animal.genome().to_string()).or_default() += 1;
        }
        let mut dominant_genome: Option<(String, usize)> = None;
        for (genome, count) in genome_counts {
            if dominant_genome.as_ref().map_or(true, |(_, best)| count > *best) {
                dominant_genome = Some((genome, count));
            }
        }

        SimulationStats {
            day: self.day,
            animals: animal_count,
            plants: self.map.all_plants().len(),
            free_cells: self.map.bounds().cell_count() - self.map.cell_count(),
            average_energy: mean(animals.iter().map(|a| a.energy as f64).sum(), animal_count),
            average_children: mean(animals.iter().map(|a| a.children as f64).sum(), animal_count),
            average_lifetime: mean(self.dead_lifetime_total as f64, self.deaths as usize),
            births: self.births,
            deaths: self.deaths,
            dominant_genome: dominant_genome.map(|(genome, _)| genome),
        }
    }
}

/// Snapshot of population figures after a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub day: u64,
    pub animals: usize,
    pub plants: usize,
    /// Cells holding neither animals nor plants
    pub free_cells: usize,
    pub average_energy: f64,
    pub average_children: f64,
    /// Mean age at death over every animal that has died so far
    pub average_lifetime: f64,
    pub births: u64,
    pub deaths: u64,
    pub dominant_genome: Option<String>,
}

fn emit_population_metrics(stats: &SimulationStats) {
    info!(
        event = "population_metrics",
        day = stats.day,
        animals = stats.animals,
        plants = stats.plants,
        free_cells = stats.free_cells,
        average_energy = format!("{:.2}", stats.average_energy),
        average_children = format!("{:.2}", stats.average_children),
        average_lifetime = format!("{:.2}", stats.average_lifetime),
        births = stats.births,
        deaths = stats.deaths,
        "Population metrics snapshot"
    );
}

fn random_position(bounds: &MapBounds, rng: &mut dyn RandomSource) -> Vector2D {
    Vector2D::new(
        rng.random_int(bounds.lower_left.x, bounds.upper_right.x + 1),
        rng.random_int(bounds.lower_left.y, bounds.upper_right.y + 1),
    )
}

/// Middle fifth of the rows, at least one row.
fn is_equator(bounds: &MapBounds, position: &Vector2D) -> bool {
    let middle = bounds.lower_left.y + bounds.height() / 2;
    let half_band = bounds.height() / 10;
    (middle - half_band..=middle + half_band).contains(&position.y)
}
