//! Elements that can occupy a map cell.

use crate::genome::Genome;
use ecosim_core::{ElementId, EnergyConfig, Rotation, Vector2D};
use serde::{Deserialize, Serialize};

/// Discriminant of a [`WorldElement`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Animal,
    Plant,
}

/// An animal in the simulation
///
/// The position is owned by the map: it only changes through
/// [`WorldMap`](crate::WorldMap) so the spatial index never goes stale.
#[derive(Debug, Clone)]
pub struct Animal {
    pub id: ElementId,
    position: Vector2D,
    pub energy: i32,
    genome: Genome,
    pub rotation: Rotation,
    /// Index of the gene that decided the latest turn
    pub active_gene: usize,
    pub age: u64,
    pub children: u32,
    pub plants_eaten: u32,
}

impl Animal {
    pub fn new(position: Vector2D, energy: i32, genome: Genome) -> Self {
        Self {
            id: ElementId::new(),
            position,
            energy: energy.max(0),
            genome,
            rotation: Rotation::NORTH,
            active_gene: 0,
            age: 0,
            children: 0,
            plants_eaten: 0,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_active_gene(mut self, active_gene: usize) -> Self {
        self.active_gene = active_gene % self.genome.len().max(1);
        self
    }

    pub fn position(&self) -> Vector2D {
        self.position
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn is_alive(&self) -> bool {
        self.energy > 0
    }

    pub fn has_enough_energy(&self, energy: &EnergyConfig) -> bool {
        self.energy >= energy.reproduction_energy_threshold
    }

    /// Jump `gene_gap` genes ahead and turn by the gene found there.
    pub fn rotate(&mut self, gene_gap: usize) {
        if self.genome.is_empty() {
            return;
        }
        self.active_gene = (self.active_gene + gene_gap) % self.genome.len();
        let turn = self.genome.gene(self.active_gene);
        self.rotation = self.rotation.turned(turn as u32);
    }

    pub fn gain_energy(&mut self, amount: i32) {
        self.energy = self.energy.saturating_add(amount.max(0));
    }

    /// Energy never drops below zero.
    pub fn lose_energy(&mut self, amount: i32) {
        self.energy = (self.energy - amount.max(0)).max(0);
    }

    pub fn lose_energy_on_move(&mut self, move_cost: i32) {
        self.lose_energy(move_cost);
    }

    pub fn record_child(&mut self) {
        self.children += 1;
    }

    pub fn record_meal(&mut self) {
        self.plants_eaten += 1;
    }

    pub fn tick(&mut self) {
        self.age += 1;
    }

    pub(crate) fn move_to(&mut self, position: Vector2D) {
        self.position = position;
    }
}

/// A plant waiting to be eaten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plant {
    pub id: ElementId,
    position: Vector2D,
}

impl Plant {
    pub fn new(position: Vector2D) -> Self {
        Self {
            id: ElementId::new(),
            position,
        }
    }

    pub fn position(&self) -> Vector2D {
        self.position
    }
}

/// Anything the map can index
#[derive(Debug, Clone)]
pub enum WorldElement {
    Animal(Animal),
    Plant(Plant),
}

impl WorldElement {
    pub fn id(&self) -> ElementId {
        match self {
            WorldElement::Animal(animal) => animal.id,
            WorldElement::Plant(plant) => plant.id,
        }
    }

    pub fn position(&self) -> Vector2D {
        match self {
            WorldElement::Animal(animal) => animal.position(),
            WorldElement::Plant(plant) => plant.position(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            WorldElement::Animal(_) => ElementType::Animal,
            WorldElement::Plant(_) => ElementType::Plant,
        }
    }

    pub fn as_animal(&self) -> Option<&Animal> {
        match self {
            WorldElement::Animal(animal) => Some(animal),
            WorldElement::Plant(_) => None,
        }
    }

    pub(crate) fn as_animal_mut(&mut self) -> Option<&mut Animal> {
        match self {
            WorldElement::Animal(animal) => Some(animal),
            WorldElement::Plant(_) => None,
        }
    }

    pub fn as_plant(&self) -> Option<&Plant> {
        match self {
            WorldElement::Plant(plant) => Some(plant),
            WorldElement::Animal(_) => None,
        }
    }
}

impl From<Animal> for WorldElement {
    fn from(animal: Animal) -> Self {
        WorldElement::Animal(animal)
    }
}

impl From<Plant> for WorldElement {
    fn from(plant: Plant) -> Self {
        WorldElement::Plant(plant)
    }
}
