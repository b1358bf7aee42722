//! Authoritative spatial index of everything on the map.
//!
//! Cells are kept in a `BTreeMap<Vector2D, Vec<WorldElement>>` so that every
//! snapshot iterates in the same order for the same seed. A cell key exists
//! only while its list is non-empty. A second index maps each element id to
//! its cell so drivers can address animals by id.

use crate::borders::MapBounds;
use crate::configuration::WorldConfiguration;
use crate::element::{Animal, Plant, WorldElement};
use ecosim_core::{ElementId, Error, RandomSource, Result, Rotation, Vector2D, DIRECTION_COUNT};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace, warn};

/// Chance, in percent, that a turn skips ahead to a random gene.
const RANDOM_GENE_GAP_PERCENT: u32 = 20;

#[derive(Debug)]
pub struct WorldMap {
    bounds: MapBounds,
    objects: BTreeMap<Vector2D, Vec<WorldElement>>,
    locations: HashMap<ElementId, Vector2D>,
    configuration: WorldConfiguration,
}

impl WorldMap {
    /// Create an empty map sized by the configuration's world settings.
    pub fn new(configuration: WorldConfiguration) -> Self {
        let world = &configuration.settings().world;
        let bounds = MapBounds::from_size(world.width, world.height);
        Self {
            bounds,
            objects: BTreeMap::new(),
            locations: HashMap::new(),
            configuration,
        }
    }

    pub fn lower_left(&self) -> Vector2D {
        self.bounds.lower_left
    }

    pub fn upper_right(&self) -> Vector2D {
        self.bounds.upper_right
    }

    pub fn bounds(&self) -> &MapBounds {
        &self.bounds
    }

    pub fn configuration(&self) -> &WorldConfiguration {
        &self.configuration
    }

    // -------------------------------------------------------------------
    // Placement and lookup
    // -------------------------------------------------------------------

    /// Index `element` at its own position.
    ///
    /// Returns false, leaving the map untouched, when the position lies
    /// outside `[lower_left, upper_right]`.
    pub fn place_object(&mut self, element: WorldElement) -> bool {
        let position = element.position();
        if !self.bounds.contains(&position) {
            return false;
        }
        self.locations.insert(element.id(), position);
        self.objects.entry(position).or_default().push(element);
        true
    }

    /// Elements at `position` in occupancy order.
    pub fn objects_at(&self, position: &Vector2D) -> &[WorldElement] {
        self.objects
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_occupied(&self, position: &Vector2D) -> bool {
        self.objects.contains_key(position)
    }

    pub fn all_animals(&self) -> Vec<&Animal> {
        self.objects
            .values()
            .flatten()
            .filter_map(WorldElement::as_animal)
            .collect()
    }

    pub fn all_plants(&self) -> Vec<&Plant> {
        self.objects
            .values()
            .flatten()
            .filter_map(WorldElement::as_plant)
            .collect()
    }

    pub fn animal_ids(&self) -> Vec<ElementId> {
        self.all_animals().iter().map(|animal| animal.id).collect()
    }

    pub fn animal(&self, id: ElementId) -> Option<&Animal> {
        let position = self.locations.get(&id)?;
        self.objects_at(position)
            .iter()
            .filter_map(WorldElement::as_animal)
            .find(|animal| animal.id == id)
    }

    pub fn plant_at(&self, position: &Vector2D) -> Option<&Plant> {
        self.objects_at(position)
            .iter()
            .find_map(WorldElement::as_plant)
    }

    /// Animal with the most energy at `position`; ties go to the earlier
    /// occupant.
    pub fn strongest_animal_at(&self, position: &Vector2D) -> Option<&Animal> {
        let mut animals: Vec<&Animal> = self
            .objects_at(position)
            .iter()
            .filter_map(WorldElement::as_animal)
            .collect();
        animals.sort_by_key(|animal| Reverse(animal.energy));
        animals.first().copied()
    }

    /// Occupied cells in key order.
    pub fn occupied_positions(&self) -> Vec<Vector2D> {
        self.objects.keys().copied().collect()
    }

    pub fn cell_count(&self) -> usize {
        self.objects.len()
    }

    pub fn element_count(&self) -> usize {
        self.locations.len()
    }

    /// Remove the element with `id` from its cell, pruning the cell when it
    /// empties.
    ///
    /// Removing something that is not indexed is a caller bug: it trips a
    /// debug assertion and otherwise reports [`Error::NotFound`].
    pub fn remove_object(&mut self, id: ElementId) -> Result<WorldElement> {
        let Some(position) = self.locations.get(&id).copied() else {
            debug_assert!(false, "removing element {id} that is not on the map");
            return Err(Error::NotFound(format!("element {id} is not on the map")));
        };
        let (_, element) = self.detach(id, position)?;
        self.locations.remove(&id);
        Ok(element)
    }

    // -------------------------------------------------------------------
    // Per-tick animal update
    // -------------------------------------------------------------------

    /// Turn, move and tire one animal. Returns its new position.
    ///
    /// The animal leaves its old cell and enters the new one inside this
    /// single call, so it is never observable unindexed or in two cells.
    pub fn rotate_and_move(
        &mut self,
        id: ElementId,
        rng: &mut dyn RandomSource,
    ) -> Result<Vector2D> {
        let old_position = self
            .locations
            .get(&id)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("animal {id} is not on the map")))?;
        let is_animal = self
            .objects_at(&old_position)
            .iter()
            .any(|element| element.id() == id && element.as_animal().is_some());
        if !is_animal {
            return Err(Error::InvalidState(format!("element {id} is not an animal")));
        }

        let gene_gap = self.gene_gap(rng);
        let (slot, element) = self.detach(id, old_position)?;
        let WorldElement::Animal(original) = element else {
            return Err(Error::InvalidState(format!("element {id} is not an animal")));
        };

        let mut animal = original.clone();
        animal.rotate(gene_gap);
        let candidate = old_position + animal.rotation.to_unit_vector();
        let destination = self.configuration.map_borders().position_out_of_map(
            &mut animal,
            candidate,
            &self.bounds,
            rng,
        );

        if !self.bounds.contains(&destination) {
            warn!(
                animal_id = %id,
                destination = %destination,
                border = ?self.configuration.map_borders().kind(),
                "Border policy returned a position outside the map"
            );
            // Back into the same slot, as it was before the turn
            self.objects
                .entry(old_position)
                .or_default()
                .insert(slot, original.into());
            return Err(Error::InvalidState(format!(
                "border policy moved animal {id} outside the map to {destination}"
            )));
        }

        let settings = self.configuration.settings();
        animal.lose_energy_on_move(settings.energy.move_energy_cost);

        trace!(
            animal_id = %id,
            from = %old_position,
            to = %destination,
            gene_gap,
            energy = animal.energy,
            "Animal moved"
        );

        animal.move_to(destination);
        self.locations.insert(id, destination);
        self.objects.entry(destination).or_default().push(animal.into());
        Ok(destination)
    }

    /// Gene gap for the next turn: 1, or with some chance a random jump
    /// unless the simulation runs in full predestination.
    fn gene_gap(&self, rng: &mut dyn RandomSource) -> usize {
        let settings = self.configuration.settings();
        if !settings.full_predestination && rng.is_true(RANDOM_GENE_GAP_PERCENT) {
            return rng.random_int(1, settings.genome_length() as i32) as usize;
        }
        1
    }

    // -------------------------------------------------------------------
    // Eating and ageing
    // -------------------------------------------------------------------

    /// Credit a meal to an animal.
    pub fn feed_animal(&mut self, id: ElementId, energy: i32) -> Result<()> {
        let animal = self
            .animal_mut(id)
            .ok_or_else(|| Error::NotFound(format!("animal {id} is not on the map")))?;
        animal.gain_energy(energy);
        animal.record_meal();
        Ok(())
    }

    /// Advance every animal's age by one day.
    pub fn age_animals(&mut self) {
        for animal in self
            .objects
            .values_mut()
            .flatten()
            .filter_map(WorldElement::as_animal_mut)
        {
            animal.tick();
        }
    }

    // -------------------------------------------------------------------
    // Reproduction
    // -------------------------------------------------------------------

    /// Let the two strongest eligible animals at `position` have a child.
    ///
    /// Candidates are ordered by energy, highest first, with ties kept in
    /// occupancy order. Each parent pays `multiplication_energy_lose` and the
    /// child starts with both payments. Returns the child's id, or `None`
    /// when fewer than two animals qualify.
    pub fn animals_reproduction(
        &mut self,
        position: Vector2D,
        rng: &mut dyn RandomSource,
    ) -> Result<Option<ElementId>> {
        let configuration = &self.configuration;
        let settings = configuration.settings();
        let Some(cell) = self.objects.get_mut(&position) else {
            return Ok(None);
        };
        if cell.len() < 2 {
            return Ok(None);
        }

        let mut candidates: Vec<usize> = cell
            .iter()
            .enumerate()
            .filter(|(_, element)| {
                element
                    .as_animal()
                    .is_some_and(|animal| animal.has_enough_energy(&settings.energy))
            })
            .map(|(index, _)| index)
            .collect();
        if candidates.len() < 2 {
            return Ok(None);
        }
        // Stable: equal energies keep their occupancy order
        candidates.sort_by_key(|&index| Reverse(cell[index].as_animal().map_or(0, |a| a.energy)));
        let (mum_index, dad_index) = (candidates[0], candidates[1]);

        let (Some(mum), Some(dad)) = (cell[mum_index].as_animal(), cell[dad_index].as_animal()) else {
            return Err(Error::InvalidState(format!(
                "reproduction candidates at {position} are not animals"
            )));
        };

        // Parents are charged on copies and written back once the child is valid
        let energy_per_parent = settings.multiplication_energy_lose();
        let (mut mum, mut dad) = (mum.clone(), dad.clone());
        for parent in [&mut mum, &mut dad] {
            parent.lose_energy(energy_per_parent);
            parent.record_child();
        }

        // Dad leads the crossover when energies are equal
        let genome = configuration.combiner().combine(&dad, &mum, rng);
        if genome.len() != settings.genome_length() {
            return Err(Error::InvalidState(format!(
                "combined genome has {} genes, expected {}",
                genome.len(),
                settings.genome_length()
            )));
        }

        debug!(
            event = "reproduction",
            position = %position,
            mum_id = %mum.id,
            dad_id = %dad.id,
            mum_energy = mum.energy,
            dad_energy = dad.energy,
            genome = %genome,
            "Animals reproduced"
        );

        let rotation = Rotation::new(rng.random_int(0, DIRECTION_COUNT as i32) as u32);
        let child = Animal::new(position, 2 * energy_per_parent, genome).with_rotation(rotation);
        let child_id = child.id;

        cell[mum_index] = mum.into();
        cell[dad_index] = dad.into();
        if !self.place_object(child.into()) {
            return Err(Error::InvalidState(format!(
                "child could not be placed at {position}"
            )));
        }
        Ok(Some(child_id))
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn animal_mut(&mut self, id: ElementId) -> Option<&mut Animal> {
        let position = self.locations.get(&id)?;
        self.objects
            .get_mut(position)?
            .iter_mut()
            .filter_map(WorldElement::as_animal_mut)
            .find(|animal| animal.id == id)
    }

    /// Take an element out of its cell without touching the id index.
    /// Returns the slot it occupied along with the element.
    fn detach(&mut self, id: ElementId, position: Vector2D) -> Result<(usize, WorldElement)> {
        let cell = self
            .objects
            .get_mut(&position)
            .ok_or_else(|| Error::InvalidState(format!("cell {position} is not indexed")))?;
        let index = cell
            .iter()
            .position(|element| element.id() == id)
            .ok_or_else(|| Error::InvalidState(format!("element {id} missing from cell {position}")))?;
        let element = cell.remove(index);
        if cell.is_empty() {
            self.objects.remove(&position);
        }
        Ok((index, element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::borders::{MapBorders, WrapAround};
    use crate::genome::{Genome, GenomeCombiner};
    use ecosim_core::{BorderKind, ScriptedRandom, SimulationConfig};

    /// Child genome is the leading parent's genome, untouched.
    struct CopyLead;

    impl GenomeCombiner for CopyLead {
        fn combine(&self, lead: &Animal, _other: &Animal, _rng: &mut dyn RandomSource) -> Genome {
            lead.genome().clone()
        }
    }

    /// Always one gene, whatever the configured length.
    struct OneGene;

    impl GenomeCombiner for OneGene {
        fn combine(&self, _mum: &Animal, _dad: &Animal, _rng: &mut dyn RandomSource) -> Genome {
            Genome::new(vec![0])
        }
    }

    /// Sends every animal far off the map.
    struct OffTheMap;

    impl MapBorders for OffTheMap {
        fn position_out_of_map(
            &self,
            _animal: &mut Animal,
            _candidate: Vector2D,
            _bounds: &MapBounds,
            _rng: &mut dyn RandomSource,
        ) -> Vector2D {
            Vector2D::new(100, 100)
        }

        fn kind(&self) -> BorderKind {
            BorderKind::WrapAround
        }
    }

    fn settings() -> SimulationConfig {
        let mut settings = SimulationConfig::default();
        settings.world.width = 10;
        settings.world.height = 10;
        settings.genetics.genome_length = 4;
        settings.energy.move_energy_cost = 1;
        settings.energy.reproduction_energy_threshold = 8;
        settings.energy.multiplication_energy_lose = 4;
        settings.full_predestination = true;
        settings
    }

    fn test_map() -> WorldMap {
        WorldMap::new(WorldConfiguration::new(
            settings(),
            Box::new(WrapAround),
            Box::new(CopyLead),
        ))
    }

    fn animal(x: i32, y: i32, energy: i32) -> Animal {
        Animal::new(Vector2D::new(x, y), energy, Genome::new(vec![0, 0, 0, 0]))
    }

    #[test]
    fn test_bounds() {
        let map = test_map();
        assert_eq!(map.lower_left(), Vector2D::new(0, 0));
        assert_eq!(map.upper_right(), Vector2D::new(9, 9));
    }

    #[test]
    fn test_place_rejects_outside() {
        let mut map = test_map();
        assert!(!map.place_object(animal(10, 0, 5).into()));
        assert!(!map.place_object(Plant::new(Vector2D::new(0, -1)).into()));
        assert_eq!(map.cell_count(), 0);
        assert_eq!(map.element_count(), 0);

        assert!(map.place_object(animal(9, 9, 5).into()));
        assert_eq!(map.objects_at(&Vector2D::new(9, 9)).len(), 1);
    }

    #[test]
    fn test_objects_at_empty_cell() {
        let map = test_map();
        assert!(map.objects_at(&Vector2D::new(3, 3)).is_empty());
        assert!(map.plant_at(&Vector2D::new(3, 3)).is_none());
    }

    #[test]
    fn test_remove_prunes_empty_cells() {
        let mut map = test_map();
        let a = animal(2, 2, 5);
        let b = animal(2, 2, 5);
        let (a_id, b_id) = (a.id, b.id);
        map.place_object(a.into());
        map.place_object(b.into());

        map.remove_object(a_id).unwrap();
        assert!(map.is_occupied(&Vector2D::new(2, 2)));
        map.remove_object(b_id).unwrap();
        assert!(!map.is_occupied(&Vector2D::new(2, 2)));
        assert_eq!(map.cell_count(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not on the map")]
    fn test_remove_missing_panics_in_debug() {
        let mut map = test_map();
        let _ = map.remove_object(ElementId::new());
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_remove_missing_is_not_found() {
        let mut map = test_map();
        assert!(matches!(map.remove_object(ElementId::new()), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_rotate_and_move_updates_index() {
        let mut map = test_map();
        let a = animal(4, 4, 10).with_rotation(Rotation::NORTH);
        let id = a.id;
        map.place_object(a.into());

        let mut rng = ScriptedRandom::new();
        let new_position = map.rotate_and_move(id, &mut rng).unwrap();

        assert_eq!(new_position, Vector2D::new(4, 5));
        assert!(map.objects_at(&Vector2D::new(4, 4)).is_empty());
        assert_eq!(map.objects_at(&new_position).len(), 1);
        let moved = map.animal(id).unwrap();
        assert_eq!(moved.position(), new_position);
        assert_eq!(moved.energy, 9);
    }

    #[test]
    fn test_rotate_and_move_wraps_at_edge() {
        let mut map = test_map();
        let a = animal(9, 0, 10).with_rotation(Rotation::EAST);
        let id = a.id;
        map.place_object(a.into());

        let mut rng = ScriptedRandom::new();
        assert_eq!(map.rotate_and_move(id, &mut rng).unwrap(), Vector2D::new(0, 0));
    }

    #[test]
    fn test_random_gene_gap_when_not_predestined() {
        let mut s = settings();
        s.full_predestination = false;
        let mut map = WorldMap::new(WorldConfiguration::new(s, Box::new(WrapAround), Box::new(CopyLead)));
        // Gene 2 turns the animal east
        let a = Animal::new(Vector2D::new(4, 4), 10, Genome::new(vec![0, 0, 2, 0]));
        let id = a.id;
        map.place_object(a.into());

        let mut rng = ScriptedRandom::new().with_flags([true]).with_ints([2]);
        let new_position = map.rotate_and_move(id, &mut rng).unwrap();
        assert_eq!(new_position, Vector2D::new(5, 4));
        assert_eq!(map.animal(id).unwrap().active_gene, 2);
    }

    #[test]
    fn test_plant_is_not_an_animal() {
        let mut map = test_map();
        let plant = Plant::new(Vector2D::new(1, 1));
        let id = plant.id;
        map.place_object(plant.into());

        let mut rng = ScriptedRandom::new();
        assert!(matches!(map.rotate_and_move(id, &mut rng), Err(Error::InvalidState(_))));
        assert!(map.plant_at(&Vector2D::new(1, 1)).is_some());
    }

    #[test]
    fn test_reproduction_selects_two_strongest() {
        let mut map = test_map();
        let position = Vector2D::new(3, 3);
        let animals: Vec<Animal> = [10, 30, 5, 30].iter().map(|&e| animal(3, 3, e)).collect();
        let ids: Vec<ElementId> = animals.iter().map(|a| a.id).collect();
        for a in animals {
            map.place_object(a.into());
        }

        let mut rng = ScriptedRandom::new();
        let child_id = map.animals_reproduction(position, &mut rng).unwrap().unwrap();

        assert_eq!(map.animal(ids[0]).unwrap().energy, 10);
        assert_eq!(map.animal(ids[1]).unwrap().energy, 26);
        assert_eq!(map.animal(ids[2]).unwrap().energy, 5);
        assert_eq!(map.animal(ids[3]).unwrap().energy, 26);
        assert_eq!(map.animal(child_id).unwrap().energy, 8);
        assert_eq!(map.objects_at(&position).len(), 5);
    }

    #[test]
    fn test_reproduction_needs_two_eligible() {
        let mut map = test_map();
        let position = Vector2D::new(3, 3);
        map.place_object(animal(3, 3, 20).into());
        map.place_object(animal(3, 3, 7).into());
        map.place_object(Plant::new(position).into());

        let mut rng = ScriptedRandom::new();
        assert!(map.animals_reproduction(position, &mut rng).unwrap().is_none());
        assert_eq!(map.objects_at(&position).len(), 3);
        let energies: Vec<i32> = map.all_animals().iter().map(|a| a.energy).collect();
        assert_eq!(energies, vec![20, 7]);
    }

    #[test]
    fn test_reproduction_on_empty_cell() {
        let mut map = test_map();
        let mut rng = ScriptedRandom::new();
        assert!(map
            .animals_reproduction(Vector2D::new(0, 0), &mut rng)
            .unwrap()
            .is_none());
        assert_eq!(map.cell_count(), 0);
    }

    #[test]
    fn test_strongest_animal_prefers_earlier_on_tie() {
        let mut map = test_map();
        let first = animal(1, 1, 12);
        let first_id = first.id;
        map.place_object(first.into());
        map.place_object(animal(1, 1, 12).into());
        map.place_object(animal(1, 1, 3).into());

        assert_eq!(map.strongest_animal_at(&Vector2D::new(1, 1)).unwrap().id, first_id);
    }

    #[test]
    fn test_feed_and_age() {
        let mut map = test_map();
        let a = animal(0, 0, 5);
        let id = a.id;
        map.place_object(a.into());

        map.feed_animal(id, 7).unwrap();
        map.age_animals();

        let fed = map.animal(id).unwrap();
        assert_eq!(fed.energy, 12);
        assert_eq!(fed.plants_eaten, 1);
        assert_eq!(fed.age, 1);
        assert!(matches!(map.feed_animal(ElementId::new(), 1), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_failed_move_leaves_animal_untouched() {
        let mut map = WorldMap::new(WorldConfiguration::new(
            settings(),
            Box::new(OffTheMap),
            Box::new(CopyLead),
        ));
        let a = Animal::new(Vector2D::new(4, 4), 20, Genome::new(vec![2, 2, 2, 2]))
            .with_rotation(Rotation::NORTH);
        let a_id = a.id;
        map.place_object(a.into());
        map.place_object(animal(4, 4, 20).into());

        let mut rng = ScriptedRandom::new();
        assert!(matches!(map.rotate_and_move(a_id, &mut rng), Err(Error::InvalidState(_))));

        let cell = map.objects_at(&Vector2D::new(4, 4));
        assert_eq!(cell.len(), 2);
        assert_eq!(cell[0].id(), a_id);
        let a = map.animal(a_id).unwrap();
        assert_eq!(a.energy, 20);
        assert_eq!(a.rotation, Rotation::NORTH);
        assert_eq!(a.active_gene, 0);
        assert_eq!(a.position(), Vector2D::new(4, 4));
    }

    #[test]
    fn test_rejected_child_genome_charges_nobody() {
        let mut map = WorldMap::new(WorldConfiguration::new(
            settings(),
            Box::new(WrapAround),
            Box::new(OneGene),
        ));
        let position = Vector2D::new(2, 2);
        let (a, b) = (animal(2, 2, 20), animal(2, 2, 20));
        let (a_id, b_id) = (a.id, b.id);
        map.place_object(a.into());
        map.place_object(b.into());

        let mut rng = ScriptedRandom::new();
        assert!(matches!(
            map.animals_reproduction(position, &mut rng),
            Err(Error::InvalidState(_))
        ));

        for id in [a_id, b_id] {
            let parent = map.animal(id).unwrap();
            assert_eq!(parent.energy, 20);
            assert_eq!(parent.children, 0);
        }
        assert_eq!(map.objects_at(&position).len(), 2);
    }

    #[test]
    fn test_second_parent_leads_on_equal_energy() {
        let mut map = test_map();
        let position = Vector2D::new(5, 5);
        map.place_object(Animal::new(position, 20, Genome::new(vec![1, 1, 1, 1])).into());
        map.place_object(Animal::new(position, 20, Genome::new(vec![3, 3, 3, 3])).into());

        let mut rng = ScriptedRandom::new();
        let child_id = map.animals_reproduction(position, &mut rng).unwrap().unwrap();
        assert_eq!(map.animal(child_id).unwrap().genome().genes(), &[3, 3, 3, 3]);
    }
}
