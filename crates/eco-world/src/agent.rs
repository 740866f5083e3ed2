//! Animal state and per-tick behaviour.

use crate::grid::Cell;
use eco_core::{AgentId, Bounds, Category, Direction, DrawSource, InteractionMatrix, Position, Species};
use std::sync::Arc;
use tracing::trace;

/// An animal on the island
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub species: Arc<Species>,
    pub position: Position,
}

/// What a feed call consumed
#[derive(Debug)]
pub enum Meal {
    /// Another animal, already removed from the cell
    Prey(Agent),
    Plant,
    Nothing,
}

impl Agent {
    pub fn new(species: Arc<Species>, position: Position) -> Self {
        Self {
            id: AgentId::new(),
            species,
            position,
        }
    }

    pub fn category(&self) -> Category {
        self.species.category
    }

    pub fn is_predator(&self) -> bool {
        self.species.is_predator()
    }

    pub fn glyph(&self) -> &str {
        &self.species.glyph
    }

    pub fn species_id(&self) -> &str {
        &self.species.id
    }

    /// Pick one direction and travel up to `speed` cells along it
    pub fn move_within<D: DrawSource + ?Sized>(&mut self, bounds: Bounds, draws: &mut D) -> Direction {
        let directions = Direction::all();
        let direction = directions[draws.pick(directions.len())];
        self.travel(direction, bounds);
        direction
    }

    /// Advance cell by cell, stopping before the first step that leaves `bounds`.
    /// Returns the number of cells travelled.
    pub fn travel(&mut self, direction: Direction, bounds: Bounds) -> u32 {
        let mut travelled = 0;
        for _ in 0..self.species.speed() {
            let next = self.position.step(direction);
            if !bounds.contains(next) {
                break;
            }
            self.position = next;
            travelled += 1;
        }
        travelled
    }

    /// Eat from `cell`, which must be the cell this animal is a member of.
    ///
    /// Removals are applied to the cell immediately, so later feeders in the
    /// same tick only see what is left.
    pub fn feed<D: DrawSource + ?Sized>(
        &self,
        cell: &mut Cell,
        matrix: &InteractionMatrix,
        draws: &mut D,
    ) -> Meal {
        match self.category() {
            Category::Predator => self.hunt(cell, matrix, draws),
            Category::Herbivore => self.graze(cell, matrix, draws),
        }
    }

    fn hunt<D: DrawSource + ?Sized>(&self, cell: &mut Cell, matrix: &InteractionMatrix, draws: &mut D) -> Meal {
        if !matrix.has_row(self.species_id()) {
            return Meal::Nothing;
        }

        let candidates: Vec<(AgentId, u32)> = cell
            .agents()
            .iter()
            .filter(|other| other.id != self.id)
            .map(|other| (other.id, matrix.probability(self.species_id(), other.species_id())))
            .collect();

        for (victim, chance) in candidates {
            if draws.chance(chance) {
                if let Some(prey) = cell.remove_agent(victim) {
                    trace!(
                        predator = %self.species.id,
                        prey = %prey.species.id,
                        x = self.position.x,
                        y = self.position.y,
                        "Predator ate prey"
                    );
                    return Meal::Prey(prey);
                }
            }
        }

        Meal::Nothing
    }

    fn graze<D: DrawSource + ?Sized>(&self, cell: &mut Cell, matrix: &InteractionMatrix, draws: &mut D) -> Meal {
        if matrix.is_active(self.species_id()) {
            let victim = cell
                .agents()
                .iter()
                .find(|other| other.id != self.id && matrix.preys_on(self.species_id(), other.species_id()))
                .map(|other| (other.id, matrix.probability(self.species_id(), other.species_id())));

            if let Some((victim, chance)) = victim {
                if draws.chance(chance) {
                    if let Some(prey) = cell.remove_agent(victim) {
                        trace!(
                            eater = %self.species.id,
                            prey = %prey.species.id,
                            "Herbivore ate prey"
                        );
                        return Meal::Prey(prey);
                    }
                }
            }
        }

        match cell.take_plant() {
            Some(_) => Meal::Plant,
            None => Meal::Nothing,
        }
    }

    /// Roll for one offspring at the current position; the parent is untouched
    pub fn reproduce<D: DrawSource + ?Sized>(&self, draws: &mut D) -> Option<Agent> {
        draws
            .chance(self.species.reproduction_chance())
            .then(|| Agent::new(self.species.clone(), self.position))
    }

    pub fn dies<D: DrawSource + ?Sized>(&self, draws: &mut D) -> bool {
        draws.chance(self.species.death_chance())
    }
}
