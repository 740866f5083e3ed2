//! Bounded 2D grid of cells and the read-only views rendered by the driver.

use crate::agent::Agent;
use eco_core::{AgentId, Bounds, Category, DrawSource, Position};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Shown for a cell with plants but no animals
pub const PLANT_GLYPH: &str = "🌿";
/// Shown for a cell with nothing in it
pub const EMPTY_GLYPH: &str = "⬜";

/// One unit of herbivore food
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plant {
    pub position: Position,
}

impl Plant {
    pub fn new(position: Position) -> Self {
        Self { position }
    }
}

/// Everything standing on one grid location
#[derive(Debug, Clone, Default)]
pub struct Cell {
    agents: Vec<Agent>,
    plants: VecDeque<Plant>,
}

impl Cell {
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.iter().any(|a| a.id == id)
    }

    pub fn add_agent(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    /// Detach an animal, keeping the order of the rest
    pub fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        let index = self.agents.iter().position(|a| a.id == id)?;
        Some(self.agents.remove(index))
    }

    /// Detach every animal matching `pred`
    pub fn extract_agents(&mut self, pred: impl Fn(&Agent) -> bool) -> Vec<Agent> {
        let (taken, kept): (Vec<Agent>, Vec<Agent>) =
            std::mem::take(&mut self.agents).into_iter().partition(|a| pred(a));
        self.agents = kept;
        taken
    }

    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }

    pub fn add_plant(&mut self, plant: Plant) {
        self.plants.push_back(plant);
    }

    /// Consume one plant, oldest first
    pub fn take_plant(&mut self) -> Option<Plant> {
        self.plants.pop_front()
    }

    pub fn has_animals(&self) -> bool {
        !self.agents.is_empty()
    }

    /// Display glyph: predator, then herbivore, then plant, else bare ground
    pub fn symbol(&self) -> &str {
        if let Some(predator) = self.agents.iter().find(|a| a.category() == Category::Predator) {
            return predator.glyph();
        }
        if let Some(herbivore) = self.agents.iter().find(|a| a.category() == Category::Herbivore) {
            return herbivore.glyph();
        }
        if !self.plants.is_empty() {
            return PLANT_GLYPH;
        }
        EMPTY_GLYPH
    }
}

/// Aggregate head counts for the whole grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub predators: usize,
    pub herbivores: usize,
    pub plants: usize,
}

impl Census {
    pub fn animals(&self) -> usize {
        self.predators + self.herbivores
    }
}

impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Predators: {}, Herbivores: {}, Plants: {}",
            self.predators, self.herbivores, self.plants
        )
    }
}

/// Fixed-size, non-wrapping grid of cells stored row-major
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let size = Bounds::new(width, height).area();
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    /// Roll once per cell and add a plant on success
    pub fn seed_plants<D: DrawSource + ?Sized>(&mut self, chance: u32, draws: &mut D) -> usize {
        let mut seeded = 0;
        for (pos, cell) in self.iter_mut() {
            if draws.chance(chance) {
                cell.add_plant(Plant::new(pos));
                seeded += 1;
            }
        }
        seeded
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.pos_to_index(pos).map(|index| &self.cells[index])
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.pos_to_index(pos).map(move |index| &mut self.cells[index])
    }

    /// Attach an animal to the cell at its own position.
    /// Hands the animal back if that position is off the grid.
    pub fn place(&mut self, agent: Agent) -> std::result::Result<(), Agent> {
        match self.get_mut(agent.position) {
            Some(cell) => {
                cell.add_agent(agent);
                Ok(())
            }
            None => Err(agent),
        }
    }

    pub fn add_plant(&mut self, pos: Position) -> bool {
        match self.get_mut(pos) {
            Some(cell) => {
                cell.add_plant(Plant::new(pos));
                true
            }
            None => false,
        }
    }

    fn pos_to_index(&self, pos: Position) -> Option<usize> {
        self.bounds()
            .contains(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Position, &mut Cell)> + '_ {
        let width = self.width;
        self.cells.iter_mut().enumerate().map(move |(i, cell)| {
            let i = i as i32;
            (Position::new(i % width, i / width), cell)
        })
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.cells.iter().flat_map(|cell| cell.agents().iter())
    }

    pub fn agent_count(&self) -> usize {
        self.cells.iter().map(|cell| cell.agents().len()).sum()
    }

    /// Every cell's animal list is empty
    pub fn is_extinct(&self) -> bool {
        self.cells.iter().all(|cell| !cell.has_animals())
    }

    pub fn symbol_at(&self, pos: Position) -> Option<&str> {
        self.get(pos).map(Cell::symbol)
    }

    /// One string per row, glyphs concatenated left to right
    pub fn symbol_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(Cell::symbol).collect())
            .collect()
    }

    pub fn census(&self) -> Census {
        self.cells.iter().fold(Census::default(), |mut census, cell| {
            for agent in cell.agents() {
                match agent.category() {
                    Category::Predator => census.predators += 1,
                    Category::Herbivore => census.herbivores += 1,
                }
            }
            census.plants += cell.plant_count();
            census
        })
    }

    /// Each animal sits in the cell matching its position and appears only once
    pub fn placement_is_consistent(&self) -> bool {
        let mut seen = HashSet::new();
        self.iter().all(|(pos, cell)| {
            cell.agents()
                .iter()
                .all(|agent| agent.position == pos && seen.insert(agent.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::{SeededDraws, Species, Traits};
    use std::sync::Arc;

    fn species(id: &str, glyph: &str, category: Category) -> Arc<Species> {
        Arc::new(Species::new(id, glyph, category, Traits::default()))
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 4);
        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 4);
        assert_eq!(grid.cells.len(), 40);
        assert!(grid.is_extinct());
        assert!(grid.get(Position::new(9, 3)).is_some());
        assert!(grid.get(Position::new(10, 0)).is_none());
        assert!(grid.get(Position::new(0, -1)).is_none());
    }

    #[test]
    fn test_index_roundtrip() {
        let grid = Grid::new(7, 3);
        for (i, (pos, _)) in grid.iter().enumerate() {
            assert_eq!(grid.index_to_pos(i), pos);
            assert_eq!(grid.pos_to_index(pos), Some(i));
        }
    }

    #[test]
    fn test_seed_plants_everywhere() {
        let mut grid = Grid::new(5, 5);
        let mut draws = SeededDraws::from_seed(42);
        assert_eq!(grid.seed_plants(100, &mut draws), 25);
        assert!(grid.iter().all(|(_, cell)| cell.plant_count() == 1));
        assert_eq!(grid.census().plants, 25);

        let mut barren = Grid::new(5, 5);
        assert_eq!(barren.seed_plants(0, &mut draws), 0);
    }

    #[test]
    fn test_place_rejects_out_of_bounds() {
        let mut grid = Grid::new(3, 3);
        let rabbit = species("rabbit", "r", Category::Herbivore);

        assert!(grid.place(Agent::new(rabbit.clone(), Position::new(2, 2))).is_ok());
        let rejected = grid.place(Agent::new(rabbit, Position::new(3, 0)));
        assert!(rejected.is_err());
        assert_eq!(grid.agent_count(), 1);
        assert!(grid.placement_is_consistent());
    }

    #[test]
    fn test_symbol_precedence() {
        let mut grid = Grid::new(4, 1);
        let wolf = species("wolf", "W", Category::Predator);
        let deer = species("deer", "D", Category::Herbivore);

        grid.place(Agent::new(deer.clone(), Position::new(0, 0))).unwrap();
        grid.place(Agent::new(wolf, Position::new(0, 0))).unwrap();
        grid.add_plant(Position::new(0, 0));

        grid.place(Agent::new(deer, Position::new(1, 0))).unwrap();
        grid.add_plant(Position::new(1, 0));

        grid.add_plant(Position::new(2, 0));

        assert_eq!(grid.symbol_at(Position::new(0, 0)), Some("W"));
        assert_eq!(grid.symbol_at(Position::new(1, 0)), Some("D"));
        assert_eq!(grid.symbol_at(Position::new(2, 0)), Some(PLANT_GLYPH));
        assert_eq!(grid.symbol_at(Position::new(3, 0)), Some(EMPTY_GLYPH));
        assert_eq!(grid.symbol_rows(), vec![format!("WD{}{}", PLANT_GLYPH, EMPTY_GLYPH)]);
    }

    #[test]
    fn test_census() {
        let mut grid = Grid::new(2, 2);
        let fox = species("fox", "F", Category::Predator);
        let mouse = species("mouse", "M", Category::Herbivore);

        grid.place(Agent::new(fox, Position::new(0, 0))).unwrap();
        grid.place(Agent::new(mouse.clone(), Position::new(1, 1))).unwrap();
        grid.place(Agent::new(mouse, Position::new(1, 1))).unwrap();
        grid.add_plant(Position::new(0, 1));

        let census = grid.census();
        assert_eq!(
            census,
            Census {
                predators: 1,
                herbivores: 2,
                plants: 1
            }
        );
        assert_eq!(census.animals(), 3);
        assert_eq!(census.to_string(), "Predators: 1, Herbivores: 2, Plants: 1");
    }

    #[test]
    fn test_inconsistent_placement_detected() {
        let mut grid = Grid::new(2, 2);
        let goat = species("goat", "G", Category::Herbivore);
        let mut agent = Agent::new(goat, Position::new(0, 0));
        grid.place(agent.clone()).unwrap();
        assert!(grid.placement_is_consistent());

        // moved without relocation
        agent.position = Position::new(1, 0);
        grid.get_mut(Position::new(0, 0)).unwrap().agents_mut()[0].position = agent.position;
        assert!(!grid.placement_is_consistent());
    }

    #[test]
    fn test_extract_agents() {
        let mut cell = Cell::default();
        let sheep = species("sheep", "S", Category::Herbivore);
        let a = Agent::new(sheep.clone(), Position::new(0, 0));
        let b = Agent::new(sheep, Position::new(1, 0));
        cell.add_agent(a.clone());
        cell.add_agent(b.clone());

        let moved = cell.extract_agents(|agent| agent.position != Position::new(0, 0));
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].id, b.id);
        assert!(cell.contains(a.id));
        assert!(!cell.contains(b.id));
    }
}
