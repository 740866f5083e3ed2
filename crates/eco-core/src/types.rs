//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an animal instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dietary category of a species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Predator,
    Herbivore,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Predator => f.write_str("predator"),
            Category::Herbivore => f.write_str("herbivore"),
        }
    }
}

/// 2D position in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fixed extent of a bounded (non-wrapping) grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, pos: Position) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    pub fn area(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }
}

/// Orthogonal direction of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn all() -> [Direction; 4] {
        [
            Direction::West,
            Direction::East,
            Direction::North,
            Direction::South,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds::new(10, 5);
        assert!(bounds.contains(Position::new(0, 0)));
        assert!(bounds.contains(Position::new(9, 4)));
        assert!(!bounds.contains(Position::new(10, 4)));
        assert!(!bounds.contains(Position::new(9, 5)));
        assert!(!bounds.contains(Position::new(-1, 0)));
        assert_eq!(bounds.area(), 50);
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::North.to_delta(), (0, -1));
        assert_eq!(Direction::South.to_delta(), (0, 1));
        assert_eq!(Direction::East.to_delta(), (1, 0));
        assert_eq!(Direction::West.to_delta(), (-1, 0));
    }

    #[test]
    fn test_position_step() {
        let pos = Position::new(2, 2);
        assert_eq!(pos.step(Direction::East), Position::new(3, 2));
        assert_eq!(pos.step(Direction::North), Position::new(2, 1));
    }
}
