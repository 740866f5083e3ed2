//! Island world simulation engine.
//!
//! This module implements the bounded 2D grid where predators, herbivores and
//! plants live, and the fixed-order tick that advances it.

pub mod grid;
pub mod agent;
pub mod simulation;

pub use grid::{Cell, Census, Grid, Plant, EMPTY_GLYPH, PLANT_GLYPH};
pub use agent::{Agent, Meal};
pub use simulation::{RunSummary, Simulation, TickStats};
