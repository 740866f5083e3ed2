//! Configuration types for the simulation.

use crate::species::{deserialize_chance, MAX_CHANCE};
use crate::{Error, Result, Species};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Chance (percent) that an empty cell grows a plant each tick
pub const DEFAULT_REGROWTH_CHANCE: u32 = 10;

/// Island and run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Width of the island grid
    pub width: i32,
    /// Height of the island grid
    pub height: i32,
    /// Starting head count per species id
    pub initial_population: BTreeMap<String, u32>,
    /// Chance (0-100) that each cell starts with a plant
    #[serde(deserialize_with = "deserialize_chance")]
    pub plant_seed_chance: u32,
    /// Chance (0-100) that an empty cell grows a plant per tick
    #[serde(deserialize_with = "deserialize_chance")]
    pub plant_regrowth_chance: u32,
    /// Delay between ticks in the driver loop
    pub tick_delay_ms: u64,
    /// Random seed for reproducibility; entropy when absent
    pub seed: Option<u64>,
    /// Stop after this many ticks even if animals remain
    pub max_ticks: Option<u64>,
    /// Eat-probability table
    pub interaction_table: Option<PathBuf>,
    /// Species profiles replacing the built-in catalog
    pub species: Option<Vec<Species>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            initial_population: BTreeMap::new(),
            plant_seed_chance: 20,
            plant_regrowth_chance: DEFAULT_REGROWTH_CHANCE,
            tick_delay_ms: 1000,
            seed: None,
            max_ticks: None,
            interaction_table: None,
            species: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject dimensions the grid cannot hold and clamp chances into range
    pub fn validated(mut self) -> Result<Self> {
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        self.plant_seed_chance = self.plant_seed_chance.min(MAX_CHANCE);
        self.plant_regrowth_chance = self.plant_regrowth_chance.min(MAX_CHANCE);
        Ok(self)
    }

    pub fn total_population(&self) -> u64 {
        self.initial_population.values().map(|&n| n as u64).sum()
    }
}
