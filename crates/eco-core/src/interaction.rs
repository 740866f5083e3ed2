//! Predator-to-prey eat probabilities.

use crate::species::clamp_chance;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse, asymmetric table of eat chances keyed by species name.
///
/// Rows are eaters, columns are prey. Entries that were never set read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionMatrix {
    rows: HashMap<String, HashMap<String, u32>>,
}

impl InteractionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chance that `predator` eats `prey`, clamped to 0-100
    pub fn set(&mut self, predator: impl Into<String>, prey: impl Into<String>, chance: i64) {
        let chance = clamp_chance(chance);
        self.rows
            .entry(predator.into())
            .or_default()
            .insert(prey.into(), chance);
    }

    /// Replace the full row for one eater
    pub fn set_row(&mut self, predator: impl Into<String>, row: impl IntoIterator<Item = (String, i64)>) {
        let predator = predator.into();
        let row = row
            .into_iter()
            .map(|(prey, chance)| (prey, clamp_chance(chance)))
            .collect();
        self.rows.insert(predator, row);
    }

    pub fn probability(&self, predator: &str, prey: &str) -> u32 {
        self.rows
            .get(predator)
            .and_then(|row| row.get(prey))
            .copied()
            .unwrap_or(0)
    }

    pub fn has_row(&self, predator: &str) -> bool {
        self.rows.contains_key(predator)
    }

    /// Whether the eater preys on anything besides its own kind
    pub fn is_active(&self, predator: &str) -> bool {
        self.rows
            .get(predator)
            .is_some_and(|row| row.iter().any(|(prey, &chance)| chance > 0 && prey != predator))
    }

    /// Whether `prey` appears with a positive chance in `predator`'s row
    pub fn preys_on(&self, predator: &str, prey: &str) -> bool {
        predator != prey && self.probability(predator, prey) > 0
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
