//! Species profiles and the catalog that resolves them by name.

use crate::{Category, Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Highest value a percentage chance may take
pub const MAX_CHANCE: u32 = 100;

/// Force any integer percentage into `0..=MAX_CHANCE`
pub fn clamp_chance(value: i64) -> u32 {
    value.clamp(0, MAX_CHANCE as i64) as u32
}

/// Serde reader for percentage fields; out-of-range input is clamped, not rejected
pub fn deserialize_chance<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    i64::deserialize(deserializer).map(clamp_chance)
}

/// Glyph used for species registered without an explicit profile
pub const DEFAULT_GLYPH: &str = "?";

/// Behavioural constants applied when a species has no explicit traits
pub const DEFAULT_TRAITS: Traits = Traits {
    speed: 3,
    reproduction_chance: 25,
    death_chance: 10,
};

/// Per-species behavioural constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Traits {
    /// Maximum number of cells traversed per tick
    pub speed: u32,
    /// Chance (0-100) of producing one offspring per tick
    #[serde(deserialize_with = "deserialize_chance")]
    pub reproduction_chance: u32,
    /// Chance (0-100) of dying per tick
    #[serde(deserialize_with = "deserialize_chance")]
    pub death_chance: u32,
}

impl Default for Traits {
    fn default() -> Self {
        DEFAULT_TRAITS
    }
}

impl Traits {
    /// Clamp every value into its legal range
    pub fn normalized(self) -> Self {
        Self {
            speed: self.speed.max(1),
            reproduction_chance: self.reproduction_chance.min(MAX_CHANCE),
            death_chance: self.death_chance.min(MAX_CHANCE),
        }
    }
}

/// Immutable profile shared by every animal of one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub id: String,
    pub glyph: String,
    pub category: Category,
    #[serde(flatten)]
    pub traits: Traits,
}

impl Species {
    pub fn new(id: impl Into<String>, glyph: impl Into<String>, category: Category, traits: Traits) -> Self {
        Self {
            id: id.into(),
            glyph: glyph.into(),
            category,
            traits: traits.normalized(),
        }
    }

    /// Profile for a species known only by name
    pub fn with_default_traits(id: impl Into<String>) -> Self {
        Self::new(id, DEFAULT_GLYPH, Category::Herbivore, DEFAULT_TRAITS)
    }

    pub fn is_predator(&self) -> bool {
        self.category == Category::Predator
    }

    pub fn speed(&self) -> u32 {
        self.traits.speed
    }

    pub fn reproduction_chance(&self) -> u32 {
        self.traits.reproduction_chance
    }

    pub fn death_chance(&self) -> u32 {
        self.traits.death_chance
    }
}

/// Name-indexed table of species, in registration order
#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalog {
    species: Vec<Arc<Species>>,
    index: HashMap<String, usize>,
}

impl SpeciesCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_species(species: impl IntoIterator<Item = Species>) -> Self {
        let mut catalog = Self::new();
        for s in species {
            catalog.insert(s);
        }
        catalog
    }

    /// The fifteen island species with their stock reproduction and death chances
    pub fn builtin() -> Self {
        let entry = |id: &str, glyph: &str, category, reproduction_chance, death_chance| {
            Species::new(
                id,
                glyph,
                category,
                Traits {
                    speed: DEFAULT_TRAITS.speed,
                    reproduction_chance,
                    death_chance,
                },
            )
        };

        use Category::{Herbivore, Predator};
        Self::from_species([
            entry("wolf", "🐺", Predator, 30, 15),
            entry("boa", "🐍", Predator, 20, 10),
            entry("fox", "🦊", Predator, 40, 20),
            entry("bear", "🐻", Predator, 10, 5),
            entry("eagle", "🦅", Predator, 25, 12),
            entry("horse", "🐎", Herbivore, 20, 5),
            entry("deer", "🦌", Herbivore, 25, 7),
            entry("rabbit", "🐇", Herbivore, 60, 10),
            entry("mouse", "🐁", Herbivore, 70, 15),
            entry("goat", "🐐", Herbivore, 30, 8),
            entry("sheep", "🐑", Herbivore, 25, 7),
            entry("boar", "🐗", Herbivore, 40, 10),
            entry("buffalo", "🐃", Herbivore, 15, 3),
            entry("duck", "🦆", Herbivore, 50, 12),
            entry("caterpillar", "🐛", Herbivore, 80, 20),
        ])
    }

    /// Register a species, replacing any previous profile with the same id
    pub fn insert(&mut self, species: Species) -> Arc<Species> {
        let species = Arc::new(Species {
            traits: species.traits.normalized(),
            ..species
        });
        match self.index.get(&species.id) {
            Some(&slot) => self.species[slot] = species.clone(),
            None => {
                self.index.insert(species.id.clone(), self.species.len());
                self.species.push(species.clone());
            }
        }
        species
    }

    /// Look up a species by id
    pub fn get(&self, id: &str) -> Result<Arc<Species>> {
        self.index
            .get(id)
            .map(|&slot| self.species[slot].clone())
            .ok_or_else(|| Error::UnknownSpecies(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Species>> + '_ {
        self.species.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.species.iter().map(|s| s.id.as_str())
    }
}
