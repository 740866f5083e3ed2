//! Core types and data tables for the island ecosystem simulator.

pub mod types;
pub mod config;
pub mod error;
pub mod species;
pub mod interaction;
pub mod table;
pub mod draw;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use species::*;
pub use interaction::InteractionMatrix;
pub use table::{load_table, parse_table, DiagnosticKind, RowDiagnostic, TableLoad};
pub use draw::{DrawSource, ScriptedDraws, SeededDraws};
