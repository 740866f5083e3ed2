//! Loader for the comma-separated eat-probability table.
//!
//! ```text
//! eater,wolf,rabbit,duck,caterpillar
//! wolf,0,60,40,0
//! duck,0,0,0,90
//! ```
//!
//! Malformed rows are skipped and reported; they never abort the load.

use crate::{InteractionMatrix, Result, Species, SpeciesCatalog};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Why a line of the table was not (fully) applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The source has no data rows
    TooShort,
    /// A row's field count differs from the header's
    ColumnCount { expected: usize, found: usize },
    /// A row names an eater that is not listed in the header
    UnknownEater(String),
    /// A header species was missing from the catalog and got default traits
    DefaultTraits(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDiagnostic {
    /// 1-based line number in the source
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::TooShort => {
                write!(f, "line {}: table needs a header and at least one data row", self.line)
            }
            DiagnosticKind::ColumnCount { expected, found } => write!(
                f,
                "line {}: expected {} columns, found {}",
                self.line, expected, found
            ),
            DiagnosticKind::UnknownEater(name) => {
                write!(f, "line {}: unrecognized species '{}'", self.line, name)
            }
            DiagnosticKind::DefaultTraits(name) => write!(
                f,
                "line {}: species '{}' has no profile, using default traits",
                self.line, name
            ),
        }
    }
}

/// Result of loading a table: the matrix plus everything that was skipped
#[derive(Debug, Clone, Default)]
pub struct TableLoad {
    pub matrix: InteractionMatrix,
    pub diagnostics: Vec<RowDiagnostic>,
    pub rows_applied: usize,
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',')
        .map(|field| field.trim().replace('"', ""))
        .collect()
}

/// Parse table text, registering unknown header species in `catalog`
pub fn parse_table(text: &str, catalog: &mut SpeciesCatalog) -> TableLoad {
    let mut load = TableLoad::default();

    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_line, header)) = lines.next() else {
        let diagnostic = RowDiagnostic {
            line: 1,
            kind: DiagnosticKind::TooShort,
        };
        warn!("{}", diagnostic);
        load.diagnostics.push(diagnostic);
        return load;
    };

    let header = split_fields(header);
    let columns: Vec<String> = header.iter().skip(1).cloned().collect();

    for name in columns.iter().filter(|name| !name.is_empty()) {
        if !catalog.contains(name) {
            catalog.insert(Species::with_default_traits(name.as_str()));
            let diagnostic = RowDiagnostic {
                line: header_line,
                kind: DiagnosticKind::DefaultTraits(name.clone()),
            };
            warn!("{}", diagnostic);
            load.diagnostics.push(diagnostic);
        }
    }

    let mut saw_row = false;
    for (line_no, line) in lines {
        saw_row = true;
        let fields = split_fields(line);

        if fields.len() != header.len() {
            let diagnostic = RowDiagnostic {
                line: line_no,
                kind: DiagnosticKind::ColumnCount {
                    expected: header.len(),
                    found: fields.len(),
                },
            };
            warn!("{}", diagnostic);
            load.diagnostics.push(diagnostic);
            continue;
        }

        let eater = fields[0].clone();
        if eater.is_empty() || !columns.contains(&eater) {
            let diagnostic = RowDiagnostic {
                line: line_no,
                kind: DiagnosticKind::UnknownEater(eater),
            };
            warn!("{}", diagnostic);
            load.diagnostics.push(diagnostic);
            continue;
        }

        let row = columns
            .iter()
            .zip(fields.iter().skip(1))
            .filter(|(prey, _)| !prey.is_empty() && **prey != eater)
            .map(|(prey, value)| (prey.clone(), value.parse::<i64>().unwrap_or(0)))
            .collect::<Vec<_>>();

        debug!(eater = %eater, entries = row.len(), line = line_no, "Loaded interaction row");
        load.matrix.set_row(eater, row);
        load.rows_applied += 1;
    }

    if !saw_row {
        let diagnostic = RowDiagnostic {
            line: header_line,
            kind: DiagnosticKind::TooShort,
        };
        warn!("{}", diagnostic);
        load.diagnostics.push(diagnostic);
    }

    load
}

/// Read and parse a table file
pub fn load_table(path: impl AsRef<Path>, catalog: &mut SpeciesCatalog) -> Result<TableLoad> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let load = parse_table(&text, catalog);

    info!(
        path = %path.display(),
        rows_applied = load.rows_applied,
        predators = load.matrix.row_count(),
        rows_skipped = load
            .diagnostics
            .iter()
            .filter(|d| !matches!(d.kind, DiagnosticKind::DefaultTraits(_)))
            .count(),
        "Interaction table loaded"
    );

    Ok(load)
}
