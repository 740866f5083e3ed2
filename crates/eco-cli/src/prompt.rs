//! Interactive parameter entry. Blank or unparsable answers keep the default.

use anyhow::Result;
use eco_core::{clamp_chance, SimulationConfig};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Table path offered when none is typed
pub const DEFAULT_TABLE_PATH: &str = "data/animals.csv";

fn ask<T: FromStr, R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str, default: T) -> Result<T> {
    write!(output, "{}: ", question)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().parse().unwrap_or(default))
}

/// Ask for every simulation parameter, one line per answer
pub fn read_config<'a, R, W>(
    input: &mut R,
    output: &mut W,
    species: impl IntoIterator<Item = &'a str>,
) -> Result<SimulationConfig>
where
    R: BufRead,
    W: Write,
{
    let defaults = SimulationConfig::default();
    writeln!(output, "=== Simulation setup ===")?;

    let width = ask(input, output, &format!("Island width (default {})", defaults.width), defaults.width)?;
    let height = ask(input, output, &format!("Island height (default {})", defaults.height), defaults.height)?;

    writeln!(output, "Starting head count per species:")?;
    let mut initial_population = defaults.initial_population.clone();
    for id in species {
        let count: u32 = ask(input, output, &format!("{} (default 0)", id), 0)?;
        if count > 0 {
            initial_population.insert(id.to_string(), count);
        }
    }

    let plant_seed_chance: i64 = ask(
        input,
        output,
        &format!("Plant chance, % (default {})", defaults.plant_seed_chance),
        defaults.plant_seed_chance as i64,
    )?;
    let delay_secs: u64 = ask(
        input,
        output,
        &format!("Seconds per tick (default {})", defaults.tick_delay_ms / 1000),
        defaults.tick_delay_ms / 1000,
    )?;

    write!(output, "Eat-probability table (default {}): ", DEFAULT_TABLE_PATH)?;
    output.flush()?;
    let mut table = String::new();
    input.read_line(&mut table)?;
    let table = match table.trim() {
        "" => DEFAULT_TABLE_PATH,
        path => path,
    };

    Ok(SimulationConfig {
        width,
        height,
        initial_population,
        plant_seed_chance: clamp_chance(plant_seed_chance),
        tick_delay_ms: delay_secs * 1000,
        interaction_table: Some(PathBuf::from(table)),
        ..defaults
    })
}
