use std::path::Path;

use cncemu::{Bounds, Config, Units};
use serde::Serialize;

use crate::output::print_json;

#[derive(Serialize)]
struct ProgramStats {
    statements: usize,
    invalid_lines: usize,
    paths: usize,
    /// Seconds
    run_length: f64,
    cutting_length: f64,
    rapid_length: f64,
    units: Units,
    bounds: Option<Bounds>,
    unknown_codes: Vec<String>,
    errors: Vec<String>,
}

pub fn run(file: &Path, config: &Config, json: bool) -> anyhow::Result<()> {
    let program = super::load_program(file)?;
    let (state, errors) = super::run_collecting(&program, config);

    let stats = ProgramStats {
        statements: program.len(),
        invalid_lines: program.invalid_lines.len(),
        paths: state.paths().len(),
        run_length: state.run_length(),
        cutting_length: state
            .paths()
            .iter()
            .filter(|p| p.is_cutting())
            .map(|p| p.length)
            .sum(),
        rapid_length: state
            .paths()
            .iter()
            .filter(|p| p.is_rapid())
            .map(|p| p.length)
            .sum(),
        units: state.units(),
        bounds: state.bounds().is_valid().then(|| *state.bounds()),
        unknown_codes: state.unknown_codes().iter().map(|c| c.to_string()).collect(),
        errors: errors.iter().map(|e| e.to_string()).collect(),
    };

    if json {
        return print_json(&stats);
    }

    println!("Statements:     {} ({} invalid lines)", stats.statements, stats.invalid_lines);
    println!("Paths:          {}", stats.paths);
    println!("Run length:     {:.2}s", stats.run_length);
    println!("Cutting length: {:.3} {}", stats.cutting_length, stats.units);
    println!("Rapid length:   {:.3} {}", stats.rapid_length, stats.units);
    if let Some(b) = &stats.bounds {
        println!(
            "Bounds:         X {:.4}..{:.4}  Y {:.4}..{:.4}  Z {:.4}..{:.4}",
            b.min_x, b.max_x, b.min_y, b.max_y, b.min_z, b.max_z
        );
    }
    if !stats.unknown_codes.is_empty() {
        println!("Unknown codes:  {}", stats.unknown_codes.join(" "));
    }
    for error in &stats.errors {
        println!("Error:          {}", error);
    }
    Ok(())
}
