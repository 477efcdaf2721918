use std::path::Path;

use cncemu::{reduce_paths, Config};

use crate::output::print_json;

pub fn run(file: &Path, config: &Config, reduce: Option<f64>, json: bool) -> anyhow::Result<()> {
    let program = super::load_program(file)?;
    let (state, errors) = super::run_collecting(&program, config);

    let paths = match reduce {
        // Tolerance is given in program units, geometry is in scene units
        Some(tolerance) => reduce_paths(state.paths(), tolerance / config.scene.scale),
        None => state.paths().to_vec(),
    };

    if json {
        return print_json(&paths);
    }

    for path in &paths {
        println!(
            "{:>5}  {:>9.3}s  {:>8.3}s  {}",
            path.line_number, path.start_time, path.duration, path
        );
    }
    for error in &errors {
        eprintln!("error: {}", error);
    }
    Ok(())
}
