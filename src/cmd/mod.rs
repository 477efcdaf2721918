pub mod config;
pub mod parse;
pub mod paths;
pub mod play;
pub mod stats;
pub mod trace;

use std::path::{Path, PathBuf};

use anyhow::Context;
use cncemu::{Config, GcodeError, MachineState, Program};
use cncemu_emulator::interpreter_options;
use tracing::warn;

/// Config file in effect: the one given on the command line, or the
/// platform default
pub fn config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::default_path().context("locating default config file"),
    }
}

pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = config_path(explicit)?;
    Config::load_or_default(&path).with_context(|| format!("loading {}", path.display()))
}

pub fn load_program(path: &Path) -> anyhow::Result<Program> {
    cncemu::parse_file(path).with_context(|| format!("reading program {}", path.display()))
}

/// Run a program to the end, stepping past statements that fail
pub fn run_collecting(program: &Program, config: &Config) -> (MachineState, Vec<GcodeError>) {
    let mut state = program.start(interpreter_options(config));
    let mut errors = Vec::new();
    loop {
        match state.step() {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                warn!("{}", e);
                errors.push(e);
            }
        }
    }
    (state, errors)
}
