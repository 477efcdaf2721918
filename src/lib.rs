//! # cncemu
//!
//! A virtual CNC machine that reads G-code programs and traces the toolpath
//! into a scene, either as a polyline or as keyframed motion of a marker.
//!
//! ## Architecture
//!
//! The workspace is split into crates:
//!
//! 1. **cncemu-core** - Errors, units, bounding boxes
//! 2. **cncemu-gcode** - Parser, expression evaluator, interpreter, path geometry
//! 3. **cncemu-settings** - Configuration files and validation
//! 4. **cncemu-emulator** - Virtual CNC, scene abstraction, modal operator, stock
//! 5. **cncemu** - Command line binary tying the crates together

pub use cncemu_core::{Bounds, EmulatorError, Error, GcodeError, Result, Units};
pub use cncemu_emulator::{
    JogDirection, ModalOperator, OperatorCommand, OperatorEvent, OperatorStatus, Scene,
    SceneRecorder, SceneSnapshot, StockVolume, VirtualCnc,
};
pub use cncemu_gcode::{
    parse_file, parse_program, reduce_paths, InterpreterOptions, MachineState, Path, Program,
    Segment,
};
pub use cncemu_settings::Config;

/// Build date stamped by the build script
pub const BUILD_DATE: &str = env!("BUILD_DATE");
pub const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

/// Initialize logging with tracing-subscriber.
///
/// `RUST_LOG` is honoured when set; otherwise the filter is `info`.
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .pretty();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
