//! The virtual CNC: steps a program and traces its paths into a scene

use std::path::Path as FsPath;
use std::sync::Arc;

use cncemu_core::{EmulatorError, Error, GcodeError, Result};
use cncemu_gcode::{parse_file, parse_program, InterpreterOptions, MachineState, Path, Program, StepReport};
use cncemu_settings::Config;
use glam::DVec3;
use tracing::{debug, info, trace, warn};

use crate::interpolation::trace_points;
use crate::scene::Scene;
use crate::stock::StockVolume;

const COMPLETED_MESSAGE: &str = "Completed, you have to reset";

/// Interpreter options derived from the emulator configuration
pub fn interpreter_options(config: &Config) -> InterpreterOptions {
    InterpreterOptions {
        scale: config.scene.scale,
        rapid_speed_mm: config.machine.rapid_speed_mm,
        tool_change_seconds: config.machine.tool_change_seconds,
        spindle_on_at_start: config.machine.spindle_on_at_start,
        ..InterpreterOptions::default()
    }
}

/// Steps a loaded program and draws every path it produces.
///
/// Positions reported by the interpreter are machine coordinates; the scene
/// receives them shifted by `offset`, which is taken from the marker on
/// [`reset`](VirtualCnc::reset).
pub struct VirtualCnc<S: Scene> {
    config: Config,
    scene: S,
    program: Option<Arc<Program>>,
    state: Option<MachineState>,
    stock: Option<StockVolume>,
    offset: DVec3,
    location: DVec3,
    current_statement: usize,
    finished: bool,
    message: String,
    statement: String,
}

impl<S: Scene> VirtualCnc<S> {
    pub fn new(config: Config, scene: S) -> Self {
        Self {
            config,
            scene,
            program: None,
            state: None,
            stock: None,
            offset: DVec3::ZERO,
            location: DVec3::ZERO,
            current_statement: 0,
            finished: false,
            message: "Initialized".to_string(),
            statement: "No codes yet".to_string(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn into_scene(self) -> S {
        self.scene
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_deref()
    }

    pub fn state(&self) -> Option<&MachineState> {
        self.state.as_ref()
    }

    pub fn stock(&self) -> Option<&StockVolume> {
        self.stock.as_ref()
    }

    pub fn offset(&self) -> DVec3 {
        self.offset
    }

    /// Last traced tool position, machine coordinates
    pub fn location(&self) -> DVec3 {
        self.location
    }

    /// Overwrite one axis of the tool position, after the marker was jogged
    pub fn sync_location_axis(&mut self, axis: usize, scene_value: f64) {
        if axis < 3 {
            self.location[axis] = scene_value - self.offset[axis];
        }
    }

    /// Index of the next statement to run
    pub fn current_statement(&self) -> usize {
        self.current_statement
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Status line for display
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Last executed statement, for display
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Position on the job timeline, seconds
    pub fn timeline_time(&self) -> f64 {
        self.state.as_ref().map_or(0.0, MachineState::elapsed)
    }

    /// Parse a program file and start it
    pub fn load_file(&mut self, path: &FsPath) -> Result<()> {
        let program = match parse_file(path) {
            Ok(program) => program,
            Err(e) => {
                self.message = e.to_string();
                return Err(e);
            }
        };
        self.config.add_recent_file(path.to_path_buf());
        info!("Loaded {}", path.display());
        self.install(program)
    }

    /// Parse program text and start it
    pub fn load_source(&mut self, source: &str) -> Result<()> {
        self.install(parse_program(source))
    }

    fn install(&mut self, program: Program) -> Result<()> {
        for invalid in &program.invalid_lines {
            debug!("Invalid line {}: {}", invalid.line_number, invalid.reason);
        }
        self.program = Some(Arc::new(program));
        self.run_program()
    }

    /// Start the loaded program from the beginning with a fresh machine state
    pub fn run_program(&mut self) -> Result<()> {
        let Some(program) = &self.program else {
            self.message = "No program".to_string();
            return Err(EmulatorError::NoProgram.into());
        };

        let state = MachineState::new(Arc::clone(program), interpreter_options(&self.config));
        self.finished = state.is_finished();
        self.message = format!("Loaded {} statements", program.len());
        self.state = Some(state);
        self.current_statement = 0;
        self.location = DVec3::ZERO;
        self.reset_stock()?;
        debug!("{}", self.message);
        Ok(())
    }

    fn reset_stock(&mut self) -> Result<()> {
        if !self.config.stock.enabled {
            self.stock = None;
            return Ok(());
        }
        match &mut self.stock {
            Some(stock) => stock.refill(),
            None => self.stock = Some(StockVolume::from_settings(&self.config.stock)?),
        }
        Ok(())
    }

    /// Execute the next statement and trace the paths it produced.
    ///
    /// Interpreter errors are returned after the statement has been consumed,
    /// so stepping can continue with the following one.
    pub fn layout_path(&mut self) -> Result<Option<StepReport>> {
        if self.finished {
            self.message = COMPLETED_MESSAGE.to_string();
            return Err(EmulatorError::ProgramFinished.into());
        }
        let Some(state) = self.state.as_mut() else {
            self.message = "No program".to_string();
            return Err(EmulatorError::NoProgram.into());
        };

        if let Some(statement) = state.current_statement() {
            if self.config.scene.debug {
                debug!("{}", statement);
            }
            self.statement = statement.summary();
        }

        let result = state.step();
        self.current_statement = state.program_counter();
        let state_finished = state.is_finished();

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!("{}", e);
                self.message = e.to_string();
                self.finished = state_finished;
                return Err(e.into());
            }
        };

        if let Some(report) = &report {
            for index in report.paths.clone() {
                let path = match self.state.as_ref().and_then(|s| s.paths().get(index)) {
                    Some(path) => path.clone(),
                    None => continue,
                };
                self.message = format!("Drawing path {}", index);
                self.trace_path(&path)?;
            }
        }

        if state_finished {
            self.finished = true;
            self.message = COMPLETED_MESSAGE.to_string();
        }
        Ok(report)
    }

    fn trace_path(&mut self, path: &Path) -> Result<()> {
        if self.config.scene.debug {
            debug!("{}", path);
        }

        if !path.is_motion() {
            // Hold the marker in place for dwells and tool changes
            if self.config.scene.move_object {
                self.scene
                    .move_marker(self.location + self.offset, path.end_time())?;
            }
            return Ok(());
        }

        let carve = path.is_cutting();
        let mut previous = path.start_point().unwrap_or(self.location);
        for point in trace_points(path, self.config.scene.resolution) {
            let time = path.start_time + path.duration * point.fraction;
            trace!(
                "{} to {:.4}, {:.4}, {:.4} at {:.3}s",
                path.kind_name(),
                point.location.x,
                point.location.y,
                point.location.z,
                time
            );
            self.emit(point.location, time)?;

            if carve {
                if let Some(stock) = self.stock.as_mut() {
                    stock.carve_segment(previous, point.location, self.config.stock.tool_radius);
                }
            }
            previous = point.location;
        }
        Ok(())
    }

    fn emit(&mut self, location: DVec3, time: f64) -> Result<()> {
        let adapted = location + self.offset;
        if self.config.scene.move_object {
            self.scene.move_marker(adapted, time)?;
        } else {
            self.scene.ensure_polyline()?;
            self.scene.append_polyline_point(adapted)?;
        }
        self.location = location;
        Ok(())
    }

    /// Run the rest of the program, collecting interpreter errors on the way
    pub fn draw_all(&mut self) -> Result<Vec<GcodeError>> {
        let mut errors = Vec::new();
        while !self.finished {
            match self.layout_path() {
                Ok(_) => {}
                Err(Error::Gcode(e)) => errors.push(e),
                Err(e) => return Err(e),
            }
        }
        info!(
            "Traced program: {} errors, run length {:.2}s",
            errors.len(),
            self.state.as_ref().map_or(0.0, MachineState::run_length)
        );
        Ok(errors)
    }

    /// Rewind the program, using the marker's current location as the new
    /// scene offset and discarding the traced polyline
    pub fn reset(&mut self) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            self.message = "No program".to_string();
            return Err(EmulatorError::NoProgram.into());
        };

        state.rewind();
        self.finished = state.is_finished();
        self.offset = self.scene.marker_location();
        self.scene.delete_polyline();
        self.current_statement = 0;
        self.location = DVec3::ZERO;
        self.reset_stock()?;
        self.statement = format!(
            "Offset: {:.4}, {:.4}, {:.4}",
            self.offset.x, self.offset.y, self.offset.z
        );
        debug!("{}", self.statement);
        Ok(())
    }
}
