//! Program execution and machine state
//!
//! [`MachineState`] steps through a [`Program`] one statement at a time,
//! tracking modal state (units, plane, distance mode, motion mode, spindle)
//! and appending the [`Path`]s each statement produces to a job timeline.

use std::ops::Range;
use std::sync::Arc;

use cncemu_core::{Bounds, GcodeError, Units, RAPID_SPEED_MM};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::expression::{evaluate, Variables};
use crate::parser::Program;
use crate::path::{ArcGeometry, Path, Plane, Segment};
use crate::statement::{Block, Code, Statement, StatementKind};

/// Samples taken along an arc when growing the bounding box
const ARC_BOUNDS_SAMPLES: usize = 16;

/// Codes that are accepted but have no effect on the emulated toolpath
const IGNORED_CODES: &[Code] = &[
    Code::g(40),
    Code::g(43),
    Code::g(49),
    Code::g(54),
    Code::g(55),
    Code::g(56),
    Code::g(57),
    Code::g(58),
    Code::g(59),
    Code::g(61),
    Code::g(64),
    Code::g(80),
    Code::g(94),
    Code::g(96),
    Code::g(97),
    Code::m(0),
    Code::m(1),
    Code::m(7),
    Code::m(8),
    Code::m(9),
];

/// Tunables applied when a program is started
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterOptions {
    /// Program units per scene unit; 1000 maps millimetres to metres
    pub scale: f64,
    /// Rapid traverse speed in mm/s
    pub rapid_speed_mm: f64,
    /// Seconds spent on an M06 tool change
    pub tool_change_seconds: f64,
    /// Spindle state before any M03/M05
    pub spindle_on_at_start: bool,
    /// Feed rate in program units per second before the first F word
    pub initial_feed_rate: f64,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            scale: 1000.0,
            rapid_speed_mm: RAPID_SPEED_MM,
            tool_change_seconds: 3.0,
            spindle_on_at_start: true,
            initial_feed_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMode {
    /// G90
    #[default]
    Absolute,
    /// G91
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    /// G00
    Rapid,
    /// G01
    Linear,
    /// G02
    ArcClockwise,
    /// G03
    ArcCounterClockwise,
}

impl MotionMode {
    pub fn from_code(code: Code) -> Option<Self> {
        match (code.letter, code.number, code.minor) {
            ('G', 0, 0) => Some(Self::Rapid),
            ('G', 1, 0) => Some(Self::Linear),
            ('G', 2, 0) => Some(Self::ArcClockwise),
            ('G', 3, 0) => Some(Self::ArcCounterClockwise),
            _ => None,
        }
    }
}

/// Outcome of executing one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Index of the executed statement
    pub statement: usize,
    pub line_number: usize,
    /// Indices into [`MachineState::paths`] produced by the statement
    pub paths: Range<usize>,
}

impl StepReport {
    pub fn produced_paths(&self) -> bool {
        !self.paths.is_empty()
    }
}

impl Program {
    /// Begin executing a copy of this program
    pub fn start(&self, options: InterpreterOptions) -> MachineState {
        MachineState::new(Arc::new(self.clone()), options)
    }
}

/// Execution state of a running program
#[derive(Debug, Clone)]
pub struct MachineState {
    program: Arc<Program>,
    options: InterpreterOptions,
    variables: Variables,
    program_counter: usize,
    finished: bool,
    /// Program units per second
    feed_rate: f64,
    rapid_speed: f64,
    time: f64,
    position: DVec3,
    bounds: Bounds,
    spindle_on: bool,
    spindle_speed: f64,
    tool: Option<u32>,
    units: Units,
    distance_mode: DistanceMode,
    plane: Plane,
    motion_mode: Option<MotionMode>,
    paths: Vec<Path>,
    unknown_codes: Vec<Code>,
}

impl MachineState {
    pub fn new(program: Arc<Program>, options: InterpreterOptions) -> Self {
        let units = Units::default();
        let mut bounds = Bounds::new();
        bounds.update(0.0, 0.0, 0.0);
        let finished = program.is_empty();

        Self {
            rapid_speed: units.rapid_speed(options.rapid_speed_mm),
            feed_rate: options.initial_feed_rate,
            spindle_on: options.spindle_on_at_start,
            program,
            options,
            variables: Variables::new(),
            program_counter: 0,
            finished,
            time: 0.0,
            position: DVec3::ZERO,
            bounds,
            spindle_speed: 0.0,
            tool: None,
            units,
            distance_mode: DistanceMode::default(),
            plane: Plane::default(),
            motion_mode: None,
            paths: Vec::new(),
            unknown_codes: Vec::new(),
        }
    }

    /// Return to the start of the program with a fresh state
    pub fn rewind(&mut self) {
        *self = Self::new(Arc::clone(&self.program), self.options.clone());
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    pub fn program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Statement that the next [`step`](Self::step) will execute
    pub fn current_statement(&self) -> Option<&Statement> {
        if self.finished {
            return None;
        }
        self.program.get(self.program_counter)
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<Path> {
        self.paths
    }

    /// Codes seen in the program that the interpreter does not implement,
    /// in first-seen order
    pub fn unknown_codes(&self) -> &[Code] {
        &self.unknown_codes
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn distance_mode(&self) -> DistanceMode {
        self.distance_mode
    }

    pub fn spindle_on(&self) -> bool {
        self.spindle_on
    }

    pub fn spindle_speed(&self) -> f64 {
        self.spindle_speed
    }

    pub fn tool(&self) -> Option<u32> {
        self.tool
    }

    /// Current feed rate in program units per second
    pub fn feed_rate(&self) -> f64 {
        self.feed_rate
    }

    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    /// Time elapsed on the job timeline, seconds
    pub fn elapsed(&self) -> f64 {
        self.time
    }

    /// Total duration of every path produced so far
    pub fn run_length(&self) -> f64 {
        self.paths.iter().map(|p| p.duration).sum()
    }

    /// Execute the next statement.
    ///
    /// Returns `Ok(None)` once the program has finished. The program counter
    /// advances even when the statement fails, so callers may report the
    /// error and keep stepping.
    pub fn step(&mut self) -> Result<Option<StepReport>, GcodeError> {
        if self.finished {
            return Ok(None);
        }
        let program = Arc::clone(&self.program);
        let Some(statement) = program.get(self.program_counter) else {
            self.finished = true;
            return Ok(None);
        };

        let first_path = self.paths.len();
        trace!("Executing {}", statement);
        let result = self.execute(statement);

        self.program_counter += 1;
        if self.program_counter >= program.len() {
            self.finished = true;
        }
        self.update_bounds(first_path);
        result?;

        Ok(Some(StepReport {
            statement: statement.index,
            line_number: statement.line_number,
            paths: first_path..self.paths.len(),
        }))
    }

    /// Step until the program finishes, stopping at the first error
    pub fn run_to_end(&mut self) -> Result<(), GcodeError> {
        while self.step()?.is_some() {}
        debug!(
            "Program finished: {} paths, run length {:.2}s, {} unknown codes",
            self.paths.len(),
            self.run_length(),
            self.unknown_codes.len()
        );
        Ok(())
    }

    fn update_bounds(&mut self, first_path: usize) {
        for path in &self.paths[first_path..] {
            if let Segment::Arc(arc) = &path.segment {
                for i in 1..ARC_BOUNDS_SAMPLES {
                    let p = arc.point_at(i as f64 / ARC_BOUNDS_SAMPLES as f64);
                    self.bounds.update(p.x, p.y, p.z);
                }
            }
        }
        let p = self.position;
        self.bounds.update(p.x, p.y, p.z);
    }

    fn execute(&mut self, statement: &Statement) -> Result<(), GcodeError> {
        let line_number = statement.line_number;
        match &statement.kind {
            StatementKind::Blank | StatementKind::ProgramMarker => Ok(()),
            StatementKind::Assignment { name, expression } => {
                let value = self.evaluate(expression, line_number)?;
                trace!("{} = {}", name, value);
                self.variables.insert(name.clone(), value);
                Ok(())
            }
            StatementKind::Block(block) => self.execute_block(statement, block),
        }
    }

    fn execute_block(&mut self, statement: &Statement, block: &Block) -> Result<(), GcodeError> {
        let line_number = statement.line_number;

        if let Some(feed) = self.word_value(block, 'F', line_number)? {
            if feed <= 0.0 {
                return Err(GcodeError::InvalidParameter {
                    line_number,
                    param: 'F',
                    reason: "feed rate must be positive".to_string(),
                });
            }
            // Supplied per minute
            self.feed_rate = feed / 60.0;
        }
        if let Some(speed) = self.word_value(block, 'S', line_number)? {
            if speed < 0.0 {
                return Err(GcodeError::InvalidParameter {
                    line_number,
                    param: 'S',
                    reason: "spindle speed cannot be negative".to_string(),
                });
            }
            self.spindle_speed = speed;
        }
        if let Some(tool) = self.word_value(block, 'T', line_number)? {
            if !(0.0..=f64::from(u32::MAX)).contains(&tool) || tool.fract() != 0.0 {
                return Err(GcodeError::InvalidParameter {
                    line_number,
                    param: 'T',
                    reason: format!(
                        "tool number must be a whole number from 0 to {}, got {}",
                        u32::MAX,
                        tool
                    ),
                });
            }
            self.tool = Some(tool as u32);
        }

        let mut motion = None;
        let mut end_of_program = false;
        for &code in &block.codes {
            if let Some(mode) = MotionMode::from_code(code) {
                motion = Some(mode);
                continue;
            }
            if let Some(plane) = Plane::from_code(code) {
                self.plane = plane;
                continue;
            }

            match (code.letter, code.number) {
                ('G', 4) => self.dwell(statement, block)?,
                ('G', 20) => self.set_units(Units::Inch),
                ('G', 21) => self.set_units(Units::Mm),
                ('G', 90) => self.distance_mode = DistanceMode::Absolute,
                ('G', 91) => self.distance_mode = DistanceMode::Incremental,
                ('M', 2) | ('M', 30) => end_of_program = true,
                ('M', 3) | ('M', 4) => self.spindle_on = true,
                ('M', 5) => self.spindle_on = false,
                ('M', 6) => self.tool_change(statement),
                _ if IGNORED_CODES.contains(&code) => {}
                _ => self.record_unknown(code),
            }
        }

        let motion = match motion {
            Some(mode) => {
                self.motion_mode = Some(mode);
                Some(mode)
            }
            None if block.has_axis_words() => match self.motion_mode {
                Some(mode) => Some(mode),
                None => {
                    return Err(GcodeError::InvalidSyntax {
                        line_number,
                        reason: "axis words without an active motion mode".to_string(),
                    })
                }
            },
            None => None,
        };

        match motion {
            Some(MotionMode::Rapid) => self.linear_move(statement, block, true)?,
            Some(MotionMode::Linear) => self.linear_move(statement, block, false)?,
            Some(MotionMode::ArcClockwise) => self.arc_move(statement, block, true)?,
            Some(MotionMode::ArcCounterClockwise) => self.arc_move(statement, block, false)?,
            None => {}
        }

        if end_of_program {
            debug!("End of program at line {}", line_number);
            self.finished = true;
        }
        Ok(())
    }

    fn evaluate(&self, expression: &str, line_number: usize) -> Result<f64, GcodeError> {
        evaluate(expression, &self.variables).map_err(|e| GcodeError::InvalidExpression {
            line_number,
            expression: expression.to_string(),
            reason: e.to_string(),
        })
    }

    fn word_value(
        &self,
        block: &Block,
        letter: char,
        line_number: usize,
    ) -> Result<Option<f64>, GcodeError> {
        block
            .word(letter)
            .map(|raw| self.evaluate(raw, line_number))
            .transpose()
    }

    fn set_units(&mut self, units: Units) {
        self.units = units;
        self.rapid_speed = units.rapid_speed(self.options.rapid_speed_mm);
    }

    fn record_unknown(&mut self, code: Code) {
        if !self.unknown_codes.contains(&code) {
            warn!("Unknown code: {}", code);
            self.unknown_codes.push(code);
        }
    }

    /// Target position of a motion block, in scene units.
    ///
    /// Axes without a word keep their current value.
    fn target(&self, block: &Block, line_number: usize) -> Result<(DVec3, bool), GcodeError> {
        let mut target = self.position;
        let mut any_axis = false;

        for (axis, letter) in ['X', 'Y', 'Z'].into_iter().enumerate() {
            if let Some(value) = self.word_value(block, letter, line_number)? {
                let value = value / self.options.scale;
                target[axis] = match self.distance_mode {
                    DistanceMode::Absolute => value,
                    DistanceMode::Incremental => self.position[axis] + value,
                };
                any_axis = true;
            }
        }
        Ok((target, any_axis))
    }

    fn push_path(&mut self, statement: &Statement, segment: Segment, rate: f64, length: f64, duration: f64) {
        let path = Path {
            segment,
            statement: statement.index,
            line_number: statement.line_number,
            spindle_on: self.spindle_on,
            feed_rate: rate,
            length,
            start_time: self.time,
            duration,
        };
        trace!("{}", path);
        self.time += duration;
        self.paths.push(path);
    }

    fn linear_move(
        &mut self,
        statement: &Statement,
        block: &Block,
        rapid: bool,
    ) -> Result<(), GcodeError> {
        let (target, any_axis) = self.target(block, statement.line_number)?;
        if !any_axis {
            return Ok(());
        }

        // Moves with the spindle stopped travel at jog speed
        let rate = if rapid || !self.spindle_on {
            self.rapid_speed
        } else {
            self.feed_rate
        };
        let length = self.position.distance(target) * self.options.scale;
        let segment = Segment::Line {
            start: self.position,
            end: target,
            rapid,
        };
        self.push_path(statement, segment, rate, length, length / rate);
        self.position = target;
        Ok(())
    }

    fn arc_move(
        &mut self,
        statement: &Statement,
        block: &Block,
        clockwise: bool,
    ) -> Result<(), GcodeError> {
        let line_number = statement.line_number;
        let (target, _) = self.target(block, line_number)?;
        let scale = self.options.scale;
        let invalid_arc = |e: crate::path::ArcError| GcodeError::InvalidArc {
            line_number,
            reason: e.to_string(),
        };

        let geometry = if let Some(radius) = self.word_value(block, 'R', line_number)? {
            ArcGeometry::from_radius(self.position, target, radius / scale, self.plane, clockwise)
                .map_err(invalid_arc)?
        } else {
            let (first, second) = self.plane.offset_letters();
            let offset_first = self.word_value(block, first, line_number)?;
            let offset_second = self.word_value(block, second, line_number)?;
            if offset_first.is_none() && offset_second.is_none() {
                return Err(GcodeError::MissingParameter {
                    line_number,
                    param: first,
                });
            }
            // Centre offsets are always relative to the start point
            let (pa, pb, _) = self.plane.project(self.position);
            let center = (
                pa + offset_first.unwrap_or(0.0) / scale,
                pb + offset_second.unwrap_or(0.0) / scale,
            );
            ArcGeometry::from_center(self.position, target, center, self.plane, clockwise)
                .map_err(invalid_arc)?
        };

        let rate = self.feed_rate;
        let length = geometry.length() * scale;
        self.push_path(statement, Segment::Arc(geometry), rate, length, length / rate);
        self.position = target;
        Ok(())
    }

    fn dwell(&mut self, statement: &Statement, block: &Block) -> Result<(), GcodeError> {
        let seconds = self
            .word_value(block, 'P', statement.line_number)?
            .unwrap_or(0.0);
        if seconds < 0.0 {
            return Err(GcodeError::InvalidParameter {
                line_number: statement.line_number,
                param: 'P',
                reason: "dwell time cannot be negative".to_string(),
            });
        }
        let rate = self.feed_rate;
        self.push_path(statement, Segment::Dwell { seconds }, rate, 0.0, seconds);
        Ok(())
    }

    fn tool_change(&mut self, statement: &Statement) {
        let rate = self.feed_rate;
        let duration = self.options.tool_change_seconds;
        let tool = self.tool;
        self.push_path(statement, Segment::ToolChange { tool }, rate, 0.0, duration);
    }
}
