//! # cncemu-gcode
//!
//! G-Code handling for the CNC emulator:
//!
//! - [`parser`]: splits source text into [`Statement`]s, collecting bad lines
//! - [`expression`]: evaluates `#` parameters and `[ ]` expressions
//! - [`interpreter`]: steps a [`Program`] and builds the job timeline
//! - [`path`]: line and arc geometry of the timeline
//! - [`reduce`]: merges nearly collinear line runs

pub mod expression;
pub mod interpreter;
pub mod parser;
pub mod path;
pub mod reduce;
pub mod statement;

pub use expression::{evaluate, ExpressionError, Variables};
pub use interpreter::{
    DistanceMode, InterpreterOptions, MachineState, MotionMode, StepReport,
};
pub use parser::{parse_file, parse_program, Program};
pub use path::{ArcError, ArcGeometry, Path, Plane, Segment};
pub use reduce::{distance_to_segment, reduce_paths};
pub use statement::{Block, Code, InvalidLine, Statement, StatementKind, Word};
