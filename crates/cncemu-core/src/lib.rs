//! # CNC Emulator Core
//!
//! Core types shared by every crate in the workspace:
//! the error taxonomy, measurement units, and the bounding-box
//! accumulator used while interpreting toolpaths.

pub mod bounds;
pub mod error;
pub mod units;

pub use bounds::Bounds;
pub use error::{EmulatorError, Error, GcodeError, Result};
pub use units::{Units, MM_PER_INCH, RAPID_SPEED_MM};
