//! Error handling for the CNC emulator
//!
//! Provides error types for the layers of the emulator:
//! - G-Code errors (parsing, expression evaluation, arc geometry)
//! - Emulator errors (program lifecycle, scene access)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Represents errors related to G-Code parsing and interpretation.
/// Every variant raised while executing a program carries the 1-based
/// source line it came from.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// Invalid G-Code syntax
    #[error("Invalid syntax at line {line_number}: {reason}")]
    InvalidSyntax {
        /// The line number where the syntax error occurred.
        line_number: usize,
        /// The reason for the syntax error.
        reason: String,
    },

    /// Expression could not be evaluated
    #[error("Invalid expression '{expression}' at line {line_number}: {reason}")]
    InvalidExpression {
        /// The line number of the statement holding the expression.
        line_number: usize,
        /// The raw expression text.
        expression: String,
        /// Why evaluation failed.
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{param}' at line {line_number}: {reason}")]
    InvalidParameter {
        /// The line number where the invalid parameter was found.
        line_number: usize,
        /// The parameter letter.
        param: char,
        /// The reason the parameter is invalid.
        reason: String,
    },

    /// Missing required parameter
    #[error("Missing required parameter '{param}' at line {line_number}")]
    MissingParameter {
        /// The line number where the parameter was missing.
        line_number: usize,
        /// The name of the missing parameter.
        param: char,
    },

    /// Arc parameters do not describe a reachable arc
    #[error("Invalid arc at line {line_number}: {reason}")]
    InvalidArc {
        /// The line number of the arc command.
        line_number: usize,
        /// Why the arc is invalid.
        reason: String,
    },
}

impl GcodeError {
    /// Source line the error refers to
    pub fn line_number(&self) -> usize {
        match self {
            Self::InvalidSyntax { line_number, .. }
            | Self::InvalidExpression { line_number, .. }
            | Self::InvalidParameter { line_number, .. }
            | Self::MissingParameter { line_number, .. }
            | Self::InvalidArc { line_number, .. } => *line_number,
        }
    }
}

/// Emulator error type
///
/// Represents errors raised by the virtual CNC driving a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmulatorError {
    /// No program has been loaded yet
    #[error("No program loaded")]
    NoProgram,

    /// The program has run to completion and must be reset
    #[error("Program finished, reset required")]
    ProgramFinished,

    /// The scene rejected an operation
    #[error("Scene error: {reason}")]
    Scene {
        /// The reason the scene operation failed.
        reason: String,
    },

    /// Invalid stock configuration
    #[error("Invalid stock: {reason}")]
    InvalidStock {
        /// The reason the stock is invalid.
        reason: String,
    },
}

/// Main error type for the emulator
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Emulator error
    #[error(transparent)]
    Emulator(#[from] EmulatorError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }

    /// Check if this is an emulator error
    pub fn is_emulator_error(&self) -> bool {
        matches!(self, Error::Emulator(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
