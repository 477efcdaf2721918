//! Unit handling
//!
//! Programs are written in millimetres (G21) or inches (G20). The rapid
//! traverse speed is defined in mm/s and rescaled when a program switches
//! to inches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Rapid traverse speed in mm/s
pub const RAPID_SPEED_MM: f64 = 25.0;

/// Program coordinate units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimeters (G21)
    #[default]
    Mm,
    /// Inches (G20)
    Inch,
}

impl Units {
    /// Convert a value from one unit to another
    pub fn convert(value: f64, from: Units, to: Units) -> f64 {
        match (from, to) {
            (Units::Mm, Units::Inch) => value / MM_PER_INCH,
            (Units::Inch, Units::Mm) => value * MM_PER_INCH,
            _ => value,
        }
    }

    /// Rapid traverse speed expressed in these units per second
    pub fn rapid_speed(self, rapid_speed_mm: f64) -> f64 {
        Self::convert(rapid_speed_mm, Units::Mm, self)
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Mm => write!(f, "mm"),
            Units::Inch => write!(f, "in"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert() {
        assert_eq!(Units::convert(25.4, Units::Mm, Units::Inch), 1.0);
        assert_eq!(Units::convert(2.0, Units::Inch, Units::Mm), 50.8);
        assert_eq!(Units::convert(3.0, Units::Mm, Units::Mm), 3.0);
    }

    #[test]
    fn test_rapid_speed_in_inches() {
        let speed = Units::Inch.rapid_speed(RAPID_SPEED_MM);
        assert!((speed - 25.0 / 25.4).abs() < 1e-12);
        assert_eq!(Units::Mm.rapid_speed(RAPID_SPEED_MM), 25.0);
    }
}
