//! Toolpath geometry produced by the interpreter
//!
//! Positions are in scene units (program units divided by the state's
//! scale). Lengths are kept in program units so that durations can be
//! derived from feed rates directly.

use std::f64::consts::TAU;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::statement::Code;

const ANGLE_EPSILON: f64 = 1e-9;
const LENGTH_EPSILON: f64 = 1e-12;
/// Slack allowed when an R-format radius is marginally shorter than half the chord
const RADIUS_TOLERANCE: f64 = 1e-6;

/// Arc plane selected by G17/G18/G19
///
/// Each plane maps to an ordered pair of in-plane axes that is right-handed
/// about the plane normal, so "counter-clockwise" means increasing
/// `atan2(second, first)` in every plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Plane {
    /// G17: (X, Y), normal Z
    #[default]
    XY,
    /// G18: (Z, X), normal Y
    ZX,
    /// G19: (Y, Z), normal X
    YZ,
}

impl Plane {
    pub fn from_code(code: Code) -> Option<Self> {
        match (code.letter, code.number) {
            ('G', 17) => Some(Self::XY),
            ('G', 18) => Some(Self::ZX),
            ('G', 19) => Some(Self::YZ),
            _ => None,
        }
    }

    pub fn code(self) -> Code {
        match self {
            Self::XY => Code::g(17),
            Self::ZX => Code::g(18),
            Self::YZ => Code::g(19),
        }
    }

    /// Split a point into `(first, second, normal)` components
    pub fn project(self, v: DVec3) -> (f64, f64, f64) {
        match self {
            Self::XY => (v.x, v.y, v.z),
            Self::ZX => (v.z, v.x, v.y),
            Self::YZ => (v.y, v.z, v.x),
        }
    }

    /// Inverse of [`Plane::project`]
    pub fn unproject(self, first: f64, second: f64, normal: f64) -> DVec3 {
        match self {
            Self::XY => DVec3::new(first, second, normal),
            Self::ZX => DVec3::new(second, normal, first),
            Self::YZ => DVec3::new(normal, first, second),
        }
    }

    /// Centre-offset words for the first and second in-plane axes
    pub fn offset_letters(self) -> (char, char) {
        match self {
            Self::XY => ('I', 'J'),
            Self::ZX => ('K', 'I'),
            Self::YZ => ('J', 'K'),
        }
    }
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XY => write!(f, "XY"),
            Self::ZX => write!(f, "ZX"),
            Self::YZ => write!(f, "YZ"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArcError {
    #[error("arc radius is zero")]
    ZeroRadius,

    #[error("radius {radius} is too small for a chord of {chord}")]
    RadiusTooSmall { radius: f64, chord: f64 },

    #[error("radius-format arc needs distinct start and end points")]
    CoincidentEndpoints,
}

/// Circular (or helical) arc in one of the three planes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcGeometry {
    pub start: DVec3,
    pub end: DVec3,
    /// Centre, lying in the plane through `start`
    pub center: DVec3,
    pub radius: f64,
    pub plane: Plane,
    pub clockwise: bool,
    /// Angle of `start` about the centre, radians
    pub start_angle: f64,
    /// Signed angular travel: negative for clockwise arcs
    pub sweep: f64,
    /// Travel along the plane normal (non-zero for helices)
    pub helix: f64,
}

impl ArcGeometry {
    /// Build an arc from its in-plane centre coordinates.
    ///
    /// Start and end points that coincide describe a full circle.
    pub fn from_center(
        start: DVec3,
        end: DVec3,
        center: (f64, f64),
        plane: Plane,
        clockwise: bool,
    ) -> Result<Self, ArcError> {
        let (sa, sb, sn) = plane.project(start);
        let (ea, eb, en) = plane.project(end);
        let (ca, cb) = center;

        let radius = (sa - ca).hypot(sb - cb);
        if radius < LENGTH_EPSILON {
            return Err(ArcError::ZeroRadius);
        }

        let start_angle = (sb - cb).atan2(sa - ca);
        let end_angle = (eb - cb).atan2(ea - ca);
        let mut sweep = end_angle - start_angle;
        if clockwise {
            if sweep >= -ANGLE_EPSILON {
                sweep -= TAU;
            }
        } else if sweep <= ANGLE_EPSILON {
            sweep += TAU;
        }

        Ok(Self {
            start,
            end,
            center: plane.unproject(ca, cb, sn),
            radius,
            plane,
            clockwise,
            start_angle,
            sweep,
            helix: en - sn,
        })
    }

    /// Build an arc from a radius (`R` word). A negative radius selects
    /// the arc longer than a half circle.
    pub fn from_radius(
        start: DVec3,
        end: DVec3,
        radius: f64,
        plane: Plane,
        clockwise: bool,
    ) -> Result<Self, ArcError> {
        let (sa, sb, _) = plane.project(start);
        let (ea, eb, _) = plane.project(end);
        let (dx, dy) = (ea - sa, eb - sb);
        let chord = dx.hypot(dy);
        if chord < LENGTH_EPSILON {
            return Err(ArcError::CoincidentEndpoints);
        }

        let half = chord / 2.0;
        let r = radius.abs();
        if r < half - RADIUS_TOLERANCE {
            return Err(ArcError::RadiusTooSmall { radius, chord });
        }
        let offset = (r * r - half * half).max(0.0).sqrt();

        // Unit normal to the chord, pointing left of the direction of travel
        let (nx, ny) = (-dy / chord, dx / chord);
        let mut side = if clockwise { -1.0 } else { 1.0 };
        if radius < 0.0 {
            side = -side;
        }

        let center = (sa + dx / 2.0 + side * offset * nx, sb + dy / 2.0 + side * offset * ny);
        Self::from_center(start, end, center, plane, clockwise)
    }

    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep
    }

    /// Path length including helical travel, in the units of the points
    pub fn length(&self) -> f64 {
        (self.radius * self.sweep.abs()).hypot(self.helix)
    }

    /// Point at fraction `t` (0..=1) of the sweep
    pub fn point_at(&self, t: f64) -> DVec3 {
        if t >= 1.0 {
            return self.end;
        }
        let (ca, cb, cn) = self.plane.project(self.center);
        let angle = self.start_angle + self.sweep * t;
        self.plane.unproject(
            ca + self.radius * angle.cos(),
            cb + self.radius * angle.sin(),
            cn + self.helix * t,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// G00 (rapid) or G01 straight move
    Line { start: DVec3, end: DVec3, rapid: bool },
    /// G02/G03 move
    Arc(ArcGeometry),
    /// M06
    ToolChange { tool: Option<u32> },
    /// G04
    Dwell { seconds: f64 },
}

/// One element of the job timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub segment: Segment,
    /// Index of the statement that produced this path
    pub statement: usize,
    pub line_number: usize,
    pub spindle_on: bool,
    /// Rate the path is traversed at, program units per second
    pub feed_rate: f64,
    /// Length in program units
    pub length: f64,
    /// Seconds from job start
    pub start_time: f64,
    pub duration: f64,
}

impl Path {
    pub fn start_point(&self) -> Option<DVec3> {
        match &self.segment {
            Segment::Line { start, .. } => Some(*start),
            Segment::Arc(arc) => Some(arc.start),
            _ => None,
        }
    }

    pub fn end_point(&self) -> Option<DVec3> {
        match &self.segment {
            Segment::Line { end, .. } => Some(*end),
            Segment::Arc(arc) => Some(arc.end),
            _ => None,
        }
    }

    /// Whether the tool moves along this path
    pub fn is_motion(&self) -> bool {
        matches!(self.segment, Segment::Line { .. } | Segment::Arc(_))
    }

    pub fn is_rapid(&self) -> bool {
        matches!(self.segment, Segment::Line { rapid: true, .. })
    }

    /// Whether material is cut while traversing this path
    pub fn is_cutting(&self) -> bool {
        self.is_motion() && self.spindle_on && !self.is_rapid()
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Position at fraction `t` of the path, for motion paths
    pub fn point_at(&self, t: f64) -> Option<DVec3> {
        match &self.segment {
            Segment::Line { start, end, .. } => Some(start.lerp(*end, t.clamp(0.0, 1.0))),
            Segment::Arc(arc) => Some(arc.point_at(t)),
            _ => None,
        }
    }

    /// Short label in the style of the producing command
    pub fn kind_name(&self) -> &'static str {
        match &self.segment {
            Segment::Line { rapid: true, .. } => "Rapid",
            Segment::Line { rapid: false, .. } => "Line",
            Segment::Arc(_) => "Arc",
            Segment::ToolChange { .. } => "ToolChange",
            Segment::Dwell { .. } => "Dwell",
        }
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.segment {
            Segment::Line { start, end, .. } => write!(
                f,
                "{}({:.4}, {:.4}, {:.4} -> {:.4}, {:.4}, {:.4}, F{:.3})",
                self.kind_name(),
                start.x,
                start.y,
                start.z,
                end.x,
                end.y,
                end.z,
                self.feed_rate
            ),
            Segment::Arc(arc) => write!(
                f,
                "Arc({:.4}, {:.4}, {:.4} -> {:.4}, {:.4}, {:.4}, center {:.4}, {:.4}, {:.4}, {}, {}, F{:.3})",
                arc.start.x,
                arc.start.y,
                arc.start.z,
                arc.end.x,
                arc.end.y,
                arc.end.z,
                arc.center.x,
                arc.center.y,
                arc.center.z,
                arc.plane,
                if arc.clockwise { "CW" } else { "CCW" },
                self.feed_rate
            ),
            Segment::ToolChange { tool } => match tool {
                Some(tool) => write!(f, "ToolChange(T{})", tool),
                None => write!(f, "ToolChange()"),
            },
            Segment::Dwell { seconds } => write!(f, "Dwell({:.3}s)", seconds),
        }
    }
}
