//! Intermediate points along traced paths
//!
//! The number of points grows with path length and shrinks with feed rate,
//! so slow moves are traced more densely than fast ones.

use cncemu_gcode::{Path, Segment};
use glam::DVec3;

/// Upper bound on interior points for a single path
pub const MAX_INTERIOR_POINTS: usize = 100_000;

/// A point on a path and the fraction of the path's duration at which the
/// tool reaches it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    pub fraction: f64,
    pub location: DVec3,
}

/// Number of evenly spaced interior points for a path
pub fn interior_count(path: &Path, resolution: f64) -> usize {
    if path.feed_rate <= 0.0 || resolution <= 0.0 {
        return 0;
    }
    let count = (path.length * resolution / path.feed_rate).floor();
    if count.is_finite() && count > 0.0 {
        (count as usize).min(MAX_INTERIOR_POINTS)
    } else {
        0
    }
}

/// Points to emit for a motion path, ending with its end point.
///
/// Lines start from their start point. Arcs start with their first interior
/// point, receiving at least two subdivisions. Non-motion paths give no points.
pub fn trace_points(path: &Path, resolution: f64) -> Vec<TracePoint> {
    let n = interior_count(path, resolution);
    match &path.segment {
        Segment::Line { start, end, .. } => {
            let mut points = Vec::with_capacity(n + 2);
            points.push(TracePoint {
                fraction: 0.0,
                location: *start,
            });
            for i in 1..=n {
                let t = i as f64 / (n + 1) as f64;
                points.push(TracePoint {
                    fraction: t,
                    location: start.lerp(*end, t),
                });
            }
            points.push(TracePoint {
                fraction: 1.0,
                location: *end,
            });
            points
        }
        Segment::Arc(arc) => {
            let n = n.max(2);
            let mut points: Vec<TracePoint> = (1..n)
                .map(|p| {
                    let t = p as f64 / n as f64;
                    TracePoint {
                        fraction: t,
                        location: arc.point_at(t),
                    }
                })
                .collect();
            points.push(TracePoint {
                fraction: 1.0,
                location: arc.end,
            });
            points
        }
        Segment::ToolChange { .. } | Segment::Dwell { .. } => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cncemu_gcode::{ArcGeometry, Plane};

    fn line(length: f64, feed_rate: f64) -> Path {
        Path {
            segment: Segment::Line {
                start: DVec3::ZERO,
                end: DVec3::new(length, 0.0, 0.0),
                rapid: false,
            },
            statement: 0,
            line_number: 1,
            spindle_on: true,
            feed_rate,
            length,
            start_time: 0.0,
            duration: length / feed_rate,
        }
    }

    #[test]
    fn test_line_interior_points() {
        // 10 units at 5 units/s with resolution 2 -> 4 interior points
        let points = trace_points(&line(10.0, 5.0), 2.0);
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].location, DVec3::ZERO);
        assert_eq!(points[1].location, DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(points[5].location, DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(points[5].fraction, 1.0);
    }

    #[test]
    fn test_fast_line_has_no_interior_points() {
        let points = trace_points(&line(1.0, 25.0), 5.0);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_zero_feed_is_safe() {
        assert_eq!(interior_count(&line(1.0, 0.0), 5.0), 0);
    }

    #[test]
    fn test_interior_count_is_capped() {
        // 1e6 units at 1 unit/s with resolution 5 would ask for 5e6 points
        let path = line(1.0e6, 1.0);
        assert_eq!(interior_count(&path, 5.0), MAX_INTERIOR_POINTS);
        assert_eq!(trace_points(&path, 5.0).len(), MAX_INTERIOR_POINTS + 2);
    }

    #[test]
    fn test_arc_gets_at_least_two_subdivisions() {
        let arc = ArcGeometry::from_center(
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(-1.0, 0.0, 0.0),
            (0.0, 0.0),
            Plane::XY,
            false,
        )
        .unwrap();
        let path = Path {
            segment: Segment::Arc(arc),
            feed_rate: 1000.0,
            length: arc.length(),
            ..line(1.0, 1.0)
        };
        let points = trace_points(&path, 1.0);
        assert_eq!(points.len(), 2);
        assert!((points[0].location - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-12);
        assert_eq!(points[1].location, arc.end);
    }
}
